use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

pub struct AuthMiddleware;

impl AuthMiddleware {
    pub async fn jwt_auth(
        State(state): State<AppState>,
        mut request: Request,
        next: Next,
    ) -> Result<Response, AppError> {
        let jwt_service = state.jwt_service();

        let auth_header = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .ok_or(AppError::NotAuthenticated)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::NotAuthenticated)?;

        let claims = jwt_service.verify_token(token)?;

        // Make the caller identity available to handlers
        request.extensions_mut().insert(claims);

        Ok(next.run(request).await)
    }
}
