use std::sync::Arc;

use infra::Store;

use crate::auth::{AuthConfig, JwtService};
use crate::services::notify::NotificationSink;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn Store>,
    notifier: Arc<dyn NotificationSink>,
    jwt_service: JwtService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        notifier: Arc<dyn NotificationSink>,
        auth_config: AuthConfig,
    ) -> Self {
        let jwt_service = JwtService::new(&auth_config);

        Self {
            store,
            notifier,
            jwt_service,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn notifier(&self) -> &dyn NotificationSink {
        self.notifier.as_ref()
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }
}
