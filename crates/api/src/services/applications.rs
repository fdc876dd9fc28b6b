//! Knight applications: submission, organizer review, and the registration
//! threshold that triggers bracket generation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use infra::models::{ApplicationRow, ApplicationStatus, TournamentRole, TournamentStatus, TournamentRow};
use infra::store::{ApplicationStore, NewApplication, RoleStore, UserStore};

use crate::error::AppError;
use crate::services::brackets::BracketService;
use crate::services::notify::Notice;
use crate::services::{load_tournament, load_user, require_status};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub tournament_id: Uuid,
    pub knight_name: String,
    pub knight_surname: String,
    pub height: Option<i32>,
    pub weight: Option<i32>,
    pub motivation: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub coat_of_arms_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusUpdateRequest {
    pub status: ApplicationStatus,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub knight_id: Uuid,
    pub knight_name: String,
    pub knight_surname: String,
    pub status: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ApplicationRow> for ApplicationView {
    fn from(row: ApplicationRow) -> Self {
        Self {
            id: row.id,
            tournament_id: row.tournament_id,
            knight_id: row.knight_id,
            knight_name: row.knight_name,
            knight_surname: row.knight_surname,
            status: row.status,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

pub struct ApplicationService {
    state: AppState,
}

impl ApplicationService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Submits an application. Review is currently a formality: the
    /// application is stored approved right away, while the organizer still
    /// gets the review notice.
    pub async fn submit(
        &self,
        knight_id: Uuid,
        req: SubmitApplicationRequest,
    ) -> Result<ApplicationView, AppError> {
        let store = self.state.store();

        let tournament = load_tournament(store, req.tournament_id).await?;
        require_status(
            &tournament,
            TournamentStatus::KnightRegistration,
            "applying",
        )?;

        let knight = load_user(store, knight_id).await?;

        // One role per user per tournament; the grant is the atomic guard.
        if !store
            .grant_role(knight_id, tournament.id, TournamentRole::Knight)
            .await?
        {
            return Err(AppError::RoleConflict);
        }

        let inserted = store
            .insert_application(NewApplication {
                knight_id,
                tournament_id: tournament.id,
                status: ApplicationStatus::Approved,
                knight_name: req.knight_name,
                knight_surname: req.knight_surname,
                height_cm: req.height,
                weight_kg: req.weight,
                motivation: req.motivation,
                birth_date: req.birth_date,
                coat_of_arms_url: req.coat_of_arms_url,
            })
            .await?;

        let application = match inserted {
            Some(row) => row,
            None => {
                // A rejected knight keeps their old application row and may
                // not enter the same tournament again.
                store
                    .revoke_role(knight_id, tournament.id, TournamentRole::Knight)
                    .await?;
                return Err(AppError::BadRequest(
                    "an application for this tournament already exists".into(),
                ));
            }
        };

        info!(
            "application of {} accepted for tournament {}",
            knight.full_name(),
            tournament.name
        );
        self.state.notifier().deliver(
            &knight.email,
            Notice::ApplicationSubmitted {
                tournament: tournament.name.clone(),
            },
        );
        if let Some(organizer) = store.user(tournament.organizer_id).await? {
            self.state.notifier().deliver(
                &organizer.email,
                Notice::ApplicationReceived {
                    tournament: tournament.name.clone(),
                    knight: knight.full_name(),
                },
            );
        }

        self.maybe_generate_bracket(&tournament).await?;

        Ok(application.into())
    }

    /// Organizer review of an application; a comment is mandatory when the
    /// knight is rejected or sent back for edits.
    pub async fn update_status(
        &self,
        application_id: Uuid,
        caller_id: Uuid,
        req: ApplicationStatusUpdateRequest,
    ) -> Result<ApplicationView, AppError> {
        let store = self.state.store();

        let application = store
            .application(application_id)
            .await?
            .ok_or(AppError::NotFound("application"))?;
        let tournament = load_tournament(store, application.tournament_id).await?;

        let caller = load_user(store, caller_id).await?;
        let is_tournament_organizer = store
            .has_role(caller_id, tournament.id, TournamentRole::Organizer)
            .await?;
        if !is_tournament_organizer && !caller.organizer {
            return Err(AppError::Forbidden(
                "only the tournament organizer can review applications",
            ));
        }

        let comment = req.comment.as_deref().map(str::trim).unwrap_or_default();
        if matches!(
            req.status,
            ApplicationStatus::Rejected | ApplicationStatus::Edits
        ) && comment.is_empty()
        {
            return Err(AppError::BadRequest(
                "a comment is required when rejecting or requesting edits".into(),
            ));
        }

        let old_status: ApplicationStatus = application
            .status
            .parse()
            .map_err(|e: String| AppError::Anyhow(anyhow::anyhow!(e)))?;

        let updated = store
            .update_application_status(application_id, req.status, req.comment.clone())
            .await?
            .ok_or(AppError::NotFound("application"))?;

        match req.status {
            ApplicationStatus::Approved => {
                self.maybe_generate_bracket(&tournament).await?;
            }
            ApplicationStatus::Rejected => {
                store
                    .revoke_role(application.knight_id, tournament.id, TournamentRole::Knight)
                    .await?;
                info!(
                    "knight role revoked for user {} in tournament {} after rejection",
                    application.knight_id, tournament.id
                );
            }
            _ => {}
        }

        if let Some(knight) = store.user(application.knight_id).await? {
            self.state.notifier().deliver(
                &knight.email,
                Notice::ApplicationStatusChanged {
                    tournament: tournament.name.clone(),
                    old: old_status,
                    new: req.status,
                    comment: req.comment,
                },
            );
        }

        Ok(updated.into())
    }

    pub async fn by_id(&self, application_id: Uuid) -> Result<ApplicationView, AppError> {
        let row = self
            .state
            .store()
            .application(application_id)
            .await?
            .ok_or(AppError::NotFound("application"))?;
        Ok(row.into())
    }

    pub async fn list_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> Result<Vec<ApplicationView>, AppError> {
        let store = self.state.store();
        load_tournament(store, tournament_id).await?;
        let rows = store.applications_for_tournament(tournament_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Once the approved count reaches the configured field size, the bracket
    /// is generated as a side-effect. A generation failure must not take the
    /// approval down with it.
    async fn maybe_generate_bracket(&self, tournament: &TournamentRow) -> Result<(), AppError> {
        let approved = self
            .state
            .store()
            .count_approved(tournament.id)
            .await?;
        if approved < tournament.required_knights as i64 {
            return Ok(());
        }

        info!(
            "tournament {} reached {approved}/{} approved knights, generating bracket",
            tournament.name, tournament.required_knights
        );
        if let Err(e) = BracketService::new(self.state.clone())
            .generate(tournament.id)
            .await
        {
            warn!(
                "automatic bracket generation failed for tournament {}: {e}",
                tournament.id
            );
        }

        Ok(())
    }
}
