mod common;

use common::*;

use api::error::AppError;
use api::services::applications::{
    ApplicationService, ApplicationStatusUpdateRequest, SubmitApplicationRequest,
};
use api::services::notify::Notice;
use infra::models::{ApplicationStatus, TournamentRole, TournamentStatus};
use infra::store::{MatchStore, RoleStore, TournamentStore};
use uuid::Uuid;

fn submit_request(tournament_id: Uuid, name: &str) -> SubmitApplicationRequest {
    SubmitApplicationRequest {
        tournament_id,
        knight_name: name.to_string(),
        knight_surname: "the Bold".to_string(),
        height: Some(180),
        weight: Some(85),
        motivation: Some("Glory".to_string()),
        birth_date: None,
        coat_of_arms_url: None,
    }
}

#[tokio::test]
async fn submissions_are_approved_on_the_spot_and_reviewed_by_mail() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::KnightRegistration, 4, 20).await;
    let knight = add_user(&app, "knight@test.com", false);

    let view = ApplicationService::new(app.state.clone())
        .submit(knight.id, submit_request(tournament.id, "Brian"))
        .await
        .expect("submission succeeds");

    assert_eq!(view.status, "APPROVED");

    let roles = app.store.roles_of(knight.id, tournament.id).await.unwrap();
    assert_eq!(roles, vec![TournamentRole::Knight]);

    assert!(deliveries_to(&app, "knight@test.com")
        .iter()
        .any(|n| matches!(n, Notice::ApplicationSubmitted { .. })));
    assert!(deliveries_to(&app, "organizer@test.com")
        .iter()
        .any(|n| matches!(n, Notice::ApplicationReceived { .. })));
}

#[tokio::test]
async fn the_last_approval_triggers_bracket_generation() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::KnightRegistration, 2, 20).await;

    let service = ApplicationService::new(app.state.clone());
    let first = add_user(&app, "first@test.com", false);
    let second = add_user(&app, "second@test.com", false);

    service
        .submit(first.id, submit_request(tournament.id, "First"))
        .await
        .expect("first application");
    let mid = app.store.tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(mid.status, "KNIGHT_REGISTRATION");

    service
        .submit(second.id, submit_request(tournament.id, "Second"))
        .await
        .expect("second application");

    let done = app.store.tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(done.status, "TICKET_SALES");

    let matches = app
        .store
        .matches_for_tournament(tournament.id)
        .await
        .unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].round, "FINAL");
}

#[tokio::test]
async fn rejection_needs_a_comment_and_revokes_the_knight_role() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::KnightRegistration, 4, 20).await;
    let knight = add_user(&app, "knight@test.com", false);

    let service = ApplicationService::new(app.state.clone());
    let application = service
        .submit(knight.id, submit_request(tournament.id, "Brian"))
        .await
        .expect("submission succeeds");

    let err = service
        .update_status(
            application.id,
            organizer.id,
            ApplicationStatusUpdateRequest {
                status: ApplicationStatus::Rejected,
                comment: None,
            },
        )
        .await
        .expect_err("a silent rejection is refused");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");

    let updated = service
        .update_status(
            application.id,
            organizer.id,
            ApplicationStatusUpdateRequest {
                status: ApplicationStatus::Rejected,
                comment: Some("armour not up to code".to_string()),
            },
        )
        .await
        .expect("rejection with a comment");
    assert_eq!(updated.status, "REJECTED");

    let roles = app.store.roles_of(knight.id, tournament.id).await.unwrap();
    assert!(roles.is_empty(), "the knight role is gone after rejection");

    assert!(deliveries_to(&app, "knight@test.com").iter().any(|n| matches!(
        n,
        Notice::ApplicationStatusChanged {
            new: ApplicationStatus::Rejected,
            ..
        }
    )));

    // The old application row stays, so the knight cannot slip back in.
    let err = service
        .submit(knight.id, submit_request(tournament.id, "Brian"))
        .await
        .expect_err("re-application after rejection is refused");
    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn only_the_organizer_reviews_applications() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::KnightRegistration, 4, 20).await;
    let knight = add_user(&app, "knight@test.com", false);
    let meddler = add_user(&app, "meddler@test.com", false);

    let service = ApplicationService::new(app.state.clone());
    let application = service
        .submit(knight.id, submit_request(tournament.id, "Brian"))
        .await
        .expect("submission succeeds");

    let err = service
        .update_status(
            application.id,
            meddler.id,
            ApplicationStatusUpdateRequest {
                status: ApplicationStatus::Edits,
                comment: Some("try again".to_string()),
            },
        )
        .await
        .expect_err("outsiders cannot review");
    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
}

#[tokio::test]
async fn a_knight_applies_at_most_once() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::KnightRegistration, 4, 20).await;
    let knight = add_user(&app, "knight@test.com", false);

    let service = ApplicationService::new(app.state.clone());
    service
        .submit(knight.id, submit_request(tournament.id, "Brian"))
        .await
        .expect("first application");

    let err = service
        .submit(knight.id, submit_request(tournament.id, "Brian"))
        .await
        .expect_err("second application is refused");
    assert!(matches!(err, AppError::RoleConflict), "got {err:?}");
}

#[tokio::test]
async fn applications_are_listed_for_the_tournament() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::KnightRegistration, 4, 20).await;

    let service = ApplicationService::new(app.state.clone());
    for (i, name) in ["Aldric", "Berek"].iter().enumerate() {
        let knight = add_user(&app, &format!("knight{i}@test.com"), false);
        service
            .submit(knight.id, submit_request(tournament.id, name))
            .await
            .expect("submission succeeds");
    }

    let listed = service
        .list_for_tournament(tournament.id)
        .await
        .expect("listing succeeds");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].knight_name, "Aldric");
    assert_eq!(listed[1].knight_name, "Berek");
}
