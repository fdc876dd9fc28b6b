mod common;

use common::*;

use api::error::AppError;
use api::services::votes::{VoteRequest, VoteService};
use infra::models::{TournamentRole, TournamentStatus};
use infra::store::{RoleStore, TicketStore, VoteStore};
use infra::store::NewTicket;
use uuid::Uuid;

async fn add_spectator(app: &TestApp, tournament_id: Uuid, email: &str) -> infra::models::UserRow {
    let spectator = add_user(app, email, false);
    app.store
        .grant_role(spectator.id, tournament_id, TournamentRole::Spectator)
        .await
        .expect("grant spectator role");
    app.store
        .insert_ticket_checked(
            NewTicket {
                spectator_id: spectator.id,
                tournament_id,
                seats_count: 1,
                booking_code: Uuid::new_v4().to_string(),
            },
            1_000,
        )
        .await
        .expect("seed ticket")
        .expect("capacity is ample");
    spectator
}

#[tokio::test]
async fn a_spectator_votes_once_and_the_vote_sticks() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    let spectator = add_spectator(&app, tournament.id, "viewer@test.com").await;

    let service = VoteService::new(app.state.clone());

    let ballot = service
        .knights_for_voting(tournament.id, spectator.id)
        .await
        .expect("ballot");
    let listed: Vec<Uuid> = ballot.iter().map(|k| k.id).collect();
    assert!(listed.contains(&k1.id) && listed.contains(&k2.id));

    service
        .submit(
            spectator.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: k2.id,
            },
        )
        .await
        .expect("first vote");

    let err = service
        .submit(
            spectator.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: k1.id,
            },
        )
        .await
        .expect_err("second vote must be refused");
    assert!(matches!(err, AppError::DuplicateVote), "got {err:?}");

    // Exactly one stored vote, and the tally reflects it.
    let votes = app
        .store
        .votes_for_tournament(tournament.id)
        .await
        .unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(service.winner(tournament.id).await.unwrap(), Some(k2.id));
}

#[tokio::test]
async fn the_ballot_is_reserved_for_ticket_holders() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    add_approved_knight(&app, &tournament, "k1@test.com").await;

    let gatecrasher = add_user(&app, "gatecrasher@test.com", false);
    let err = VoteService::new(app.state.clone())
        .knights_for_voting(tournament.id, gatecrasher.id)
        .await
        .expect_err("no ticket, no ballot");

    assert!(matches!(err, AppError::Forbidden(_)), "got {err:?}");
}

#[tokio::test]
async fn votes_require_an_active_tournament() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::TicketSales, 4, 100).await;
    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let spectator = add_spectator(&app, tournament.id, "viewer@test.com").await;

    let err = VoteService::new(app.state.clone())
        .submit(
            spectator.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: k1.id,
            },
        )
        .await
        .expect_err("voting has not opened yet");

    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");
}

#[tokio::test]
async fn votes_only_count_for_knights() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    add_approved_knight(&app, &tournament, "k1@test.com").await;
    let spectator = add_spectator(&app, tournament.id, "viewer@test.com").await;
    let other_spectator = add_spectator(&app, tournament.id, "viewer2@test.com").await;

    let err = VoteService::new(app.state.clone())
        .submit(
            spectator.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: other_spectator.id,
            },
        )
        .await
        .expect_err("spectators are not candidates");

    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn tied_knights_resolve_to_the_smallest_id() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    let v1 = add_spectator(&app, tournament.id, "v1@test.com").await;
    let v2 = add_spectator(&app, tournament.id, "v2@test.com").await;

    let service = VoteService::new(app.state.clone());
    service
        .submit(
            v1.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: k1.id,
            },
        )
        .await
        .expect("vote for k1");
    service
        .submit(
            v2.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: k2.id,
            },
        )
        .await
        .expect("vote for k2");

    let expected = k1.id.min(k2.id);
    assert_eq!(service.winner(tournament.id).await.unwrap(), Some(expected));
}

#[tokio::test]
async fn no_votes_means_no_sympathy_winner() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;

    assert_eq!(
        VoteService::new(app.state.clone())
            .winner(tournament.id)
            .await
            .unwrap(),
        None
    );
}
