mod common;

use common::*;

use api::error::AppError;
use api::services::notify::Notice;
use api::services::prizes::PrizeService;
use api::services::tournaments::TournamentService;
use api::services::votes::{VoteRequest, VoteService};
use chrono::Utc;
use infra::models::{Round, TournamentRole, TournamentStatus, UserRow};
use infra::store::{
    MatchStore, NewMatch, NewTicket, PrizeStore, RoleStore, TicketStore, TournamentStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn seed_decided_matches(
    app: &TestApp,
    tournament_id: Uuid,
    first: &UserRow,
    second: &UserRow,
    third: &UserRow,
    fourth: &UserRow,
) {
    app.store
        .insert_match(NewMatch {
            tournament_id,
            round: Round::Final,
            fighter1_id: Some(first.id),
            fighter2_id: Some(second.id),
            winner_id: Some(first.id),
            comment: None,
            fight_date: Utc::now(),
        })
        .await
        .expect("seed final");
    app.store
        .insert_match(NewMatch {
            tournament_id,
            round: Round::Bronze,
            fighter1_id: Some(third.id),
            fighter2_id: Some(fourth.id),
            winner_id: Some(third.id),
            comment: None,
            fight_date: Utc::now(),
        })
        .await
        .expect("seed bronze");
}

#[tokio::test]
async fn the_pool_splits_fifty_twentyfive_ten_five() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::Completed, 4, 100).await;

    // 40 000 confirmed, 50% prize share: the pool is 20 000.
    add_confirmed_sponsorship(&app, &tournament, dec!(30000)).await;
    add_confirmed_sponsorship(&app, &tournament, dec!(10000)).await;

    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    let k3 = add_approved_knight(&app, &tournament, "k3@test.com").await;
    let k4 = add_approved_knight(&app, &tournament, "k4@test.com").await;

    // Final: K1 beats K3. Bronze: K2 beats K4. Sympathy: K2.
    seed_decided_matches(&app, tournament.id, &k1, &k3, &k2, &k4).await;

    let rows = PrizeService::new(app.state.clone())
        .calculate(tournament.id, Some(k2.id))
        .await
        .expect("distribution succeeds");

    assert_eq!(rows.len(), 3);

    let of = |knight: Uuid| rows.iter().find(|r| r.knight_id == knight);
    let first = of(k1.id).expect("winner row");
    assert_eq!(first.amount, dec!(10000.00));
    assert_eq!(first.place, "1st");

    let second = of(k3.id).expect("runner-up row");
    assert_eq!(second.amount, dec!(5000.00));
    assert_eq!(second.place, "2nd");

    let third = of(k2.id).expect("bronze-and-sympathy row");
    assert_eq!(third.amount, dec!(3000.00));
    assert!(third.place.contains("3rd") && third.place.contains("sympathy"));

    assert!(of(k4.id).is_none(), "K4 placed nowhere and gets nothing");

    let total: Decimal = rows.iter().map(|r| r.amount).sum();
    assert_eq!(total, dec!(18000.00), "90% of the pool is paid out");

    // Every awarded knight hears about it, the organizer gets the report.
    for email in ["k1@test.com", "k2@test.com", "k3@test.com"] {
        assert!(deliveries_to(&app, email)
            .iter()
            .any(|n| matches!(n, Notice::PrizeAwarded { .. })));
    }
    assert!(deliveries_to(&app, "organizer@test.com")
        .iter()
        .any(|n| matches!(n, Notice::ReportReady { .. })));
}

#[tokio::test]
async fn the_distribution_is_written_only_once() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::Completed, 4, 100).await;
    add_confirmed_sponsorship(&app, &tournament, dec!(40000)).await;

    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    let k3 = add_approved_knight(&app, &tournament, "k3@test.com").await;
    let k4 = add_approved_knight(&app, &tournament, "k4@test.com").await;
    seed_decided_matches(&app, tournament.id, &k1, &k2, &k3, &k4).await;

    let service = PrizeService::new(app.state.clone());
    service
        .calculate(tournament.id, None)
        .await
        .expect("first distribution");

    let err = service
        .calculate(tournament.id, None)
        .await
        .expect_err("second distribution must be refused");
    assert!(matches!(err, AppError::IdempotencyViolation), "got {err:?}");

    let rows = app
        .store
        .prizes_for_tournament(tournament.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn an_unfunded_tournament_has_no_pool() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::Completed, 4, 100).await;

    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    let k3 = add_approved_knight(&app, &tournament, "k3@test.com").await;
    let k4 = add_approved_knight(&app, &tournament, "k4@test.com").await;
    seed_decided_matches(&app, tournament.id, &k1, &k2, &k3, &k4).await;

    let err = PrizeService::new(app.state.clone())
        .calculate(tournament.id, None)
        .await
        .expect_err("no sponsors, no prizes");
    assert!(matches!(err, AppError::EmptyPool), "got {err:?}");
}

#[tokio::test]
async fn prizes_wait_for_completion() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    add_confirmed_sponsorship(&app, &tournament, dec!(40000)).await;

    let err = PrizeService::new(app.state.clone())
        .calculate(tournament.id, None)
        .await
        .expect_err("the tournament still runs");
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");
}

#[tokio::test]
async fn a_missing_final_result_blocks_the_distribution() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament =
        seed_tournament(&app, &organizer, TournamentStatus::Completed, 4, 100).await;
    add_confirmed_sponsorship(&app, &tournament, dec!(40000)).await;

    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    app.store
        .insert_match(NewMatch {
            tournament_id: tournament.id,
            round: Round::Final,
            fighter1_id: Some(k1.id),
            fighter2_id: Some(k2.id),
            winner_id: None,
            comment: None,
            fight_date: Utc::now(),
        })
        .await
        .expect("seed undecided final");

    let err = PrizeService::new(app.state.clone())
        .calculate(tournament.id, None)
        .await
        .expect_err("an undecided final cannot pay out");
    assert!(matches!(err, AppError::InvalidState(_)), "got {err:?}");
}

#[tokio::test]
async fn completing_a_tournament_resolves_votes_and_pays_out() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    add_confirmed_sponsorship(&app, &tournament, dec!(40000)).await;

    let k1 = add_approved_knight(&app, &tournament, "k1@test.com").await;
    let k2 = add_approved_knight(&app, &tournament, "k2@test.com").await;
    let k3 = add_approved_knight(&app, &tournament, "k3@test.com").await;
    let k4 = add_approved_knight(&app, &tournament, "k4@test.com").await;
    seed_decided_matches(&app, tournament.id, &k1, &k3, &k2, &k4).await;

    // One spectator with a ticket votes for K2.
    let spectator = add_user(&app, "viewer@test.com", false);
    app.store
        .grant_role(spectator.id, tournament.id, TournamentRole::Spectator)
        .await
        .unwrap();
    app.store
        .insert_ticket_checked(
            NewTicket {
                spectator_id: spectator.id,
                tournament_id: tournament.id,
                seats_count: 1,
                booking_code: Uuid::new_v4().to_string(),
            },
            100,
        )
        .await
        .unwrap()
        .unwrap();
    VoteService::new(app.state.clone())
        .submit(
            spectator.id,
            VoteRequest {
                tournament_id: tournament.id,
                voted_for_id: k2.id,
            },
        )
        .await
        .expect("sympathy vote");

    let outcome = TournamentService::new(app.state.clone())
        .complete(tournament.id)
        .await
        .expect("completion succeeds");

    assert_eq!(outcome.sympathy_winner_id, Some(k2.id));

    let rows = app
        .store
        .prizes_for_tournament(tournament.id)
        .await
        .unwrap();
    assert_eq!(rows.len(), 3);
    let total: Decimal = rows.iter().map(|r| r.amount).sum();
    assert_eq!(total, dec!(18000.00));

    let row = app.store.tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(row.status, "COMPLETED");
}

#[tokio::test]
async fn completion_survives_a_failing_distribution() {
    let app = test_app();
    let organizer = add_user(&app, "organizer@test.com", true);
    let tournament = seed_tournament(&app, &organizer, TournamentStatus::Active, 4, 100).await;
    // No sponsorships: the pool will be empty and the payout will fail.

    let outcome = TournamentService::new(app.state.clone())
        .complete(tournament.id)
        .await
        .expect("completion itself succeeds");

    assert!(outcome.message.contains("prize calculation failed"));
    let row = app.store.tournament(tournament.id).await.unwrap().unwrap();
    assert_eq!(row.status, "COMPLETED");
}
