use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use api::auth::AuthConfig;
use api::services::notify::{Notice, RecordingSink};
use api::AppState;
use infra::models::{
    ApplicationStatus, SponsorshipStatus, TournamentRole, TournamentRow, TournamentStatus, UserRow,
};
use infra::store::{
    ApplicationStore, NewApplication, NewSponsorship, NewTournament, RoleStore, SponsorshipStore,
    TournamentStore,
};
use infra::MemoryStore;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub sink: Arc<RecordingSink>,
}

pub fn test_app() -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let auth_config = AuthConfig {
        jwt_secret: "test-secret".into(),
        jwt_expiration_hours: 1,
    };
    let state = AppState::new(store.clone(), sink.clone(), auth_config);

    TestApp { state, store, sink }
}

#[allow(dead_code)]
pub fn add_user(app: &TestApp, email: &str, organizer: bool) -> UserRow {
    let user = UserRow {
        id: Uuid::new_v4(),
        email: email.to_string(),
        name: "Test".to_string(),
        second_name: "User".to_string(),
        organizer,
        created_at: Utc::now(),
    };
    app.store.add_user(user.clone());
    user
}

/// Seeds a tournament directly in the given status.
#[allow(dead_code)]
pub async fn seed_tournament(
    app: &TestApp,
    organizer: &UserRow,
    status: TournamentStatus,
    required_knights: i32,
    total_seats: i32,
) -> TournamentRow {
    let tournament = app
        .store
        .insert_tournament(NewTournament {
            name: "Grand Melee".to_string(),
            description: Some("Seeded for tests".to_string()),
            required_amount: Decimal::new(40_000, 0),
            prize_percent: Decimal::new(50, 0),
            required_knights,
            total_seats,
            event_date: NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date"),
            status,
            organizer_id: organizer.id,
        })
        .await
        .expect("seed tournament");

    app.store
        .grant_role(organizer.id, tournament.id, TournamentRole::Organizer)
        .await
        .expect("grant organizer role");

    tournament
}

/// Seeds an approved knight: identity, KNIGHT role, approved application.
#[allow(dead_code)]
pub async fn add_approved_knight(app: &TestApp, tournament: &TournamentRow, email: &str) -> UserRow {
    let knight = add_user(app, email, false);

    app.store
        .grant_role(knight.id, tournament.id, TournamentRole::Knight)
        .await
        .expect("grant knight role");
    app.store
        .insert_application(NewApplication {
            knight_id: knight.id,
            tournament_id: tournament.id,
            status: ApplicationStatus::Approved,
            knight_name: knight.name.clone(),
            knight_surname: knight.second_name.clone(),
            height_cm: Some(180),
            weight_kg: Some(90),
            motivation: None,
            birth_date: None,
            coat_of_arms_url: None,
        })
        .await
        .expect("seed application")
        .expect("application is fresh");

    knight
}

/// Seeds a confirmed sponsorship row of an arbitrary amount.
#[allow(dead_code)]
pub async fn add_confirmed_sponsorship(
    app: &TestApp,
    tournament: &TournamentRow,
    amount: Decimal,
) -> UserRow {
    let sponsor = add_user(app, &format!("sponsor-{}@test.com", Uuid::new_v4()), false);
    app.store
        .insert_sponsorship(NewSponsorship {
            sponsor_id: sponsor.id,
            tournament_id: tournament.id,
            package: "GOLD".to_string(),
            amount,
            company_name: "Coin & Crown".to_string(),
            status: SponsorshipStatus::Confirmed,
        })
        .await
        .expect("seed sponsorship");
    sponsor
}

#[allow(dead_code)]
pub fn deliveries_to(app: &TestApp, email: &str) -> Vec<Notice> {
    app.sink
        .deliveries()
        .into_iter()
        .filter(|(to, _)| to == email)
        .map(|(_, notice)| notice)
        .collect()
}
