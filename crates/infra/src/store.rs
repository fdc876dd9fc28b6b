//! Narrow storage interfaces consumed by the domain services.
//!
//! Each trait covers one entity concern; `Store` bundles them so application
//! state can hold a single `Arc<dyn Store>`. Two implementations exist: the
//! Postgres-backed [`crate::pg::PgStore`] and the in-memory
//! [`crate::memory::MemoryStore`] used by tests.
//!
//! Conflict-prone operations are atomic inside a single store call and signal
//! the conflict through their return value (`None` / `false`) instead of an
//! error, so both back-ends behave identically under concurrency:
//! `grant_role` refuses a second role per (user, tournament), `insert_vote`
//! refuses a second vote per (voter, tournament), `insert_ticket_checked`
//! re-checks the confirmed seat sum, and `transition_status` is a
//! compare-and-swap on the current status.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    ApplicationRow, ApplicationStatus, MatchRow, PrizeRow, Round, RoleRow, SponsorshipRow,
    SponsorshipStatus, TicketRow, TournamentRole, TournamentRow, TournamentStatus, UserRow,
    VoteRow,
};
use crate::pagination::LimitOffset;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error")]
    Db(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewTournament {
    pub name: String,
    pub description: Option<String>,
    pub required_amount: Decimal,
    pub prize_percent: Decimal,
    pub required_knights: i32,
    pub total_seats: i32,
    pub event_date: NaiveDate,
    pub status: TournamentStatus,
    pub organizer_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewSponsorship {
    pub sponsor_id: Uuid,
    pub tournament_id: Uuid,
    pub package: String,
    pub amount: Decimal,
    pub company_name: String,
    pub status: SponsorshipStatus,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub knight_id: Uuid,
    pub tournament_id: Uuid,
    pub status: ApplicationStatus,
    pub knight_name: String,
    pub knight_surname: String,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<i32>,
    pub motivation: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub coat_of_arms_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub spectator_id: Uuid,
    pub tournament_id: Uuid,
    pub seats_count: i32,
    pub booking_code: String,
}

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub tournament_id: Uuid,
    pub round: Round,
    pub fighter1_id: Option<Uuid>,
    pub fighter2_id: Option<Uuid>,
    pub winner_id: Option<Uuid>,
    pub comment: Option<String>,
    pub fight_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVote {
    pub voter_id: Uuid,
    pub voted_for_id: Uuid,
    pub tournament_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct NewPrize {
    pub knight_id: Uuid,
    pub tournament_id: Uuid,
    pub place: String,
    pub amount: Decimal,
}

#[async_trait]
pub trait UserStore {
    async fn user(&self, id: Uuid) -> StoreResult<Option<UserRow>>;
}

#[async_trait]
pub trait TournamentStore {
    async fn insert_tournament(&self, new: NewTournament) -> StoreResult<TournamentRow>;
    async fn tournament(&self, id: Uuid) -> StoreResult<Option<TournamentRow>>;
    async fn list_tournaments(&self, page: LimitOffset) -> StoreResult<Vec<TournamentRow>>;

    /// Compare-and-swap on the status column. Returns `false` when the row is
    /// no longer in `from`, which makes every observed transition monotonic
    /// and lets racing threshold checks back off.
    async fn transition_status(
        &self,
        id: Uuid,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait SponsorshipStore {
    async fn insert_sponsorship(&self, new: NewSponsorship) -> StoreResult<SponsorshipRow>;

    /// Sum of CONFIRMED sponsorship amounts for the tournament.
    async fn confirmed_sponsor_sum(&self, tournament_id: Uuid) -> StoreResult<Decimal>;

    async fn sponsorship_of(
        &self,
        sponsor_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<SponsorshipRow>>;
}

#[async_trait]
pub trait ApplicationStore {
    /// Inserts unless the knight already has an application for this
    /// tournament; `None` on the duplicate.
    async fn insert_application(&self, new: NewApplication) -> StoreResult<Option<ApplicationRow>>;

    async fn application(&self, id: Uuid) -> StoreResult<Option<ApplicationRow>>;
    async fn application_of(
        &self,
        knight_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<ApplicationRow>>;
    async fn applications_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> StoreResult<Vec<ApplicationRow>>;
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        comment: Option<String>,
    ) -> StoreResult<Option<ApplicationRow>>;
    async fn count_approved(&self, tournament_id: Uuid) -> StoreResult<i64>;
    async fn approved_knight_ids(&self, tournament_id: Uuid) -> StoreResult<Vec<Uuid>>;
}

#[async_trait]
pub trait TicketStore {
    /// Seat-capacity check and insert in one atomic step; `None` when the
    /// booking would push the confirmed seat sum past `total_seats`.
    async fn insert_ticket_checked(
        &self,
        new: NewTicket,
        total_seats: i32,
    ) -> StoreResult<Option<TicketRow>>;

    async fn confirmed_seats_sum(&self, tournament_id: Uuid) -> StoreResult<i32>;
    async fn confirmed_ticket_of(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<TicketRow>>;
}

#[async_trait]
pub trait RoleStore {
    /// Grants unless the user already holds any role in this tournament;
    /// `false` on the conflict.
    async fn grant_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool>;

    /// Removes the given role; `false` when the user did not hold it.
    async fn revoke_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool>;

    async fn roles_of(&self, user_id: Uuid, tournament_id: Uuid)
        -> StoreResult<Vec<TournamentRole>>;
    async fn has_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool>;
    async fn users_with_role(
        &self,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<Vec<UserRow>>;
    async fn roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RoleRow>>;
}

#[async_trait]
pub trait MatchStore {
    async fn delete_matches(&self, tournament_id: Uuid) -> StoreResult<()>;
    async fn insert_match(&self, new: NewMatch) -> StoreResult<MatchRow>;
    async fn match_by_id(&self, id: Uuid) -> StoreResult<Option<MatchRow>>;

    /// All matches of the tournament in insertion order.
    async fn matches_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<MatchRow>>;

    /// Rewrites the mutable fields (fighters, winner, comment, date, link).
    async fn update_match(&self, row: &MatchRow) -> StoreResult<()>;
}

#[async_trait]
pub trait VoteStore {
    /// Inserts unless the voter already voted in this tournament; `None` on
    /// the duplicate. This is the atomic double-submission guard.
    async fn insert_vote(&self, new: NewVote) -> StoreResult<Option<VoteRow>>;

    async fn has_voted(&self, voter_id: Uuid, tournament_id: Uuid) -> StoreResult<bool>;
    async fn votes_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<VoteRow>>;
}

#[async_trait]
pub trait PrizeStore {
    async fn prizes_exist(&self, tournament_id: Uuid) -> StoreResult<bool>;
    async fn insert_prizes(&self, rows: Vec<NewPrize>) -> StoreResult<Vec<PrizeRow>>;
    async fn prizes_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<PrizeRow>>;
}

pub trait Store:
    UserStore
    + TournamentStore
    + SponsorshipStore
    + ApplicationStore
    + TicketStore
    + RoleStore
    + MatchStore
    + VoteStore
    + PrizeStore
    + Send
    + Sync
{
}

impl<T> Store for T where
    T: UserStore
        + TournamentStore
        + SponsorshipStore
        + ApplicationStore
        + TicketStore
        + RoleStore
        + MatchStore
        + VoteStore
        + PrizeStore
        + Send
        + Sync
{
}
