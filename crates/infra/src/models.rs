use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub second_name: String,
    pub organizer: bool,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.second_name)
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TournamentRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub required_amount: Decimal,
    pub prize_percent: Decimal,
    pub required_knights: i32,
    pub total_seats: i32,
    pub event_date: NaiveDate,
    pub status: String,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SponsorshipRow {
    pub id: Uuid,
    pub sponsor_id: Uuid,
    pub tournament_id: Uuid,
    pub package: String,
    pub amount: Decimal,
    pub company_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub knight_id: Uuid,
    pub tournament_id: Uuid,
    pub status: String,
    pub comment: Option<String>,
    pub knight_name: String,
    pub knight_surname: String,
    pub height_cm: Option<i32>,
    pub weight_kg: Option<i32>,
    pub motivation: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub coat_of_arms_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketRow {
    pub id: Uuid,
    pub spectator_id: Uuid,
    pub tournament_id: Uuid,
    pub seats_count: i32,
    pub booking_code: String,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RoleRow {
    pub user_id: Uuid,
    pub tournament_id: Uuid,
    pub role: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MatchRow {
    pub id: Uuid,
    pub tournament_id: Uuid,
    pub round: String,
    pub fighter1_id: Option<Uuid>,
    pub fighter2_id: Option<Uuid>,
    pub winner_id: Option<Uuid>,
    pub comment: Option<String>,
    pub fight_date: DateTime<Utc>,
    pub next_match_id: Option<Uuid>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VoteRow {
    pub id: Uuid,
    pub voter_id: Uuid,
    pub voted_for_id: Uuid,
    pub tournament_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PrizeRow {
    pub id: Uuid,
    pub knight_id: Uuid,
    pub tournament_id: Uuid,
    pub place: String,
    pub amount: Decimal,
    pub calculated_at: DateTime<Utc>,
}

/// Funding → registration → ticket sales → play → done. Rows store the
/// string form; services only ever move a tournament forward along the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentStatus {
    WaitingDonation,
    KnightRegistration,
    TicketSales,
    Active,
    Completed,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentStatus::WaitingDonation => "WAITING_DONATION",
            TournamentStatus::KnightRegistration => "KNIGHT_REGISTRATION",
            TournamentStatus::TicketSales => "TICKET_SALES",
            TournamentStatus::Active => "ACTIVE",
            TournamentStatus::Completed => "COMPLETED",
        }
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WAITING_DONATION" => Ok(TournamentStatus::WaitingDonation),
            "KNIGHT_REGISTRATION" => Ok(TournamentStatus::KnightRegistration),
            "TICKET_SALES" => Ok(TournamentStatus::TicketSales),
            "ACTIVE" => Ok(TournamentStatus::Active),
            "COMPLETED" => Ok(TournamentStatus::Completed),
            other => Err(format!("unknown tournament status: {other}")),
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SponsorshipStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl SponsorshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SponsorshipStatus::Pending => "PENDING",
            SponsorshipStatus::Confirmed => "CONFIRMED",
            SponsorshipStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for SponsorshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SponsorshipStatus::Pending),
            "CONFIRMED" => Ok(SponsorshipStatus::Confirmed),
            "REJECTED" => Ok(SponsorshipStatus::Rejected),
            other => Err(format!("unknown sponsorship status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
    Edits,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
            ApplicationStatus::Edits => "EDITS",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "APPROVED" => Ok(ApplicationStatus::Approved),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            "EDITS" => Ok(ApplicationStatus::Edits),
            other => Err(format!("unknown application status: {other}")),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user wears at most one hat per tournament.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TournamentRole {
    Knight,
    Spectator,
    Sponsor,
    Organizer,
}

impl TournamentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TournamentRole::Knight => "KNIGHT",
            TournamentRole::Spectator => "SPECTATOR",
            TournamentRole::Sponsor => "SPONSOR",
            TournamentRole::Organizer => "ORGANIZER",
        }
    }
}

impl FromStr for TournamentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KNIGHT" => Ok(TournamentRole::Knight),
            "SPECTATOR" => Ok(TournamentRole::Spectator),
            "SPONSOR" => Ok(TournamentRole::Sponsor),
            "ORGANIZER" => Ok(TournamentRole::Organizer),
            other => Err(format!("unknown tournament role: {other}")),
        }
    }
}

impl fmt::Display for TournamentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Round {
    RoundOf8,
    Quarterfinal,
    Semifinal,
    Bronze,
    Final,
}

impl Round {
    pub fn as_str(&self) -> &'static str {
        match self {
            Round::RoundOf8 => "ROUND_OF_8",
            Round::Quarterfinal => "QUARTERFINAL",
            Round::Semifinal => "SEMIFINAL",
            Round::Bronze => "BRONZE",
            Round::Final => "FINAL",
        }
    }

    /// Position in the bracket display, earliest round first; the bronze
    /// match sorts just before the final.
    pub fn order(&self) -> u8 {
        match self {
            Round::RoundOf8 => 1,
            Round::Quarterfinal => 2,
            Round::Semifinal => 3,
            Round::Bronze => 4,
            Round::Final => 5,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Round::RoundOf8 => "round of 8",
            Round::Quarterfinal => "quarterfinal",
            Round::Semifinal => "semifinal",
            Round::Bronze => "third-place match",
            Round::Final => "final",
        }
    }
}

impl FromStr for Round {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROUND_OF_8" => Ok(Round::RoundOf8),
            "QUARTERFINAL" => Ok(Round::Quarterfinal),
            "SEMIFINAL" => Ok(Round::Semifinal),
            "BRONZE" => Ok(Round::Bronze),
            "FINAL" => Ok(Round::Final),
            other => Err(format!("unknown round: {other}")),
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-tier sponsor packages with their contribution amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SponsorPackage {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl SponsorPackage {
    pub fn amount(&self) -> Decimal {
        match self {
            SponsorPackage::Bronze => Decimal::new(5_000, 0),
            SponsorPackage::Silver => Decimal::new(15_000, 0),
            SponsorPackage::Gold => Decimal::new(30_000, 0),
            SponsorPackage::Platinum => Decimal::new(50_000, 0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SponsorPackage::Bronze => "BRONZE",
            SponsorPackage::Silver => "SILVER",
            SponsorPackage::Gold => "GOLD",
            SponsorPackage::Platinum => "PLATINUM",
        }
    }
}

impl FromStr for SponsorPackage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BRONZE" => Ok(SponsorPackage::Bronze),
            "SILVER" => Ok(SponsorPackage::Silver),
            "GOLD" => Ok(SponsorPackage::Gold),
            "PLATINUM" => Ok(SponsorPackage::Platinum),
            other => Err(format!("unknown sponsorship package: {other}")),
        }
    }
}
