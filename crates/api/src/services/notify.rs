//! Outbound notification events.
//!
//! The core only decides *what* happened and *who* hears about it; rendering
//! a mail body and pushing it through SMTP belongs to the mail pipeline
//! behind the sink. Delivery is best-effort: implementations swallow and log
//! failures, and callers never wait on them.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use infra::models::{ApplicationStatus, Round};

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    TournamentCreated {
        tournament: String,
    },
    ApplicationSubmitted {
        tournament: String,
    },
    /// Organizer's review copy of a fresh application.
    ApplicationReceived {
        tournament: String,
        knight: String,
    },
    ApplicationStatusChanged {
        tournament: String,
        old: ApplicationStatus,
        new: ApplicationStatus,
        comment: Option<String>,
    },
    SponsorshipConfirmed {
        tournament: String,
        package: String,
        amount: Decimal,
    },
    TicketIssued {
        tournament: String,
        booking_code: String,
        seats: i32,
    },
    BracketGenerated {
        tournament: String,
        knight_count: usize,
    },
    MatchWon {
        tournament: String,
        round: Round,
    },
    MatchLost {
        tournament: String,
        round: Round,
    },
    Champion {
        tournament: String,
    },
    BronzeInvitation {
        tournament: String,
    },
    MatchReady {
        match_id: Uuid,
    },
    DateChanged {
        tournament: String,
        round: Round,
        old: DateTime<Utc>,
        new: DateTime<Utc>,
    },
    PrizeAwarded {
        tournament: String,
        place: String,
        amount: Decimal,
    },
    ReportReady {
        tournament: String,
    },
}

pub trait NotificationSink: Send + Sync {
    /// Best-effort delivery to the recipient's e-mail address.
    fn deliver(&self, to: &str, notice: Notice);
}

/// Hands events to the mail pipeline; the pipeline owns templating and
/// transport, the core only records the hand-off.
pub struct LogSink;

impl NotificationSink for LogSink {
    fn deliver(&self, to: &str, notice: Notice) {
        tracing::info!(recipient = to, "notification queued: {notice:?}");
    }
}

/// Captures deliveries for assertions in tests.
#[derive(Default)]
pub struct RecordingSink {
    deliveries: Mutex<Vec<(String, Notice)>>,
}

impl RecordingSink {
    pub fn deliveries(&self) -> Vec<(String, Notice)> {
        self.deliveries
            .lock()
            .expect("recording sink lock poisoned")
            .clone()
    }
}

impl NotificationSink for RecordingSink {
    fn deliver(&self, to: &str, notice: Notice) {
        self.deliveries
            .lock()
            .expect("recording sink lock poisoned")
            .push((to.to_string(), notice));
    }
}
