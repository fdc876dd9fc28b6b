//! Postgres-backed implementation of the storage traits, one file per entity.

mod applications;
mod matches;
mod prizes;
mod roles;
mod sponsorships;
mod tickets;
mod tournaments;
mod users;
mod votes;

use uuid::Uuid;

use crate::db::Db;

#[derive(Clone)]
pub struct PgStore {
    pool: Db,
}

impl PgStore {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Db {
        &self.pool
    }
}

/// Advisory-lock key derived from a tournament id; serializes
/// capacity-sensitive writes per tournament.
fn advisory_key(id: Uuid) -> i64 {
    let b = id.as_bytes();
    i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}
