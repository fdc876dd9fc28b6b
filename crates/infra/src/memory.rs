//! In-memory implementation of the storage traits.
//!
//! Single mutex around plain vectors; every trait method takes the lock once
//! and releases it before returning, so the conflict guards (role uniqueness,
//! vote uniqueness, seat capacity, status compare-and-swap) are exactly as
//! atomic as their SQL counterparts. Used by the test suites, which is why it
//! also exposes `add_user` for seeding identities that production code reads
//! from the users table.

use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    ApplicationRow, ApplicationStatus, MatchRow, PrizeRow, RoleRow, SponsorshipRow,
    SponsorshipStatus, TicketRow, TournamentRole, TournamentRow, TournamentStatus, UserRow,
    VoteRow,
};
use crate::pagination::LimitOffset;
use crate::store::{
    ApplicationStore, MatchStore, NewApplication, NewMatch, NewPrize, NewSponsorship, NewTicket,
    NewTournament, NewVote, PrizeStore, RoleStore, SponsorshipStore, StoreResult, TicketStore,
    TournamentStore, UserStore, VoteStore,
};

#[derive(Default)]
struct Inner {
    users: Vec<UserRow>,
    tournaments: Vec<TournamentRow>,
    sponsorships: Vec<SponsorshipRow>,
    applications: Vec<ApplicationRow>,
    tickets: Vec<TicketRow>,
    roles: Vec<RoleRow>,
    matches: Vec<MatchRow>,
    votes: Vec<VoteRow>,
    prizes: Vec<PrizeRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock poisoned")
    }

    /// Seeds an identity row. User onboarding lives outside the core, so the
    /// storage traits have no insert for users.
    pub fn add_user(&self, user: UserRow) {
        self.lock().users.push(user);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn insert_tournament(&self, new: NewTournament) -> StoreResult<TournamentRow> {
        let row = TournamentRow {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            required_amount: new.required_amount,
            prize_percent: new.prize_percent,
            required_knights: new.required_knights,
            total_seats: new.total_seats,
            event_date: new.event_date,
            status: new.status.as_str().to_string(),
            organizer_id: new.organizer_id,
            created_at: Utc::now(),
        };
        self.lock().tournaments.push(row.clone());
        Ok(row)
    }

    async fn tournament(&self, id: Uuid) -> StoreResult<Option<TournamentRow>> {
        Ok(self.lock().tournaments.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tournaments(&self, page: LimitOffset) -> StoreResult<Vec<TournamentRow>> {
        let inner = self.lock();
        Ok(inner
            .tournaments
            .iter()
            .skip(page.offset.max(0) as usize)
            .take(page.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: TournamentStatus,
        to: TournamentStatus,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        match inner
            .tournaments
            .iter_mut()
            .find(|t| t.id == id && t.status == from.as_str())
        {
            Some(t) => {
                t.status = to.as_str().to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SponsorshipStore for MemoryStore {
    async fn insert_sponsorship(&self, new: NewSponsorship) -> StoreResult<SponsorshipRow> {
        let row = SponsorshipRow {
            id: Uuid::new_v4(),
            sponsor_id: new.sponsor_id,
            tournament_id: new.tournament_id,
            package: new.package,
            amount: new.amount,
            company_name: new.company_name,
            status: new.status.as_str().to_string(),
            created_at: Utc::now(),
        };
        self.lock().sponsorships.push(row.clone());
        Ok(row)
    }

    async fn confirmed_sponsor_sum(&self, tournament_id: Uuid) -> StoreResult<Decimal> {
        let inner = self.lock();
        Ok(inner
            .sponsorships
            .iter()
            .filter(|s| {
                s.tournament_id == tournament_id
                    && s.status == SponsorshipStatus::Confirmed.as_str()
            })
            .map(|s| s.amount)
            .sum())
    }

    async fn sponsorship_of(
        &self,
        sponsor_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<SponsorshipRow>> {
        Ok(self
            .lock()
            .sponsorships
            .iter()
            .find(|s| s.sponsor_id == sponsor_id && s.tournament_id == tournament_id)
            .cloned())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(
        &self,
        new: NewApplication,
    ) -> StoreResult<Option<ApplicationRow>> {
        let mut inner = self.lock();
        let duplicate = inner
            .applications
            .iter()
            .any(|a| a.knight_id == new.knight_id && a.tournament_id == new.tournament_id);
        if duplicate {
            return Ok(None);
        }
        let row = ApplicationRow {
            id: Uuid::new_v4(),
            knight_id: new.knight_id,
            tournament_id: new.tournament_id,
            status: new.status.as_str().to_string(),
            comment: None,
            knight_name: new.knight_name,
            knight_surname: new.knight_surname,
            height_cm: new.height_cm,
            weight_kg: new.weight_kg,
            motivation: new.motivation,
            birth_date: new.birth_date,
            coat_of_arms_url: new.coat_of_arms_url,
            created_at: Utc::now(),
        };
        inner.applications.push(row.clone());
        Ok(Some(row))
    }

    async fn application(&self, id: Uuid) -> StoreResult<Option<ApplicationRow>> {
        Ok(self.lock().applications.iter().find(|a| a.id == id).cloned())
    }

    async fn application_of(
        &self,
        knight_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<ApplicationRow>> {
        Ok(self
            .lock()
            .applications
            .iter()
            .find(|a| a.knight_id == knight_id && a.tournament_id == tournament_id)
            .cloned())
    }

    async fn applications_for_tournament(
        &self,
        tournament_id: Uuid,
    ) -> StoreResult<Vec<ApplicationRow>> {
        Ok(self
            .lock()
            .applications
            .iter()
            .filter(|a| a.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
        comment: Option<String>,
    ) -> StoreResult<Option<ApplicationRow>> {
        let mut inner = self.lock();
        match inner.applications.iter_mut().find(|a| a.id == id) {
            Some(a) => {
                a.status = status.as_str().to_string();
                a.comment = comment;
                Ok(Some(a.clone()))
            }
            None => Ok(None),
        }
    }

    async fn count_approved(&self, tournament_id: Uuid) -> StoreResult<i64> {
        Ok(self
            .lock()
            .applications
            .iter()
            .filter(|a| {
                a.tournament_id == tournament_id
                    && a.status == ApplicationStatus::Approved.as_str()
            })
            .count() as i64)
    }

    async fn approved_knight_ids(&self, tournament_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(self
            .lock()
            .applications
            .iter()
            .filter(|a| {
                a.tournament_id == tournament_id
                    && a.status == ApplicationStatus::Approved.as_str()
            })
            .map(|a| a.knight_id)
            .collect())
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket_checked(
        &self,
        new: NewTicket,
        total_seats: i32,
    ) -> StoreResult<Option<TicketRow>> {
        let mut inner = self.lock();
        let already_booked = inner
            .tickets
            .iter()
            .any(|t| t.spectator_id == new.spectator_id && t.tournament_id == new.tournament_id && t.confirmed);
        if already_booked {
            return Ok(None);
        }
        let booked: i32 = inner
            .tickets
            .iter()
            .filter(|t| t.tournament_id == new.tournament_id && t.confirmed)
            .map(|t| t.seats_count)
            .sum();
        if booked + new.seats_count > total_seats {
            return Ok(None);
        }
        let row = TicketRow {
            id: Uuid::new_v4(),
            spectator_id: new.spectator_id,
            tournament_id: new.tournament_id,
            seats_count: new.seats_count,
            booking_code: new.booking_code,
            confirmed: true,
            created_at: Utc::now(),
        };
        inner.tickets.push(row.clone());
        Ok(Some(row))
    }

    async fn confirmed_seats_sum(&self, tournament_id: Uuid) -> StoreResult<i32> {
        Ok(self
            .lock()
            .tickets
            .iter()
            .filter(|t| t.tournament_id == tournament_id && t.confirmed)
            .map(|t| t.seats_count)
            .sum())
    }

    async fn confirmed_ticket_of(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Option<TicketRow>> {
        Ok(self
            .lock()
            .tickets
            .iter()
            .find(|t| t.spectator_id == user_id && t.tournament_id == tournament_id && t.confirmed)
            .cloned())
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn grant_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let occupied = inner
            .roles
            .iter()
            .any(|r| r.user_id == user_id && r.tournament_id == tournament_id);
        if occupied {
            return Ok(false);
        }
        inner.roles.push(RoleRow {
            user_id,
            tournament_id,
            role: role.as_str().to_string(),
        });
        Ok(true)
    }

    async fn revoke_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.roles.len();
        inner.roles.retain(|r| {
            !(r.user_id == user_id && r.tournament_id == tournament_id && r.role == role.as_str())
        });
        Ok(inner.roles.len() < before)
    }

    async fn roles_of(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
    ) -> StoreResult<Vec<TournamentRole>> {
        Ok(self
            .lock()
            .roles
            .iter()
            .filter(|r| r.user_id == user_id && r.tournament_id == tournament_id)
            .filter_map(|r| TournamentRole::from_str(&r.role).ok())
            .collect())
    }

    async fn has_role(
        &self,
        user_id: Uuid,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<bool> {
        Ok(self.lock().roles.iter().any(|r| {
            r.user_id == user_id && r.tournament_id == tournament_id && r.role == role.as_str()
        }))
    }

    async fn users_with_role(
        &self,
        tournament_id: Uuid,
        role: TournamentRole,
    ) -> StoreResult<Vec<UserRow>> {
        let inner = self.lock();
        Ok(inner
            .roles
            .iter()
            .filter(|r| r.tournament_id == tournament_id && r.role == role.as_str())
            .filter_map(|r| inner.users.iter().find(|u| u.id == r.user_id).cloned())
            .collect())
    }

    async fn roles_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RoleRow>> {
        Ok(self
            .lock()
            .roles
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn delete_matches(&self, tournament_id: Uuid) -> StoreResult<()> {
        self.lock()
            .matches
            .retain(|m| m.tournament_id != tournament_id);
        Ok(())
    }

    async fn insert_match(&self, new: NewMatch) -> StoreResult<MatchRow> {
        let row = MatchRow {
            id: Uuid::new_v4(),
            tournament_id: new.tournament_id,
            round: new.round.as_str().to_string(),
            fighter1_id: new.fighter1_id,
            fighter2_id: new.fighter2_id,
            winner_id: new.winner_id,
            comment: new.comment,
            fight_date: new.fight_date,
            next_match_id: None,
        };
        self.lock().matches.push(row.clone());
        Ok(row)
    }

    async fn match_by_id(&self, id: Uuid) -> StoreResult<Option<MatchRow>> {
        Ok(self.lock().matches.iter().find(|m| m.id == id).cloned())
    }

    async fn matches_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<MatchRow>> {
        Ok(self
            .lock()
            .matches
            .iter()
            .filter(|m| m.tournament_id == tournament_id)
            .cloned()
            .collect())
    }

    async fn update_match(&self, row: &MatchRow) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(m) = inner.matches.iter_mut().find(|m| m.id == row.id) {
            m.fighter1_id = row.fighter1_id;
            m.fighter2_id = row.fighter2_id;
            m.winner_id = row.winner_id;
            m.comment = row.comment.clone();
            m.fight_date = row.fight_date;
            m.next_match_id = row.next_match_id;
        }
        Ok(())
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn insert_vote(&self, new: NewVote) -> StoreResult<Option<VoteRow>> {
        let mut inner = self.lock();
        let duplicate = inner
            .votes
            .iter()
            .any(|v| v.voter_id == new.voter_id && v.tournament_id == new.tournament_id);
        if duplicate {
            return Ok(None);
        }
        let row = VoteRow {
            id: Uuid::new_v4(),
            voter_id: new.voter_id,
            voted_for_id: new.voted_for_id,
            tournament_id: new.tournament_id,
            created_at: Utc::now(),
        };
        inner.votes.push(row.clone());
        Ok(Some(row))
    }

    async fn has_voted(&self, voter_id: Uuid, tournament_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .lock()
            .votes
            .iter()
            .any(|v| v.voter_id == voter_id && v.tournament_id == tournament_id))
    }

    async fn votes_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<VoteRow>> {
        Ok(self
            .lock()
            .votes
            .iter()
            .filter(|v| v.tournament_id == tournament_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PrizeStore for MemoryStore {
    async fn prizes_exist(&self, tournament_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .lock()
            .prizes
            .iter()
            .any(|p| p.tournament_id == tournament_id))
    }

    async fn insert_prizes(&self, rows: Vec<NewPrize>) -> StoreResult<Vec<PrizeRow>> {
        let now = Utc::now();
        let mut inner = self.lock();
        let mut out = Vec::with_capacity(rows.len());
        for new in rows {
            let row = PrizeRow {
                id: Uuid::new_v4(),
                knight_id: new.knight_id,
                tournament_id: new.tournament_id,
                place: new.place,
                amount: new.amount,
                calculated_at: now,
            };
            inner.prizes.push(row.clone());
            out.push(row);
        }
        Ok(out)
    }

    async fn prizes_for_tournament(&self, tournament_id: Uuid) -> StoreResult<Vec<PrizeRow>> {
        Ok(self
            .lock()
            .prizes
            .iter()
            .filter(|p| p.tournament_id == tournament_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use super::*;
    use crate::store::{NewTicket, NewTournament, NewVote};

    fn user(store: &MemoryStore) -> UserRow {
        let row = UserRow {
            id: Uuid::new_v4(),
            email: format!("{}@test.com", Uuid::new_v4()),
            name: "Test".into(),
            second_name: "User".into(),
            organizer: false,
            created_at: Utc::now(),
        };
        store.add_user(row.clone());
        row
    }

    async fn tournament(store: &MemoryStore, organizer: Uuid) -> TournamentRow {
        store
            .insert_tournament(NewTournament {
                name: "Trial".into(),
                description: None,
                required_amount: Decimal::new(1000, 0),
                prize_percent: Decimal::new(50, 0),
                required_knights: 4,
                total_seats: 4,
                event_date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
                status: TournamentStatus::WaitingDonation,
                organizer_id: organizer,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn a_second_role_is_refused() {
        let store = MemoryStore::new();
        let u = user(&store);
        let t = tournament(&store, u.id).await;

        assert!(store
            .grant_role(u.id, t.id, TournamentRole::Sponsor)
            .await
            .unwrap());
        assert!(!store
            .grant_role(u.id, t.id, TournamentRole::Knight)
            .await
            .unwrap());
        assert_eq!(
            store.roles_of(u.id, t.id).await.unwrap(),
            vec![TournamentRole::Sponsor]
        );
    }

    #[tokio::test]
    async fn a_second_vote_is_refused() {
        let store = MemoryStore::new();
        let voter = user(&store);
        let knight = user(&store);
        let t = tournament(&store, voter.id).await;

        let first = store
            .insert_vote(NewVote {
                voter_id: voter.id,
                voted_for_id: knight.id,
                tournament_id: t.id,
            })
            .await
            .unwrap();
        assert!(first.is_some());

        let second = store
            .insert_vote(NewVote {
                voter_id: voter.id,
                voted_for_id: knight.id,
                tournament_id: t.id,
            })
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.votes_for_tournament(t.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn tickets_never_exceed_capacity() {
        let store = MemoryStore::new();
        let organizer = user(&store);
        let t = tournament(&store, organizer.id).await;

        let a = user(&store);
        let booked = store
            .insert_ticket_checked(
                NewTicket {
                    spectator_id: a.id,
                    tournament_id: t.id,
                    seats_count: 3,
                    booking_code: Uuid::new_v4().to_string(),
                },
                t.total_seats,
            )
            .await
            .unwrap();
        assert!(booked.is_some());

        let b = user(&store);
        let refused = store
            .insert_ticket_checked(
                NewTicket {
                    spectator_id: b.id,
                    tournament_id: t.id,
                    seats_count: 2,
                    booking_code: Uuid::new_v4().to_string(),
                },
                t.total_seats,
            )
            .await
            .unwrap();
        assert!(refused.is_none());
        assert_eq!(store.confirmed_seats_sum(t.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn status_updates_are_compare_and_swap() {
        let store = MemoryStore::new();
        let organizer = user(&store);
        let t = tournament(&store, organizer.id).await;

        assert!(store
            .transition_status(
                t.id,
                TournamentStatus::WaitingDonation,
                TournamentStatus::KnightRegistration,
            )
            .await
            .unwrap());
        assert!(!store
            .transition_status(
                t.id,
                TournamentStatus::WaitingDonation,
                TournamentStatus::KnightRegistration,
            )
            .await
            .unwrap());
    }
}
