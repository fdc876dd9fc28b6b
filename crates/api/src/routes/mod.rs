pub mod applications;
pub mod fights;
pub mod sponsorships;
pub mod tickets;
pub mod tournaments;
pub mod user_roles;
pub mod votes;
