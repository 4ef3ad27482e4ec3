mod definitions;
mod repository;

pub use definitions::{challenge_definitions, find_challenge, ChallengeDefinition, ChallengeKind};
pub use repository::{ClaimError, ClaimRecord, ClaimsRepository};
