mod domain_service;

pub use domain_service::{ChallengeProgress, ProgressionDomainService};
