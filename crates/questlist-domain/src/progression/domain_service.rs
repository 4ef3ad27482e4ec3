use std::collections::BTreeSet;

use crate::challenge::{challenge_definitions, ChallengeDefinition, ChallengeKind, ClaimError};
use crate::task::{Difficulty, TaskRecord};

/// Derived state of one challenge for one user.
#[derive(Debug, Clone, Copy)]
pub struct ChallengeProgress {
    pub definition: &'static ChallengeDefinition,
    pub current: i64,
    pub claimed: bool,
}

impl ChallengeProgress {
    pub fn is_complete(&self) -> bool {
        self.current >= self.definition.target_progress
    }
}

/// Domain service for progression business rules.
/// Contains pure domain logic without infrastructure dependencies.
pub struct ProgressionDomainService;

impl ProgressionDomainService {
    /// Derive a challenge's progress counter from a task snapshot.
    pub fn progress_for(definition: &ChallengeDefinition, tasks: &[TaskRecord]) -> i64 {
        let completed = tasks.iter().filter(|t| t.is_completed());
        match definition.kind {
            ChallengeKind::TotalTasks => completed.count() as i64,
            ChallengeKind::HardTasks => completed
                .filter(|t| t.difficulty() == Difficulty::Hard)
                .count() as i64,
        }
    }

    /// Recompute every challenge against the latest task and claim
    /// snapshots. Called on each emission of any input stream.
    pub fn compute_progress(
        tasks: &[TaskRecord],
        claimed_ids: &BTreeSet<String>,
    ) -> Vec<ChallengeProgress> {
        challenge_definitions()
            .iter()
            .map(|definition| ChallengeProgress {
                definition,
                current: Self::progress_for(definition, tasks),
                claimed: claimed_ids.contains(definition.id),
            })
            .collect()
    }

    /// Validate the claim preconditions: target reached, not yet claimed.
    pub fn can_claim(progress: &ChallengeProgress) -> Result<(), ClaimError> {
        if progress.claimed {
            return Err(ClaimError::NotEligible(format!(
                "Challenge already claimed: {}",
                progress.definition.id
            )));
        }
        if !progress.is_complete() {
            return Err(ClaimError::NotEligible(format!(
                "Challenge {} at {}/{}",
                progress.definition.id, progress.current, progress.definition.target_progress
            )));
        }
        Ok(())
    }
}
