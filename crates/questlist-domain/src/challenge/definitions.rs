use serde::{Deserialize, Serialize};

/// What a challenge counts. Progress is derived live from the task store,
/// never persisted. Counts are all-time: the original product copy said
/// "today" but never scoped the query, so the wording here matches the
/// actual semantics instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    /// Completed tasks, any difficulty.
    TotalTasks,
    /// Completed tasks with Hard difficulty.
    HardTasks,
}

/// Static challenge definition. Per-user state is only the claims ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub coin_reward: i64,
    pub target_progress: i64,
    pub kind: ChallengeKind,
}

pub fn challenge_definitions() -> &'static [ChallengeDefinition] {
    const DEFINITIONS: &[ChallengeDefinition] = &[
        ChallengeDefinition {
            id: "first_step",
            title: "First Step",
            description: "Complete 1 task",
            coin_reward: 10,
            target_progress: 1,
            kind: ChallengeKind::TotalTasks,
        },
        ChallengeDefinition {
            id: "productive",
            title: "Productive",
            description: "Complete 3 tasks",
            coin_reward: 30,
            target_progress: 3,
            kind: ChallengeKind::TotalTasks,
        },
        ChallengeDefinition {
            id: "unstoppable",
            title: "Unstoppable",
            description: "Complete 5 tasks",
            coin_reward: 50,
            target_progress: 5,
            kind: ChallengeKind::TotalTasks,
        },
        ChallengeDefinition {
            id: "challenger",
            title: "Challenger",
            description: "Complete a hard task",
            coin_reward: 25,
            target_progress: 1,
            kind: ChallengeKind::HardTasks,
        },
    ];
    DEFINITIONS
}

pub fn find_challenge(id: &str) -> Option<&'static ChallengeDefinition> {
    challenge_definitions().iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_have_unique_ids() {
        let defs = challenge_definitions();
        for (i, a) in defs.iter().enumerate() {
            for b in defs.iter().skip(i + 1) {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_find_challenge() {
        assert_eq!(find_challenge("challenger").unwrap().coin_reward, 25);
        assert!(find_challenge("consistency").is_none());
    }
}
