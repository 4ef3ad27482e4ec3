use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{DomainError, TaskId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(DomainError::Validation(format!(
                "Unknown difficulty: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    id: TaskId,
    owner_id: UserId,
    title: String,
    description: Option<String>,
    category: String,
    difficulty: Difficulty,
    completed: bool,
    due_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TaskRecord {
    pub fn new(
        owner_id: UserId,
        title: String,
        description: Option<String>,
        category: String,
        difficulty: Difficulty,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::Validation(
                "Task title cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            id: TaskId::new(),
            owner_id,
            title: title.trim().to_string(),
            description,
            category,
            difficulty,
            completed: false,
            due_date,
            created_at: Utc::now(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: TaskId,
        owner_id: UserId,
        title: String,
        description: Option<String>,
        category: String,
        difficulty: Difficulty,
        completed: bool,
        due_date: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            title,
            description,
            category,
            difficulty,
            completed,
            due_date,
            created_at,
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn update_details(
        &mut self,
        title: String,
        description: Option<String>,
        category: String,
        difficulty: Difficulty,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<(), DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::Validation(
                "Task title cannot be empty".to_string(),
            ));
        }
        self.title = title.trim().to_string();
        self.description = description;
        self.category = category;
        self.difficulty = difficulty;
        self.due_date = due_date;
        Ok(())
    }

    /// Flip the completion flag, returning the new state.
    pub fn toggle_completed(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}
