// Domain layer - Pure business logic
// No dependencies on infrastructure or presentation layers

pub mod challenge;
pub mod events;
pub mod progression;
pub mod rewards;
pub mod shared;
pub mod stats;
pub mod task;

// Re-exports for convenience
pub use events::DomainEvent;
pub use shared::{DomainError, TaskId, UserId};
