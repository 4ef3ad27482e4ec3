mod aggregate;
mod repository;

pub use aggregate::{Difficulty, TaskRecord};
pub use repository::TaskRepository;
