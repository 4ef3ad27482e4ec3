// Application layer - Use-case orchestration over the domain
// Wires repositories, services and the event bus together

pub mod application;
pub mod bootstrap;

pub use bootstrap::AppContext;
