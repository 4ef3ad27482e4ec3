use async_trait::async_trait;

use super::DomainEvent;
use crate::shared::DomainError;

/// Publisher seam for reward notifications. Publishing is
/// fire-and-forget: a failed handler never fails the operation that
/// produced the event.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: Box<dyn DomainEvent>) -> Result<(), DomainError>;
}

/// Typed consumer of one event kind (a toast presenter, a sync hook).
/// Registration and dispatch are the bus implementation's concern.
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    async fn handle(&self, event: &E) -> Result<(), DomainError>;
}
