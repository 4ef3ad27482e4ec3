use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

use questlist_domain::events::{DomainEvent, EventBus, EventHandler};
use questlist_domain::shared::DomainError;

/// Type-erased registration slot. Handlers are registered typed (see
/// [`InMemoryEventBus::subscribe`]) and downcast back at dispatch, keyed
/// by the event's type name.
#[async_trait]
trait AnyHandler: Send + Sync {
    async fn handle_any(&self, event: &(dyn Any + Send + Sync)) -> Result<(), DomainError>;
}

struct Typed<E, H> {
    handler: H,
    _marker: PhantomData<fn(E)>,
}

#[async_trait]
impl<E: DomainEvent + 'static, H: EventHandler<E>> AnyHandler for Typed<E, H> {
    async fn handle_any(&self, event: &(dyn Any + Send + Sync)) -> Result<(), DomainError> {
        match event.downcast_ref::<E>() {
            Some(event) => self.handler.handle(event).await,
            None => Err(DomainError::Infrastructure(
                "Event payload did not match its registered type".to_string(),
            )),
        }
    }
}

/// In-memory event bus that dispatches events synchronously to the
/// handlers registered for their type. Handler failures are logged and
/// never propagate to the publisher: reward notifications are
/// fire-and-forget.
pub struct InMemoryEventBus {
    handlers: RwLock<HashMap<&'static str, Vec<Arc<dyn AnyHandler>>>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a typed handler for one event kind.
    pub async fn subscribe<E, H>(&self, handler: H)
    where
        E: DomainEvent + 'static,
        H: EventHandler<E> + 'static,
    {
        let event_type_name = std::any::type_name::<E>();
        let mut handlers = self.handlers.write().await;

        handlers
            .entry(event_type_name)
            .or_default()
            .push(Arc::new(Typed::<E, H> {
                handler,
                _marker: PhantomData,
            }));

        tracing::debug!(event_type = event_type_name, "Subscribed event handler");
    }

    pub async fn handler_count<E: DomainEvent + 'static>(&self) -> usize {
        let handlers = self.handlers.read().await;
        handlers
            .get(std::any::type_name::<E>())
            .map_or(0, |h| h.len())
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, event: Box<dyn DomainEvent>) -> Result<(), DomainError> {
        let event_type_name = event.event_type_name();
        let event_any = event.as_any();

        let handlers = self.handlers.read().await;
        let Some(event_handlers) = handlers.get(event_type_name) else {
            tracing::trace!(event_type = event_type_name, "No handlers for event");
            return Ok(());
        };

        for handler in event_handlers {
            if let Err(e) = handler.handle_any(event_any).await {
                // Log and continue; one failing handler must not starve others.
                tracing::error!(
                    event_type = event_type_name,
                    error = %e,
                    "Event handler failed"
                );
            }
        }

        Ok(())
    }
}
