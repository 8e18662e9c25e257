// src/event.rs - Event system for storefront state changes

//! Type-safe publish/subscribe bus the engines use to announce state
//! changes (cart updated, comparison changed, chat replies) so a UI layer
//! can re-read state reactively. Dispatch is async and fire-and-forget:
//! handler failures are logged, never propagated to the mutating engine.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::types::Metadata;

/// Base event trait that all events must implement
pub trait Event: Send + Sync + Debug {
    /// Get the event type identifier
    fn event_type(&self) -> &'static str;

    /// Get the event source
    fn source(&self) -> &str;

    /// Get event metadata
    fn metadata(&self) -> &Metadata;

    /// Get event as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Get event timestamp (default implementation)
    fn timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Event handler trait for processing events
#[async_trait]
pub trait EventHandler: Send + Sync + Debug {
    /// Handle an event
    async fn handle(&self, event: &dyn Event) -> crate::error::Result<()>;

    /// Get handler name for debugging
    fn name(&self) -> &str;

    /// Get event types this handler is interested in
    fn event_types(&self) -> Vec<&'static str>;

    /// Whether this handler should receive all events (wildcard)
    fn is_wildcard(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
struct Subscription {
    id: Uuid,
    handler: Arc<dyn EventHandler>,
}

/// Central event bus with per-type and wildcard subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    handlers: DashMap<String, Vec<Subscription>>,
    wildcard_handlers: DashMap<Uuid, Arc<dyn EventHandler>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            wildcard_handlers: DashMap::new(),
        }
    }

    /// Register a handler for the event types it declares. Returns the
    /// subscription id used to unsubscribe.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler>) -> Uuid {
        let id = Uuid::new_v4();

        if handler.is_wildcard() {
            self.wildcard_handlers.insert(id, handler);
            return id;
        }

        for event_type in handler.event_types() {
            self.handlers
                .entry(event_type.to_string())
                .or_default()
                .push(Subscription {
                    id,
                    handler: Arc::clone(&handler),
                });
        }
        id
    }

    /// Remove a previously registered handler
    pub fn unsubscribe(&self, subscription_id: Uuid) {
        self.wildcard_handlers.remove(&subscription_id);
        for mut entry in self.handlers.iter_mut() {
            entry.value_mut().retain(|sub| sub.id != subscription_id);
        }
    }

    /// Publish an event to every matching handler
    pub async fn publish(&self, event: &dyn Event) {
        let mut matched: Vec<Arc<dyn EventHandler>> = Vec::new();

        if let Some(subs) = self.handlers.get(event.event_type()) {
            matched.extend(subs.iter().map(|sub| Arc::clone(&sub.handler)));
        }
        matched.extend(
            self.wildcard_handlers
                .iter()
                .map(|entry| Arc::clone(entry.value())),
        );

        let dispatches: Vec<_> = matched
            .into_iter()
            .map(|handler| async move {
                if let Err(e) = handler.handle(event).await {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = event.event_type(),
                        error = %e,
                        "event handler failed"
                    );
                }
            })
            .collect();

        futures::future::join_all(dispatches).await;
    }

    /// Number of non-wildcard subscriptions for an event type
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.handlers
            .get(event_type)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug)]
    struct TestEvent {
        source: String,
        metadata: Metadata,
    }

    impl Event for TestEvent {
        fn event_type(&self) -> &'static str {
            "cart.updated"
        }

        fn source(&self) -> &str {
            &self.source
        }

        fn metadata(&self) -> &Metadata {
            &self.metadata
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        wildcard: bool,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &dyn Event) -> crate::error::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "counting_handler"
        }

        fn event_types(&self) -> Vec<&'static str> {
            vec!["cart.updated"]
        }

        fn is_wildcard(&self) -> bool {
            self.wildcard
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_typed_and_wildcard_handlers() {
        let bus = EventBus::new();
        let typed_calls = Arc::new(AtomicUsize::new(0));
        let wildcard_calls = Arc::new(AtomicUsize::new(0));

        bus.subscribe(Arc::new(CountingHandler {
            calls: Arc::clone(&typed_calls),
            wildcard: false,
        }));
        bus.subscribe(Arc::new(CountingHandler {
            calls: Arc::clone(&wildcard_calls),
            wildcard: true,
        }));

        let event = TestEvent {
            source: "cart_engine".to_string(),
            metadata: Metadata::new(),
        };
        bus.publish(&event).await;

        assert_eq!(typed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(wildcard_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let id = bus.subscribe(Arc::new(CountingHandler {
            calls: Arc::clone(&calls),
            wildcard: false,
        }));
        assert_eq!(bus.handler_count("cart.updated"), 1);

        bus.unsubscribe(id);
        assert_eq!(bus.handler_count("cart.updated"), 0);

        let event = TestEvent {
            source: "cart_engine".to_string(),
            metadata: Metadata::new(),
        };
        bus.publish(&event).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
