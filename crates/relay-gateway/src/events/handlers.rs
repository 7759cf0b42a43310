//! Callbacks keyed by dispatch event

use super::{GatewayEvent, GatewayEventType};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback invoked with each matching dispatch
pub type EventHandler = Arc<dyn Fn(&GatewayEvent) + Send + Sync>;

/// Handlers run synchronously, in registration order, on the session task.
#[derive(Clone, Default)]
pub struct EventHandlers {
    handlers: HashMap<GatewayEventType, Vec<EventHandler>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, kind: GatewayEventType, handler: F)
    where
        F: Fn(&GatewayEvent) + Send + Sync + 'static,
    {
        self.handlers.entry(kind).or_default().push(Arc::new(handler));
    }

    /// Run every handler for `event`; returns how many ran
    pub fn dispatch(&self, event: &GatewayEvent) -> usize {
        let Some(handlers) = event.kind.and_then(|kind| self.handlers.get(&kind)) else {
            tracing::trace!(event = %event.name, "No handler");
            return 0;
        };

        for handler in handlers {
            handler(event);
        }
        handlers.len()
    }
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("EventHandlers").field("events", &kinds).finish()
    }
}
