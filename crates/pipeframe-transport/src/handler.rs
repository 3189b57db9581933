use std::sync::{Arc, PoisonError, RwLock};

use crate::message::Message;

/// Callback invoked with each decoded message.
pub type Handler = Arc<dyn Fn(Message) + Send + Sync + 'static>;

/// Replaceable handler slot shared between the transport and its read loop.
///
/// The read loop takes a clone of the current handler and calls it with the
/// lock released, so a handler may replace itself.
pub(crate) struct HandlerSlot {
    current: RwLock<Handler>,
}

impl HandlerSlot {
    pub(crate) fn new() -> Self {
        Self {
            current: RwLock::new(noop()),
        }
    }

    pub(crate) fn replace(&self, handler: Handler) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = handler;
    }

    pub(crate) fn current(&self) -> Handler {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }
}

fn noop() -> Handler {
    Arc::new(|_| {})
}
