//! Type-indexed handler table.

use dlt_types::ConnectionType;

use crate::error::EventHandlerError;
use crate::ports::ConnectionHandler;

type BoxedHandler<S> = Box<dyn ConnectionHandler<S>>;

/// One handler per connection type, complete by construction.
pub struct DispatchTable<S> {
    handlers: Vec<BoxedHandler<S>>,
}

impl<S> DispatchTable<S> {
    pub fn builder() -> DispatchTableBuilder<S> {
        DispatchTableBuilder::new()
    }

    pub fn handler(&self, ty: ConnectionType) -> &dyn ConnectionHandler<S> {
        self.handlers[ty.index()].as_ref()
    }
}

impl<S> std::fmt::Debug for DispatchTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

pub struct DispatchTableBuilder<S> {
    slots: [Option<BoxedHandler<S>>; ConnectionType::COUNT],
}

impl<S> Default for DispatchTableBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> DispatchTableBuilder<S> {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Set the handler for `ty`, replacing any earlier one.
    #[must_use]
    pub fn register<H>(mut self, ty: ConnectionType, handler: H) -> Self
    where
        H: ConnectionHandler<S> + 'static,
    {
        self.slots[ty.index()] = Some(Box::new(handler));
        self
    }

    /// Finish the table. Fails on the first type without a handler.
    pub fn build(self) -> Result<DispatchTable<S>, EventHandlerError> {
        let mut handlers = Vec::with_capacity(ConnectionType::COUNT);
        for (ty, slot) in ConnectionType::ALL.into_iter().zip(self.slots) {
            handlers.push(slot.ok_or(EventHandlerError::MissingHandler(ty))?);
        }
        Ok(DispatchTable { handlers })
    }
}
