use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::codec::Frame;

/// Receives complete frames of one type.
///
/// Handlers run on the read loop's thread and must not block for long.
pub trait FrameHandler: Send + Sync {
    fn on_frame(&self, frame: &Frame);
}

impl<F> FrameHandler for F
where
    F: Fn(&Frame) + Send + Sync,
{
    fn on_frame(&self, frame: &Frame) {
        self(frame)
    }
}

/// Frame-type to handler table, shared between a read loop and the code
/// that configures it.
///
/// One handler per frame type; registering again replaces the old one.
/// Clones share the same table.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: Arc<Mutex<HashMap<u16, Arc<dyn FrameHandler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `frame_type`, returning the handler it replaced.
    pub fn register<H>(&self, frame_type: u16, handler: H) -> Option<Arc<dyn FrameHandler>>
    where
        H: FrameHandler + 'static,
    {
        self.register_shared(frame_type, Arc::new(handler))
    }

    /// Register an already shared handler.
    pub fn register_shared(
        &self,
        frame_type: u16,
        handler: Arc<dyn FrameHandler>,
    ) -> Option<Arc<dyn FrameHandler>> {
        self.lock().insert(frame_type, handler)
    }

    pub fn remove(&self, frame_type: u16) -> Option<Arc<dyn FrameHandler>> {
        self.lock().remove(&frame_type)
    }

    pub fn get(&self, frame_type: u16) -> Option<Arc<dyn FrameHandler>> {
        self.lock().get(&frame_type).cloned()
    }

    pub fn contains(&self, frame_type: u16) -> bool {
        self.lock().contains_key(&frame_type)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver `frame` to its handler. Returns false when none is registered.
    ///
    /// The table lock is released before the handler runs, so a handler may
    /// change registrations.
    pub fn dispatch(&self, frame: &Frame) -> bool {
        match self.get(frame.frame_type) {
            Some(handler) => {
                handler.on_frame(frame);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u16, Arc<dyn FrameHandler>>> {
        // The map stays consistent even if a holder panicked.
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<u16> = self.lock().keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("frame_types", &types)
            .finish()
    }
}
