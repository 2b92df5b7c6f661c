#![forbid(unsafe_code)]

//! Per-instance state shared between the controller and the bridge.
//!
//! Both types are cheap `Rc` handles. The controller is the only writer;
//! the bridge and the liveness gate around the caller's callback only read.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use sizereport_core::LimitedHandler;

/// Where an instance is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecyclePhase {
    /// Constructed, element not yet available.
    #[default]
    Pending,
    /// Between mount completion and unmount start.
    Live,
    /// Unmounting or unmounted. Terminal.
    Dead,
}

/// Liveness flag: false until mount, true until unmount, then false forever.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    phase: Rc<Cell<LifecyclePhase>>,
}

impl Liveness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.phase.get() == LifecyclePhase::Live
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.phase.get()
    }

    /// Enter the live phase. Returns `false`, leaving the flag dead, if the
    /// instance was already torn down.
    pub fn mark_live(&self) -> bool {
        match self.phase.get() {
            LifecyclePhase::Dead => false,
            _ => {
                self.phase.set(LifecyclePhase::Live);
                true
            }
        }
    }

    /// Enter the terminal phase.
    pub fn kill(&self) {
        self.phase.set(LifecyclePhase::Dead);
    }
}

/// Replaceable reference to the active rate-limited handler.
///
/// Readers clone the handler out of the slot before calling it, so a
/// callback that reconfigures the instance never finds the slot borrowed.
#[derive(Clone, Default)]
pub struct HandlerSlot {
    current: Rc<RefCell<Option<LimitedHandler>>>,
}

impl fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("current", &*self.current.borrow())
            .finish()
    }
}

impl HandlerSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handler`, returning the one it replaces.
    ///
    /// The caller decides when the previous handler is dropped; dropping it
    /// clears any timer it still owns.
    pub fn install(&self, handler: LimitedHandler) -> Option<LimitedHandler> {
        self.current.borrow_mut().replace(handler)
    }

    /// Empty the slot, returning the handler it held.
    pub fn clear(&self) -> Option<LimitedHandler> {
        self.current.borrow_mut().take()
    }

    /// Clone of the active handler.
    #[must_use]
    pub fn current(&self) -> Option<LimitedHandler> {
        self.current.borrow().clone()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.borrow().is_none()
    }
}
