//! `window.setTimeout` timer host.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use sizereport_core::{Result, SizeReportError, TimerHost, TimerId};
use sizereport_core::timer::TimerTask;
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;
use web_sys::Window;
use web_time::Duration;

use crate::convert::timeout_millis;

#[derive(Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Waiting,
    Running,
    Fired,
}

struct Scheduled {
    state: Rc<Cell<TimerState>>,
    _callback: Closure<dyn FnMut()>,
}

/// Timer host on the browser event loop.
///
/// Callbacks are kept alive here until they fire or are cleared. A fired
/// callback cannot drop itself while running, so fired entries are pruned
/// on the next call into the host.
pub struct WindowTimers {
    window: Window,
    scheduled: RefCell<HashMap<i32, Scheduled>>,
}

impl fmt::Debug for WindowTimers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowTimers")
            .field("scheduled", &self.scheduled.borrow().len())
            .finish()
    }
}

impl WindowTimers {
    pub fn new() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| SizeReportError::platform("no global window"))?;
        Ok(Self {
            window,
            scheduled: RefCell::new(HashMap::new()),
        })
    }

    /// Timers scheduled and not yet fired or cleared.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.prune_fired();
        self.scheduled
            .borrow()
            .values()
            .filter(|entry| entry.state.get() == TimerState::Waiting)
            .count()
    }

    /// Callbacks currently held, fired or not.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.scheduled.borrow().len()
    }

    fn prune_fired(&self) {
        self.scheduled
            .borrow_mut()
            .retain(|_, entry| entry.state.get() != TimerState::Fired);
    }
}

impl TimerHost for WindowTimers {
    fn set_timeout(&self, delay: Duration, task: TimerTask) -> TimerId {
        self.prune_fired();

        let state = Rc::new(Cell::new(TimerState::Waiting));
        let flag = Rc::clone(&state);
        // Fired only after the task returns, so the host never drops the
        // callback it is running.
        let callback: Closure<dyn FnMut()> = Closure::once(move || {
            flag.set(TimerState::Running);
            task();
            flag.set(TimerState::Fired);
        });
        match self.window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.as_ref().unchecked_ref(),
            timeout_millis(delay),
        ) {
            Ok(handle) => {
                self.scheduled.borrow_mut().insert(
                    handle,
                    Scheduled {
                        state,
                        _callback: callback,
                    },
                );
                TimerId::from_raw(u64::try_from(handle).unwrap_or(0))
            }
            Err(err) => {
                warn!(?err, "setTimeout failed, task dropped");
                // Browsers never hand out 0, so clearing it is a no-op.
                TimerId::from_raw(0)
            }
        }
    }

    fn clear_timeout(&self, id: TimerId) {
        let Ok(handle) = i32::try_from(id.raw()) else {
            return;
        };
        let state = self.scheduled.borrow().get(&handle).map(|entry| entry.state.get());
        match state {
            Some(TimerState::Waiting) => {
                self.scheduled.borrow_mut().remove(&handle);
                self.window.clear_timeout_with_handle(handle);
            }
            // A task clearing its own timer; pruned once it returns.
            Some(TimerState::Running) | None => {}
            Some(TimerState::Fired) => {
                self.scheduled.borrow_mut().remove(&handle);
            }
        }
        self.prune_fired();
    }
}
