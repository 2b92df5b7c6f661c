#![forbid(unsafe_code)]

//! Call-shaping policies for size callbacks.
//!
//! [`make_limiter`] wraps a [`SizeCallback`] in one of three policies:
//!
//! - [`ReportingMode::Immediate`]: pass-through, every sample delivered
//!   synchronously and in order.
//! - [`ReportingMode::Debounce`]: each call cancels the pending delivery and
//!   schedules a new one `timeout` later. Only the last sample of a quiet
//!   period is delivered; a stream that never pauses for `timeout` is never
//!   delivered.
//! - [`ReportingMode::Throttle`]: *open* delivers synchronously and starts a
//!   `timeout` cooling window; samples arriving while *cooling* are dropped,
//!   not buffered.
//!
//! # Invariants
//!
//! 1. A limiter owns at most one outstanding timer.
//! 2. Dropping the last handle to a limiter clears its timer.
//! 3. Timer tasks reference their limiter weakly; a task that outlives its
//!    limiter is a no-op.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use tracing::{trace, warn};
use web_time::Duration;

use crate::error::SizeReportError;
use crate::sample::SizeSample;
use crate::timer::{TimerHost, TimerId};

/// Caller-supplied size handler, invoked with `(width, height)`.
pub type SizeCallback = Rc<dyn Fn(f64, f64)>;

/// How size changes are reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportingMode {
    Immediate,
    Debounce,
    #[default]
    Throttle,
}

impl ReportingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::Debounce => "debounce",
            Self::Throttle => "throttle",
        }
    }

    /// Whether this mode uses a timeout.
    #[must_use]
    pub const fn is_rate_limited(self) -> bool {
        !matches!(self, Self::Immediate)
    }

    /// Parse a mode, falling back to [`Throttle`](Self::Throttle) with a
    /// warning when the name is not recognized.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|err: SizeReportError| {
            warn!(mode = raw, %err, "reportingMode invalid, falling back to throttle");
            Self::Throttle
        })
    }
}

impl FromStr for ReportingMode {
    type Err = SizeReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "immediate" | "none" => Ok(Self::Immediate),
            "debounce" => Ok(Self::Debounce),
            "throttle" => Ok(Self::Throttle),
            other => Err(SizeReportError::UnrecognizedMode {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReportingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rate-limited wrapper around a [`SizeCallback`].
///
/// Cloning shares the limiter state; the timer is cleared when the last
/// clone is dropped.
#[derive(Clone)]
pub struct LimitedHandler {
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    Immediate(SizeCallback),
    Debounce(Rc<Debouncer>),
    Throttle(Rc<Throttler>),
}

impl fmt::Debug for LimitedHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LimitedHandler")
            .field("mode", &self.mode())
            .field("pending_timer", &self.has_pending_timer())
            .finish()
    }
}

/// Wrap `handler` in the policy named by `mode`.
///
/// `timeout` is ignored for [`ReportingMode::Immediate`].
pub fn make_limiter(
    handler: SizeCallback,
    mode: ReportingMode,
    timeout: Duration,
    timers: Rc<dyn TimerHost>,
) -> LimitedHandler {
    let kind = match mode {
        ReportingMode::Immediate => Kind::Immediate(handler),
        ReportingMode::Debounce => Kind::Debounce(Rc::new(Debouncer {
            callback: handler,
            delay: timeout,
            timers,
            pending: Cell::new(None),
        })),
        ReportingMode::Throttle => Kind::Throttle(Rc::new(Throttler {
            callback: handler,
            window: timeout,
            timers,
            cooling: Cell::new(false),
            timer: Cell::new(None),
        })),
    };
    LimitedHandler { kind }
}

impl LimitedHandler {
    /// Offer a sample to the policy.
    pub fn call(&self, sample: SizeSample) {
        match &self.kind {
            Kind::Immediate(cb) => cb(sample.width, sample.height),
            Kind::Debounce(d) => Debouncer::invoke(d, sample),
            Kind::Throttle(t) => Throttler::invoke(t, sample),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ReportingMode {
        match &self.kind {
            Kind::Immediate(_) => ReportingMode::Immediate,
            Kind::Debounce(_) => ReportingMode::Debounce,
            Kind::Throttle(_) => ReportingMode::Throttle,
        }
    }

    /// Whether a debounce delivery or throttle window is outstanding.
    #[must_use]
    pub fn has_pending_timer(&self) -> bool {
        match &self.kind {
            Kind::Immediate(_) => false,
            Kind::Debounce(d) => d.pending.get().is_some(),
            Kind::Throttle(t) => t.timer.get().is_some(),
        }
    }
}

struct Debouncer {
    callback: SizeCallback,
    delay: Duration,
    timers: Rc<dyn TimerHost>,
    pending: Cell<Option<TimerId>>,
}

impl Debouncer {
    fn invoke(this: &Rc<Self>, sample: SizeSample) {
        if let Some(id) = this.pending.take() {
            this.timers.clear_timeout(id);
        }
        let weak: Weak<Self> = Rc::downgrade(this);
        let id = this.timers.set_timeout(
            this.delay,
            Box::new(move || {
                let Some(debouncer) = weak.upgrade() else {
                    return;
                };
                debouncer.pending.set(None);
                (debouncer.callback)(sample.width, sample.height);
            }),
        );
        this.pending.set(Some(id));
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            trace!(timer_id = id.raw(), "debounce superseded");
            self.timers.clear_timeout(id);
        }
    }
}

struct Throttler {
    callback: SizeCallback,
    window: Duration,
    timers: Rc<dyn TimerHost>,
    cooling: Cell<bool>,
    timer: Cell<Option<TimerId>>,
}

impl Throttler {
    fn invoke(this: &Rc<Self>, sample: SizeSample) {
        if this.cooling.get() {
            trace!(width = sample.width, height = sample.height, "throttled");
            return;
        }
        this.cooling.set(true);
        let weak: Weak<Self> = Rc::downgrade(this);
        let id = this.timers.set_timeout(
            this.window,
            Box::new(move || {
                if let Some(throttler) = weak.upgrade() {
                    throttler.timer.set(None);
                    throttler.cooling.set(false);
                }
            }),
        );
        this.timer.set(Some(id));
        (this.callback)(sample.width, sample.height);
    }
}

impl Drop for Throttler {
    fn drop(&mut self) {
        if let Some(id) = self.timer.take() {
            self.timers.clear_timeout(id);
        }
    }
}
