#![forbid(unsafe_code)]

//! Scripted lifecycle runner on a lab clock and a fake platform.
//!
//! A [`SizeReportHarness`] owns one size reporter together with everything
//! it talks to: a [`LabClock`], a [`TimerQueue`] driven by that clock, a
//! [`FakeResizePlatform`], and a [`Recorder`]. Tests either call its methods
//! directly or replay a list of [`Step`]s.
//!
//! Lifecycle calls that make no sense in the current phase (mounting twice,
//! updating after unmount) are ignored, so arbitrary step sequences are
//! always runnable.

use std::fmt;
use std::rc::Rc;

use sizereport_core::clock::LabClock;
use sizereport_core::{PropValue, Props, Result, SizeSample, TimerQueue};
use sizereport_runtime::testing::{FakeElement, FakeResizePlatform};
use sizereport_runtime::{HostContext, MountedSizeReporter, RawResizeEvent, SizeReportingElement};
use tracing::debug;
use web_time::Duration;

use crate::recorder::{Delivery, Recorder};

/// Label of the callback installed by [`SizeReportHarness::new`].
pub const PRIMARY: &str = "primary";

/// Element every harness mounts onto.
pub const ELEMENT: FakeElement = FakeElement(1);

/// One scripted action.
#[derive(Debug, Clone)]
pub enum Step {
    Mount,
    /// Deliver queued platform notifications.
    Flush,
    /// Synchronous platform notification.
    Resize { width: f64, height: f64 },
    /// Notification held until the next [`Step::Flush`].
    QueueResize { width: f64, height: f64 },
    /// Notification without a content box.
    EmptyEvent,
    Advance { ms: u64 },
    Update(Props),
    Unmount,
}

/// Where the harnessed reporter is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessPhase {
    Constructed,
    Mounted,
    Unmounted,
}

enum Stage {
    Constructed(SizeReportingElement<FakeResizePlatform>),
    Mounted(MountedSizeReporter<FakeResizePlatform>),
    Unmounted,
}

impl Stage {
    fn phase(&self) -> HarnessPhase {
        match self {
            Self::Constructed(_) => HarnessPhase::Constructed,
            Self::Mounted(_) => HarnessPhase::Mounted,
            Self::Unmounted => HarnessPhase::Unmounted,
        }
    }
}

/// Deterministic host for one size reporter.
pub struct SizeReportHarness {
    clock: LabClock,
    timers: Rc<TimerQueue>,
    platform: Rc<FakeResizePlatform>,
    recorder: Recorder,
    stage: Stage,
}

impl fmt::Debug for SizeReportHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeReportHarness")
            .field("now_ms", &self.now_ms())
            .field("phase", &self.phase())
            .field("pending_timers", &self.timers.pending())
            .field("deliveries", &self.recorder.len())
            .finish()
    }
}

impl SizeReportHarness {
    /// Reporter in `mode` with a `timeout_ms` window, reporting to the
    /// [`PRIMARY`] callback.
    pub fn new(mode: &str, timeout_ms: u64) -> Result<Self> {
        Self::from_props(|recorder| {
            Props::new()
                .with("onSizeUpdated", recorder.prop(PRIMARY))
                .with("reportingMode", mode)
                .with("timeoutMs", timeout_ms as f64)
        })
    }

    /// Reporter built from props that may reference the recorder.
    pub fn from_props(props: impl FnOnce(&Recorder) -> Props) -> Result<Self> {
        Self::from_props_on(FakeResizePlatform::new(), props)
    }

    /// As [`from_props`](Self::from_props), on a preconfigured platform.
    pub fn from_props_on(
        platform: FakeResizePlatform,
        props: impl FnOnce(&Recorder) -> Props,
    ) -> Result<Self> {
        let clock = LabClock::new();
        let timers = Rc::new(TimerQueue::lab(&clock));
        let platform = Rc::new(platform);
        let recorder = Recorder::new(clock.clone());
        let ctx = HostContext::new(Rc::clone(&platform), timers.clone());
        let element = SizeReportingElement::new(&props(&recorder), ctx)?;
        Ok(Self {
            clock,
            timers,
            platform,
            recorder,
            stage: Stage::Constructed(element),
        })
    }

    #[must_use]
    pub fn now_ms(&self) -> u64 {
        self.clock.elapsed_ms()
    }

    #[must_use]
    pub fn phase(&self) -> HarnessPhase {
        self.stage.phase()
    }

    #[must_use]
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    #[must_use]
    pub fn platform(&self) -> &FakeResizePlatform {
        &self.platform
    }

    #[must_use]
    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Every delivery so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.recorder.deliveries()
    }

    /// `(at_ms, width, height)` for every delivery.
    #[must_use]
    pub fn timeline(&self) -> Vec<(u64, f64, f64)> {
        self.recorder.timeline()
    }

    /// Forwarded attributes of the reporter, if it still exists.
    #[must_use]
    pub fn forwarded_attributes(&self) -> Option<Props> {
        match &self.stage {
            Stage::Constructed(element) => Some(element.forwarded_attributes().clone()),
            Stage::Mounted(mounted) => Some(mounted.forwarded_attributes().clone()),
            Stage::Unmounted => None,
        }
    }

    /// Mount onto [`ELEMENT`]. A failed mount leaves the harness unmounted.
    pub fn mount(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.stage, Stage::Unmounted) {
            Stage::Constructed(element) => {
                self.stage = Stage::Mounted(element.mount(&ELEMENT)?);
                debug!(at_ms = self.now_ms(), "harness mounted");
            }
            other => self.stage = other,
        }
        Ok(())
    }

    /// Mount and deliver the platform's registration notification.
    pub fn mount_and_flush(&mut self) -> Result<()> {
        self.mount()?;
        self.flush();
        Ok(())
    }

    /// Deliver queued platform notifications. Returns how many.
    pub fn flush(&self) -> usize {
        self.platform.flush()
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.platform.emit(ELEMENT, SizeSample::new(width, height));
    }

    pub fn queue_resize(&self, width: f64, height: f64) {
        self.platform.queue(ELEMENT, SizeSample::new(width, height));
    }

    pub fn empty_event(&self) {
        self.platform.emit_raw(ELEMENT, RawResizeEvent::empty());
    }

    /// Advance lab time, firing due timers. Returns how many fired.
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.timers.advance(Duration::from_millis(ms))
    }

    /// Advance lab time to `at_ms`. Times in the past are ignored.
    pub fn advance_to(&self, at_ms: u64) -> usize {
        self.advance_ms(at_ms.saturating_sub(self.now_ms()))
    }

    /// Apply new props. Ignored once unmounted.
    pub fn update(&mut self, props: &Props) -> Result<()> {
        match &mut self.stage {
            Stage::Constructed(element) => element.update(props),
            Stage::Mounted(mounted) => mounted.update(props),
            Stage::Unmounted => Ok(()),
        }
    }

    /// Apply props that may reference the recorder.
    pub fn update_with(&mut self, props: impl FnOnce(&Recorder) -> Props) -> Result<()> {
        let props = props(&self.recorder);
        self.update(&props)
    }

    /// Apply `props` with the currently installed callback, as an embedding
    /// context does when it re-renders with a stable callback.
    pub fn update_keeping_callback(&mut self, props: Props) -> Result<()> {
        let callback = match &self.stage {
            Stage::Constructed(element) => Rc::clone(&element.config().on_size_updated),
            Stage::Mounted(mounted) => Rc::clone(&mounted.config().on_size_updated),
            Stage::Unmounted => return Ok(()),
        };
        self.update(&props.with("onSizeUpdated", PropValue::Callback(callback)))
    }

    /// Tear down the reporter, mounted or not.
    pub fn unmount(&mut self) {
        if let Stage::Mounted(mounted) = std::mem::replace(&mut self.stage, Stage::Unmounted) {
            mounted.unmount();
            debug!(at_ms = self.now_ms(), "harness unmounted");
        }
    }

    /// Replay `steps` in order, stopping at the first error.
    pub fn run(&mut self, steps: &[Step]) -> Result<()> {
        for step in steps {
            self.step(step)?;
        }
        Ok(())
    }

    pub fn step(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Mount => self.mount()?,
            Step::Flush => {
                self.flush();
            }
            Step::Resize { width, height } => self.resize(*width, *height),
            Step::QueueResize { width, height } => self.queue_resize(*width, *height),
            Step::EmptyEvent => self.empty_event(),
            Step::Advance { ms } => {
                self.advance_ms(*ms);
            }
            Step::Update(props) => self.update(props)?,
            Step::Unmount => self.unmount(),
        }
        Ok(())
    }
}
