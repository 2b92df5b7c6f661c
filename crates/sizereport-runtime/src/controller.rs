#![forbid(unsafe_code)]

//! Lifecycle controller for one size-reporting wrapper element.
//!
//! ```text
//!   new ──► SizeReportingElement ──mount──► MountedSizeReporter ──unmount──► (gone)
//!                 │  ▲                          │  ▲
//!                 └──┘ update                   └──┘ update
//! ```
//!
//! The two states are distinct types. `mount` and `unmount` consume their
//! receiver, so the platform subscription is attached once and released
//! once, and a failed mount leaves nothing behind.
//!
//! # Invariants
//!
//! 1. The caller's callback is never invoked before mount completes or
//!    after unmount begins, including from timers armed earlier. Every
//!    delivery passes through a liveness gate evaluated at delivery time.
//! 2. An update rebuilds the handler only when the callback, mode or
//!    timeout changed. The previous handler is then dropped, which clears
//!    its pending timer, so a superseded debounce never delivers. Any other
//!    update keeps the installed handler and its pending state.
//! 3. Unmount marks the instance dead before releasing the subscription.
//! 4. A rejected update leaves configuration and handler untouched.

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use sizereport_core::config::StyleMap;
use sizereport_core::{Props, Result, SizeCallback, SizeReportConfig, TimerHost, make_limiter};
use tracing::{debug, trace};

use crate::bridge::{Attachment, ObservationBridge};
use crate::platform::ResizePlatform;
use crate::slot::{HandlerSlot, LifecyclePhase, Liveness};

static NEXT_REPORTER_ID: AtomicU64 = AtomicU64::new(1);

fn next_reporter_id() -> u64 {
    NEXT_REPORTER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Host services an instance needs: the observation primitive and timers.
pub struct HostContext<P> {
    pub platform: Rc<P>,
    pub timers: Rc<dyn TimerHost>,
}

impl<P> HostContext<P> {
    pub fn new(platform: Rc<P>, timers: Rc<dyn TimerHost>) -> Self {
        Self { platform, timers }
    }
}

impl<P> Clone for HostContext<P> {
    fn clone(&self) -> Self {
        Self {
            platform: Rc::clone(&self.platform),
            timers: Rc::clone(&self.timers),
        }
    }
}

impl<P> fmt::Debug for HostContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext").finish_non_exhaustive()
    }
}

/// State shared by both lifecycle stages.
struct Instance<P: ResizePlatform> {
    id: u64,
    config: SizeReportConfig,
    liveness: Liveness,
    slot: HandlerSlot,
    bridge: ObservationBridge<P>,
    timers: Rc<dyn TimerHost>,
}

impl<P: ResizePlatform> fmt::Debug for Instance<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("phase", &self.liveness.phase())
            .field("slot", &self.slot)
            .finish()
    }
}

impl<P: ResizePlatform> Instance<P> {
    fn new(config: SizeReportConfig, ctx: HostContext<P>) -> Self {
        let liveness = Liveness::new();
        let slot = HandlerSlot::new();
        let bridge = ObservationBridge::new(ctx.platform, liveness.clone(), slot.clone());
        let instance = Self {
            id: next_reporter_id(),
            config,
            liveness,
            slot,
            bridge,
            timers: ctx.timers,
        };
        instance.rebuild_handler();
        instance
    }

    fn rebuild_handler(&self) {
        let gate = self.liveness.clone();
        let callback = Rc::clone(&self.config.on_size_updated);
        let id = self.id;
        let gated: SizeCallback = Rc::new(move |width, height| {
            if gate.is_live() {
                callback(width, height);
            } else {
                trace!(reporter_id = id, width, height, "delivery suppressed, instance not live");
            }
        });
        let handler = make_limiter(
            gated,
            self.config.reporting_mode,
            self.config.timeout,
            Rc::clone(&self.timers),
        );
        let previous = self.slot.install(handler);
        drop(previous);
        debug!(
            reporter_id = self.id,
            mode = %self.config.reporting_mode,
            timeout_ms = u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX),
            "size handler rebuilt"
        );
    }

    fn update(&mut self, props: &Props) -> Result<()> {
        let config = SizeReportConfig::from_props(props)?;
        self.reconfigure(config)
    }

    fn reconfigure(&mut self, config: SizeReportConfig) -> Result<()> {
        config.validate()?;
        let rebuild = !self.config.same_handler_inputs(&config);
        debug!(
            reporter_id = self.id,
            handler_inputs_changed = rebuild,
            "size reporter updated"
        );
        self.config = config;
        if rebuild {
            self.rebuild_handler();
        }
        Ok(())
    }
}

/// A constructed wrapper element that has not been mounted yet.
pub struct SizeReportingElement<P: ResizePlatform> {
    inner: Instance<P>,
}

impl<P: ResizePlatform> fmt::Debug for SizeReportingElement<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SizeReportingElement").field(&self.inner).finish()
    }
}

impl<P: ResizePlatform> SizeReportingElement<P> {
    /// Construct from the embedding context's property bag.
    ///
    /// Configuration errors surface here.
    pub fn new(props: &Props, ctx: HostContext<P>) -> Result<Self> {
        let config = SizeReportConfig::from_props(props)?;
        Self::with_config(config, ctx)
    }

    /// Construct from a configuration built in code.
    pub fn with_config(config: SizeReportConfig, ctx: HostContext<P>) -> Result<Self> {
        config.validate()?;
        let inner = Instance::new(config, ctx);
        debug!(reporter_id = inner.id, "size reporter constructed");
        Ok(Self { inner })
    }

    /// Apply new props. On error nothing changes.
    pub fn update(&mut self, props: &Props) -> Result<()> {
        self.inner.update(props)
    }

    /// Apply a configuration built in code. On error nothing changes.
    pub fn reconfigure(&mut self, config: SizeReportConfig) -> Result<()> {
        self.inner.reconfigure(config)
    }

    /// The rendered element became available: start observing it.
    ///
    /// On failure the instance is torn down and the error returned.
    pub fn mount(self, element: &P::Element) -> Result<MountedSizeReporter<P>> {
        let inner = self.inner;
        inner.liveness.mark_live();
        match inner.bridge.attach(element) {
            Ok(attachment) => {
                debug!(reporter_id = inner.id, "size reporter mounted");
                Ok(MountedSizeReporter {
                    inner,
                    attachment: Some(attachment),
                })
            }
            Err(err) => {
                inner.liveness.kill();
                drop(inner.slot.clear());
                debug!(reporter_id = inner.id, %err, "size reporter mount failed");
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn config(&self) -> &SizeReportConfig {
        &self.inner.config
    }

    /// Attributes to render on the element.
    #[must_use]
    pub fn forwarded_attributes(&self) -> &Props {
        &self.inner.config.passthrough
    }

    #[must_use]
    pub fn effective_style(&self) -> StyleMap {
        self.inner.config.effective_style()
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.inner.liveness.phase()
    }
}

/// A wrapper element whose rendered element is being observed.
///
/// Dropping it unmounts it.
pub struct MountedSizeReporter<P: ResizePlatform> {
    inner: Instance<P>,
    attachment: Option<Attachment<P>>,
}

impl<P: ResizePlatform> fmt::Debug for MountedSizeReporter<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountedSizeReporter")
            .field("inner", &self.inner)
            .field("attachment", &self.attachment)
            .finish()
    }
}

impl<P: ResizePlatform> MountedSizeReporter<P> {
    /// Apply new props without touching the subscription. On error nothing
    /// changes.
    pub fn update(&mut self, props: &Props) -> Result<()> {
        self.inner.update(props)
    }

    /// Apply a configuration built in code. On error nothing changes.
    pub fn reconfigure(&mut self, config: SizeReportConfig) -> Result<()> {
        self.inner.reconfigure(config)
    }

    /// The rendered element was removed.
    pub fn unmount(self) {
        drop(self);
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn config(&self) -> &SizeReportConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn forwarded_attributes(&self) -> &Props {
        &self.inner.config.passthrough
    }

    #[must_use]
    pub fn effective_style(&self) -> StyleMap {
        self.inner.config.effective_style()
    }

    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.inner.liveness.phase()
    }

    /// Whether the element has reported a real (non-registration) size.
    #[must_use]
    pub fn has_laid_out(&self) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|attachment| attachment.gate().has_laid_out())
    }
}

impl<P: ResizePlatform> Drop for MountedSizeReporter<P> {
    fn drop(&mut self) {
        self.inner.liveness.kill();
        drop(self.inner.slot.clear());
        if let Some(attachment) = self.attachment.take() {
            attachment.detach();
        }
        debug!(reporter_id = self.inner.id, "size reporter unmounted");
    }
}
