#![forbid(unsafe_code)]

//! Binds one rendered element to one platform subscription.
//!
//! # Forwarding rule
//!
//! A raw event reaches the active handler iff
//!
//! 1. the instance is live,
//! 2. a handler is installed,
//! 3. the event carries a content box, and
//! 4. the content box is not the `{0, 0}` sample hosts emit on registration
//!    before the first layout pass.
//!
//! Rule 4 only applies until the element has reported a non-degenerate
//! size. After that a `{0, 0}` sample means the element collapsed, and it is
//! forwarded like any other.
//!
//! Events are forwarded synchronously, in the order the host delivers them.
//!
//! # Release
//!
//! [`Attachment`] owns the platform handle. [`Attachment::detach`] consumes
//! it and dropping it releases it, so the handle reaches
//! [`ResizePlatform::release`] exactly once.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use sizereport_core::Result;
use tracing::{debug, trace, warn};

use crate::platform::{RawEventSink, RawResizeEvent, ResizePlatform};
use crate::slot::{HandlerSlot, Liveness};

/// Outcome of offering one raw event to the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardDecision {
    Forwarded,
    NotLive,
    NoHandler,
    NoContentBox,
    Degenerate,
}

/// Liveness and validity filter between the platform and the handler slot.
#[derive(Debug)]
pub struct ForwardGate {
    liveness: Liveness,
    slot: HandlerSlot,
    laid_out: Cell<bool>,
}

impl ForwardGate {
    #[must_use]
    pub fn new(liveness: Liveness, slot: HandlerSlot) -> Self {
        Self {
            liveness,
            slot,
            laid_out: Cell::new(false),
        }
    }

    /// Apply the forwarding rule to one host notification.
    pub fn on_raw_event(&self, event: RawResizeEvent) -> ForwardDecision {
        let decision = self.decide(event);
        trace!(?event, ?decision, "raw size event");
        decision
    }

    fn decide(&self, event: RawResizeEvent) -> ForwardDecision {
        let Some(sample) = event.content_box else {
            return ForwardDecision::NoContentBox;
        };
        let first_layout = !self.laid_out.get();
        if !sample.is_degenerate() {
            self.laid_out.set(true);
        }
        if !self.liveness.is_live() {
            return ForwardDecision::NotLive;
        }
        let Some(handler) = self.slot.current() else {
            return ForwardDecision::NoHandler;
        };
        if sample.is_degenerate() && first_layout {
            return ForwardDecision::Degenerate;
        }
        handler.call(sample);
        ForwardDecision::Forwarded
    }

    /// Whether the element has reported a non-degenerate size.
    #[must_use]
    pub fn has_laid_out(&self) -> bool {
        self.laid_out.get()
    }
}

/// Attaches elements of one instance to the platform.
pub struct ObservationBridge<P: ResizePlatform> {
    platform: Rc<P>,
    liveness: Liveness,
    slot: HandlerSlot,
}

impl<P: ResizePlatform> fmt::Debug for ObservationBridge<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservationBridge")
            .field("liveness", &self.liveness.phase())
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}

impl<P: ResizePlatform> ObservationBridge<P> {
    #[must_use]
    pub fn new(platform: Rc<P>, liveness: Liveness, slot: HandlerSlot) -> Self {
        Self {
            platform,
            liveness,
            slot,
        }
    }

    /// Register `element` with the platform.
    pub fn attach(&self, element: &P::Element) -> Result<Attachment<P>> {
        let gate = Rc::new(ForwardGate::new(self.liveness.clone(), self.slot.clone()));
        let sink_gate = Rc::clone(&gate);
        let sink: RawEventSink = Rc::new(move |event| {
            sink_gate.on_raw_event(event);
        });
        let handle = self.platform.observe(element, sink).inspect_err(|err| {
            warn!(%err, "size observation could not be attached");
        })?;
        debug!("size observation attached");
        Ok(Attachment {
            platform: Rc::clone(&self.platform),
            handle: Some(handle),
            gate,
        })
    }
}

/// A live platform subscription.
pub struct Attachment<P: ResizePlatform> {
    platform: Rc<P>,
    handle: Option<P::Handle>,
    gate: Rc<ForwardGate>,
}

impl<P: ResizePlatform> fmt::Debug for Attachment<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("attached", &self.handle.is_some())
            .field("gate", &self.gate)
            .finish()
    }
}

impl<P: ResizePlatform> Attachment<P> {
    /// The filter events pass through before reaching the handler.
    #[must_use]
    pub fn gate(&self) -> &ForwardGate {
        &self.gate
    }

    /// Release the subscription.
    pub fn detach(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.platform.release(handle);
            debug!("size observation released");
        }
    }
}

impl<P: ResizePlatform> Drop for Attachment<P> {
    fn drop(&mut self) {
        self.release();
    }
}
