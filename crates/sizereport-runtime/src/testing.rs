#![forbid(unsafe_code)]

//! In-memory [`ResizePlatform`] for deterministic tests.
//!
//! Like a browser `ResizeObserver`, a fresh observation reports the element
//! once before layout, with an all-zero content box. That report and any
//! event sent with [`FakeResizePlatform::queue`] are held until
//! [`FakeResizePlatform::flush`], which models the host delivering
//! notifications asynchronously, batched per layout pass.
//!
//! Queued events keep the sink they were addressed to, so flushing after a
//! release still reaches the (now dead) instance. That is the race the
//! liveness gate exists for.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use sizereport_core::{Result, SizeReportError, SizeSample};

use crate::platform::{RawEventSink, RawResizeEvent, ResizePlatform};

/// An element known to the fake platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FakeElement(pub u32);

/// Subscription handle. Deliberately neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
pub struct FakeHandle {
    id: u64,
    element: FakeElement,
}

impl FakeHandle {
    #[must_use]
    pub fn element(&self) -> FakeElement {
        self.element
    }
}

#[derive(Default)]
struct FakeInner {
    next_handle: u64,
    active: BTreeMap<u64, (FakeElement, RawEventSink)>,
    queued: VecDeque<(RawEventSink, RawResizeEvent)>,
    observe_calls: usize,
    release_calls: usize,
}

/// Deterministic platform double.
pub struct FakeResizePlatform {
    inner: RefCell<FakeInner>,
    refusal: Option<String>,
    initial_report: bool,
}

impl fmt::Debug for FakeResizePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FakeResizePlatform")
            .field("active", &inner.active.len())
            .field("queued", &inner.queued.len())
            .field("observe_calls", &inner.observe_calls)
            .field("release_calls", &inner.release_calls)
            .field("refusal", &self.refusal)
            .finish()
    }
}

impl Default for FakeResizePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeResizePlatform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(FakeInner::default()),
            refusal: None,
            initial_report: true,
        }
    }

    /// A platform whose observer cannot be created.
    #[must_use]
    pub fn refusing(reason: impl Into<String>) -> Self {
        Self {
            refusal: Some(reason.into()),
            ..Self::new()
        }
    }

    /// Skip the pre-layout `{0, 0}` report on registration.
    #[must_use]
    pub fn without_initial_report(mut self) -> Self {
        self.initial_report = false;
        self
    }

    /// Deliver a sample to every observer of `element` right now.
    pub fn emit(&self, element: FakeElement, sample: SizeSample) {
        self.emit_raw(element, RawResizeEvent::from(sample));
    }

    /// Deliver a raw event to every observer of `element` right now.
    pub fn emit_raw(&self, element: FakeElement, event: RawResizeEvent) {
        for sink in self.sinks_for(element) {
            sink(event);
        }
    }

    /// Address a sample to the current observers of `element`, delivered on
    /// the next [`flush`](Self::flush).
    pub fn queue(&self, element: FakeElement, sample: SizeSample) {
        let sinks = self.sinks_for(element);
        let mut inner = self.inner.borrow_mut();
        for sink in sinks {
            inner.queued.push_back((sink, RawResizeEvent::from(sample)));
        }
    }

    /// Deliver queued events in order. Returns how many were delivered.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = self.inner.borrow_mut().queued.pop_front();
            let Some((sink, event)) = next else {
                return delivered;
            };
            sink(event);
            delivered += 1;
        }
    }

    #[must_use]
    pub fn observe_calls(&self) -> usize {
        self.inner.borrow().observe_calls
    }

    #[must_use]
    pub fn release_calls(&self) -> usize {
        self.inner.borrow().release_calls
    }

    #[must_use]
    pub fn active_observations(&self) -> usize {
        self.inner.borrow().active.len()
    }

    #[must_use]
    pub fn is_observing(&self, element: FakeElement) -> bool {
        self.inner
            .borrow()
            .active
            .values()
            .any(|(observed, _)| *observed == element)
    }

    #[must_use]
    pub fn queued(&self) -> usize {
        self.inner.borrow().queued.len()
    }

    fn sinks_for(&self, element: FakeElement) -> Vec<RawEventSink> {
        self.inner
            .borrow()
            .active
            .values()
            .filter(|(observed, _)| *observed == element)
            .map(|(_, sink)| Rc::clone(sink))
            .collect()
    }
}

impl ResizePlatform for FakeResizePlatform {
    type Element = FakeElement;
    type Handle = FakeHandle;

    fn observe(&self, element: &FakeElement, sink: RawEventSink) -> Result<FakeHandle> {
        let mut inner = self.inner.borrow_mut();
        inner.observe_calls += 1;
        if let Some(reason) = &self.refusal {
            return Err(SizeReportError::platform(reason.clone()));
        }
        let id = inner.next_handle;
        inner.next_handle += 1;
        if self.initial_report {
            inner
                .queued
                .push_back((Rc::clone(&sink), RawResizeEvent::sample(0.0, 0.0)));
        }
        inner.active.insert(id, (*element, sink));
        Ok(FakeHandle {
            id,
            element: *element,
        })
    }

    fn release(&self, handle: FakeHandle) {
        let mut inner = self.inner.borrow_mut();
        inner.release_calls += 1;
        let removed = inner.active.remove(&handle.id);
        debug_assert!(removed.is_some(), "released unknown handle {handle:?}");
    }
}
