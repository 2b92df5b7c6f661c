//! `ResizeObserver`-backed platform.

use std::fmt;

use js_sys::Array;
use sizereport_core::{Result, SizeReportError};
use sizereport_runtime::{RawEventSink, RawResizeEvent, ResizePlatform};
use tracing::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::Closure;
use web_sys::{Element, ResizeObserver, ResizeObserverEntry};

use crate::convert::event_from_rect;

/// Observer listener. Receives the batch of entries for one layout pass.
type Listener = Closure<dyn FnMut(Array)>;

/// One `ResizeObserver` watching one element.
///
/// Owns the listener closure; the observer must be disconnected before the
/// closure is dropped, which [`DomResizePlatform::release`] does.
pub struct DomObservation {
    observer: ResizeObserver,
    _listener: Listener,
}

impl fmt::Debug for DomObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomObservation").finish_non_exhaustive()
    }
}

/// Platform backed by the DOM `ResizeObserver`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomResizePlatform;

impl DomResizePlatform {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ResizePlatform for DomResizePlatform {
    type Element = Element;
    type Handle = DomObservation;

    fn observe(&self, element: &Element, sink: RawEventSink) -> Result<DomObservation> {
        let listener: Listener = Closure::new(move |entries: Array| {
            sink(first_entry_event(&entries));
        });
        let observer = ResizeObserver::new(listener.as_ref().unchecked_ref())
            .map_err(|err| SizeReportError::platform(describe(&err)))?;
        observer.observe(element);
        debug!(tag = %element.tag_name(), "ResizeObserver attached");
        Ok(DomObservation {
            observer,
            _listener: listener,
        })
    }

    fn release(&self, handle: DomObservation) {
        handle.observer.disconnect();
    }
}

/// Each observer watches one element, so only the first entry matters.
fn first_entry_event(entries: &Array) -> RawResizeEvent {
    match entries.get(0).dyn_into::<ResizeObserverEntry>() {
        Ok(entry) => {
            let rect = entry.content_rect();
            event_from_rect(rect.width(), rect.height())
        }
        Err(_) => RawResizeEvent::empty(),
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}
