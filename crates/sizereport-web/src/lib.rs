#![forbid(unsafe_code)]

//! Browser host for sizereport.
//!
//! On `wasm32` this crate provides [`DomResizePlatform`], backed by the DOM
//! `ResizeObserver`, and [`WindowTimers`], backed by `window.setTimeout`.
//! The conversions they share are plain functions and build everywhere.

mod convert;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod timers;

pub use convert::{MAX_TIMEOUT_MS, event_from_rect, timeout_millis};
#[cfg(target_arch = "wasm32")]
pub use dom::{DomObservation, DomResizePlatform};
#[cfg(target_arch = "wasm32")]
pub use timers::WindowTimers;

/// Host services for the current browser window.
#[cfg(target_arch = "wasm32")]
pub fn host_context() -> sizereport_core::Result<sizereport_runtime::HostContext<DomResizePlatform>> {
    use std::rc::Rc;
    let timers = Rc::new(WindowTimers::new()?);
    Ok(sizereport_runtime::HostContext::new(Rc::new(DomResizePlatform::new()), timers))
}
