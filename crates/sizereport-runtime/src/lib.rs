#![forbid(unsafe_code)]

//! Runtime: binds a configured size reporter to a host's layout observer
//! and drives it through mount, update, and unmount.

pub mod bridge;
pub mod controller;
pub mod platform;
pub mod slot;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use bridge::{Attachment, ForwardDecision, ForwardGate, ObservationBridge};
pub use controller::{HostContext, MountedSizeReporter, SizeReportingElement};
pub use platform::{RawEventSink, RawResizeEvent, ResizePlatform};
pub use slot::{HandlerSlot, LifecyclePhase, Liveness};
