#![forbid(unsafe_code)]

//! Test harness and reference scenarios for sizereport.
//!
//! Everything here runs on a lab clock and an in-memory platform, so a
//! scenario produces the same deliveries at the same lab times on every
//! run.

pub mod recorder;
pub mod scenario;

pub use recorder::{Delivery, Recorder};
pub use scenario::{ELEMENT, HarnessPhase, PRIMARY, SizeReportHarness, Step};
