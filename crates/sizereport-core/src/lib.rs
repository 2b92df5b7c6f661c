#![forbid(unsafe_code)]

//! Core: size samples, time, property bags, configuration, and rate limiting.

pub mod attrs;
pub mod clock;
pub mod config;
pub mod error;
pub mod limiter;
pub mod props;
pub mod sample;
pub mod timer;

pub use config::SizeReportConfig;
pub use error::{Result, SizeReportError};
pub use limiter::{LimitedHandler, ReportingMode, SizeCallback, make_limiter};
pub use props::{PropValue, Props};
pub use sample::SizeSample;
pub use timer::{TimerHost, TimerId, TimerQueue};
