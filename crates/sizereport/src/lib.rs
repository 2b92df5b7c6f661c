#![forbid(unsafe_code)]

//! sizereport public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.
//!
//! ```
//! use sizereport::prelude::*;
//!
//! let props = Props::new()
//!     .with("reportingMode", "debounce")
//!     .with("timeoutMs", 100)
//!     .with("id", "sidebar");
//! let config = SizeReportConfig::from_props(&props).expect("valid props");
//! assert_eq!(config.reporting_mode, ReportingMode::Debounce);
//! assert_eq!(config.passthrough, Props::new().with("id", "sidebar"));
//! ```

pub use sizereport_core::{
    Props, PropValue, ReportingMode, Result, SizeReportConfig, SizeReportError, SizeSample,
};
#[cfg(feature = "runtime")]
pub use sizereport_runtime::{HostContext, MountedSizeReporter, ResizePlatform, SizeReportingElement};

pub mod prelude {
    pub use sizereport_core as core;
    #[cfg(feature = "runtime")]
    pub use sizereport_runtime as runtime;
    #[cfg(feature = "web")]
    pub use sizereport_web as web;

    pub use sizereport_core::{Props, PropValue, ReportingMode, SizeReportConfig, SizeReportError};
    #[cfg(feature = "runtime")]
    pub use sizereport_runtime::{HostContext, MountedSizeReporter, SizeReportingElement};
}
