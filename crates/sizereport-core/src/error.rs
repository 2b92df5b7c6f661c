#![forbid(unsafe_code)]

//! Error taxonomy shared by every sizereport crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SizeReportError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeReportError {
    /// A reserved prop carried a value that cannot be used. Fatal for the
    /// construction or update that produced it.
    #[error("invalid `{key}` prop: {reason}")]
    Configuration { key: &'static str, reason: String },

    /// Strict parsing rejected a reporting mode. The lenient path logs this
    /// and falls back to throttling instead.
    #[error("unrecognized reporting mode: {value:?}")]
    UnrecognizedMode { value: String },

    /// The host could not create its size-observation primitive.
    #[error("size observation unavailable: {reason}")]
    PlatformUnavailable { reason: String },
}

impl SizeReportError {
    #[must_use]
    pub fn configuration(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            key,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn platform(reason: impl Into<String>) -> Self {
        Self::PlatformUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether the error leaves the instance unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnrecognizedMode { .. })
    }
}
