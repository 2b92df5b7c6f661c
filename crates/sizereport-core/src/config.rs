#![forbid(unsafe_code)]

//! Wrapper configuration.
//!
//! A [`SizeReportConfig`] is either decoded from the property bag the
//! embedding context passes in ([`SizeReportConfig::from_props`]) or built
//! in code ([`SizeReportConfig::builder`]).
//!
//! | Prop            | Default   | Rejected with a configuration error     |
//! |-----------------|-----------|-----------------------------------------|
//! | `onSizeUpdated` | no-op     | anything but a callback or null         |
//! | `reportingMode` | throttle  | never (unknown values warn, then throttle) |
//! | `timeoutMs`     | 250       | non-integral or negative, when rate limited |
//! | `style`         | empty     | anything but an object or null          |

use std::fmt;
use std::rc::Rc;

use tracing::warn;
use web_time::Duration;

use crate::attrs::{forwarded_attributes, keys};
use crate::error::{Result, SizeReportError};
use crate::limiter::{ReportingMode, SizeCallback};
use crate::props::{PropValue, Props};

/// Timeout used when `timeoutMs` is absent.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(250);

/// Style declarations keyed by property name.
pub type StyleMap = serde_json::Map<String, serde_json::Value>;

/// Configuration of one wrapper element.
#[derive(Clone)]
pub struct SizeReportConfig {
    pub on_size_updated: SizeCallback,
    pub reporting_mode: ReportingMode,
    /// Debounce quiet period or throttle window.
    pub timeout: Duration,
    pub style: Rc<StyleMap>,
    /// Everything that is not configuration.
    pub passthrough: Props,
}

impl fmt::Debug for SizeReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizeReportConfig")
            .field("reporting_mode", &self.reporting_mode)
            .field("timeout", &self.timeout)
            .field("style", &self.style)
            .field("passthrough", &self.passthrough)
            .finish_non_exhaustive()
    }
}

impl Default for SizeReportConfig {
    fn default() -> Self {
        Self {
            on_size_updated: noop_callback(),
            reporting_mode: ReportingMode::default(),
            timeout: DEFAULT_TIMEOUT,
            style: Rc::new(StyleMap::new()),
            passthrough: Props::new(),
        }
    }
}

fn noop_callback() -> SizeCallback {
    Rc::new(|_, _| {})
}

impl SizeReportConfig {
    #[must_use]
    pub fn builder() -> SizeReportConfigBuilder {
        SizeReportConfigBuilder::default()
    }

    /// Decode and validate a property bag.
    pub fn from_props(props: &Props) -> Result<Self> {
        let on_size_updated = match props.get(keys::ON_SIZE_UPDATED) {
            None | Some(PropValue::Null) => noop_callback(),
            Some(PropValue::Callback(cb)) => Rc::clone(cb),
            Some(other) => {
                return Err(SizeReportError::configuration(
                    keys::ON_SIZE_UPDATED,
                    format!("expected a callback, got {}", other.type_name()),
                ));
            }
        };

        let reporting_mode = match props.get(keys::REPORTING_MODE) {
            None => ReportingMode::default(),
            Some(PropValue::Text(raw)) => ReportingMode::parse_lenient(raw),
            Some(other) => {
                warn!(
                    kind = other.type_name(),
                    "reportingMode invalid, falling back to throttle"
                );
                ReportingMode::Throttle
            }
        };

        let timeout = decode_timeout(props.get(keys::TIMEOUT_MS), reporting_mode)?;

        let style = match props.get(keys::STYLE) {
            None | Some(PropValue::Null) => Rc::new(StyleMap::new()),
            Some(PropValue::Json(value)) => match value.as_object() {
                Some(map) => Rc::new(map.clone()),
                None => return Err(style_error(value)),
            },
            Some(other) => {
                return Err(SizeReportError::configuration(
                    keys::STYLE,
                    format!("expected an object, got {}", other.type_name()),
                ));
            }
        };

        Ok(Self {
            on_size_updated,
            reporting_mode,
            timeout,
            style,
            passthrough: forwarded_attributes(props),
        })
    }

    /// Style applied to the rendered element: the overrides with
    /// `flex: 1 0 auto` forced so the wrapper fills its flex container.
    #[must_use]
    pub fn effective_style(&self) -> StyleMap {
        let mut style = (*self.style).clone();
        style.insert("flex".into(), serde_json::Value::from("1 0 auto"));
        style
    }

    /// Check invariants `from_props` enforces on a configuration built in
    /// code: a rate-limited timeout must be a whole number of milliseconds.
    pub fn validate(&self) -> Result<()> {
        if self.reporting_mode.is_rate_limited() && self.timeout.subsec_nanos() % 1_000_000 != 0 {
            return Err(SizeReportError::configuration(
                keys::TIMEOUT_MS,
                format!("expected whole milliseconds, got {:?}", self.timeout),
            ));
        }
        Ok(())
    }

    /// Whether `other` would produce an equivalent rate-limited handler.
    #[must_use]
    pub fn same_handler_inputs(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.on_size_updated, &other.on_size_updated)
            && self.reporting_mode == other.reporting_mode
            && (self.timeout == other.timeout || !self.reporting_mode.is_rate_limited())
    }
}

fn decode_timeout(value: Option<&PropValue>, mode: ReportingMode) -> Result<Duration> {
    let parsed = match value {
        None | Some(PropValue::Null) => Ok(DEFAULT_TIMEOUT),
        Some(PropValue::Number(n)) if n.is_finite() && *n >= 0.0 && n.fract() == 0.0 => {
            Ok(Duration::from_millis(*n as u64))
        }
        Some(PropValue::Number(n)) => Err(format!("expected a non-negative integer, got {n}")),
        Some(other) => Err(format!(
            "expected a non-negative integer, got {}",
            other.type_name()
        )),
    };
    match parsed {
        Ok(timeout) => Ok(timeout),
        // Immediate reporting never waits, so the value is irrelevant.
        Err(_) if !mode.is_rate_limited() => Ok(DEFAULT_TIMEOUT),
        Err(reason) => Err(SizeReportError::configuration(keys::TIMEOUT_MS, reason)),
    }
}

fn style_error(value: &serde_json::Value) -> SizeReportError {
    let kind = if value.is_array() { "array" } else { "json" };
    SizeReportError::configuration(keys::STYLE, format!("expected an object, got {kind}"))
}

/// Builder for configurations assembled in code.
#[derive(Debug, Default)]
pub struct SizeReportConfigBuilder {
    config: SizeReportConfig,
}

impl SizeReportConfigBuilder {
    #[must_use]
    pub fn on_size_updated(mut self, f: impl Fn(f64, f64) + 'static) -> Self {
        self.config.on_size_updated = Rc::new(f);
        self
    }

    #[must_use]
    pub fn callback(mut self, cb: SizeCallback) -> Self {
        self.config.on_size_updated = cb;
        self
    }

    #[must_use]
    pub fn reporting_mode(mut self, mode: ReportingMode) -> Self {
        self.config.reporting_mode = mode;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    #[must_use]
    pub fn timeout_ms(self, ms: u64) -> Self {
        self.timeout(Duration::from_millis(ms))
    }

    #[must_use]
    pub fn style(mut self, style: StyleMap) -> Self {
        self.config.style = Rc::new(style);
        self
    }

    /// Add an attribute forwarded to the rendered element.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.config.passthrough.insert(key, value);
        self
    }

    #[must_use]
    pub fn build(self) -> SizeReportConfig {
        self.config
    }
}
