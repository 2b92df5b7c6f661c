//! Value conversions between DOM and runtime types.

use sizereport_runtime::RawResizeEvent;
use web_time::Duration;

/// Largest delay `setTimeout` honours. Larger values overflow a signed
/// 32-bit integer in every engine and fire immediately.
pub const MAX_TIMEOUT_MS: i32 = i32::MAX;

/// Event for a `contentRect` reading. Non-finite extents mean the entry had
/// no usable box.
#[must_use]
pub fn event_from_rect(width: f64, height: f64) -> RawResizeEvent {
    if width.is_finite() && height.is_finite() {
        RawResizeEvent::sample(width, height)
    } else {
        RawResizeEvent::empty()
    }
}

/// Delay argument for `setTimeout`, saturating at [`MAX_TIMEOUT_MS`].
#[must_use]
pub fn timeout_millis(delay: Duration) -> i32 {
    i32::try_from(delay.as_millis()).unwrap_or(MAX_TIMEOUT_MS)
}
