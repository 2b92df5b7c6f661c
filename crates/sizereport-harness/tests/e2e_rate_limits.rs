//! E2E: rate-limiting policies observed through the full pipeline.
//!
//! Every scenario mounts a reporter on the fake platform, delivers the
//! registration notification, then drives resizes and lab time. Assertions
//! are on what the caller's callback saw and when.
//!
//! 1. Immediate delivers every sample in order
//! 2. Debounce delivers only the last sample of a burst, after the quiet period
//! 3. Throttle delivers the first sample of each window and drops the rest
//! 4. Unrecognised modes fall back to throttle
//! 5. Timeout is ignored for immediate and defaults to 250 ms otherwise

#![forbid(unsafe_code)]

use pretty_assertions::assert_eq;
use sizereport_core::{Props, ReportingMode};
use sizereport_harness::{PRIMARY, SizeReportHarness};

fn mounted(mode: &str, timeout_ms: u64) -> SizeReportHarness {
    let mut h = SizeReportHarness::new(mode, timeout_ms).expect("valid props");
    h.mount_and_flush().expect("fake platform observes");
    h
}

// ── Immediate ───────────────────────────────────────────────────────────

#[test]
fn immediate_delivers_every_sample_in_order() {
    let h = mounted("immediate", 0);
    h.resize(10.0, 20.0);
    h.resize(11.0, 21.0);
    h.resize(12.0, 22.0);
    assert_eq!(
        h.timeline(),
        vec![(0, 10.0, 20.0), (0, 11.0, 21.0), (0, 12.0, 22.0)]
    );
}

#[test]
fn immediate_never_touches_timers() {
    let h = mounted("immediate", 100);
    for i in 0..20 {
        h.resize(f64::from(i), 1.0);
    }
    assert_eq!(h.timers().pending(), 0);
    assert_eq!(h.recorder().len(), 20);
}

#[test]
fn none_is_an_alias_for_immediate() {
    let h = mounted("none", 0);
    h.resize(3.0, 3.0);
    assert_eq!(h.timeline(), vec![(0, 3.0, 3.0)]);
}

// ── Debounce ────────────────────────────────────────────────────────────

#[test]
fn debounce_delivers_last_sample_after_quiet_period() {
    let h = mounted("debounce", 100);
    h.resize(10.0, 20.0);
    h.advance_to(50);
    h.resize(11.0, 21.0);

    h.advance_to(149);
    assert!(h.recorder().is_empty(), "nothing before t=150");

    h.advance_to(150);
    assert_eq!(h.timeline(), vec![(150, 11.0, 21.0)]);

    h.advance_to(1_000);
    assert_eq!(h.recorder().len(), 1);
}

#[test]
fn debounce_starves_while_events_keep_arriving() {
    let h = mounted("debounce", 100);
    for step in 0..50u32 {
        h.resize(f64::from(step), 1.0);
        h.advance_ms(60);
    }
    assert!(h.recorder().is_empty());

    h.advance_ms(40);
    assert_eq!(h.timeline(), vec![(3_040, 49.0, 1.0)]);
}

#[test]
fn debounce_separated_bursts_each_deliver() {
    let h = mounted("debounce", 100);
    h.resize(1.0, 1.0);
    h.advance_to(200);
    h.resize(2.0, 2.0);
    h.advance_to(400);
    assert_eq!(h.timeline(), vec![(100, 1.0, 1.0), (300, 2.0, 2.0)]);
}

// ── Throttle ────────────────────────────────────────────────────────────

#[test]
fn throttle_delivers_first_sample_of_each_window() {
    let h = mounted("throttle", 100);
    h.resize(10.0, 20.0);
    h.advance_to(30);
    h.resize(11.0, 21.0);
    h.advance_to(150);
    h.resize(12.0, 22.0);
    assert_eq!(h.timeline(), vec![(0, 10.0, 20.0), (150, 12.0, 22.0)]);
}

#[test]
fn throttle_does_not_buffer_dropped_samples() {
    let h = mounted("throttle", 100);
    h.resize(1.0, 1.0);
    h.advance_to(10);
    h.resize(2.0, 2.0);
    h.advance_to(500);
    assert_eq!(h.timeline(), vec![(0, 1.0, 1.0)]);
}

#[test]
fn throttle_window_reopens_exactly_at_timeout() {
    let h = mounted("throttle", 100);
    h.resize(1.0, 1.0);
    h.advance_to(99);
    h.resize(2.0, 2.0);
    h.advance_to(100);
    h.resize(3.0, 3.0);
    assert_eq!(h.timeline(), vec![(0, 1.0, 1.0), (100, 3.0, 3.0)]);
}

// ── Mode and timeout decoding ───────────────────────────────────────────

#[test]
fn unrecognised_mode_falls_back_to_throttle() {
    let h = mounted("sometimes", 100);
    h.resize(1.0, 1.0);
    h.advance_to(50);
    h.resize(2.0, 2.0);
    assert_eq!(h.timeline(), vec![(0, 1.0, 1.0)]);
}

#[test]
fn missing_mode_and_timeout_default_to_throttle_250() {
    let mut h = SizeReportHarness::from_props(|r| Props::new().with("onSizeUpdated", r.prop(PRIMARY)))
        .expect("valid props");
    h.mount_and_flush().expect("mounts");

    h.resize(1.0, 1.0);
    h.advance_to(249);
    h.resize(2.0, 2.0);
    h.advance_to(250);
    h.resize(3.0, 3.0);
    assert_eq!(h.timeline(), vec![(0, 1.0, 1.0), (250, 3.0, 3.0)]);
}

#[test]
fn immediate_ignores_invalid_timeout() {
    let mut h = SizeReportHarness::from_props(|r| {
        Props::new()
            .with("onSizeUpdated", r.prop(PRIMARY))
            .with("reportingMode", "immediate")
            .with("timeoutMs", "soon")
    })
    .expect("timeout irrelevant for immediate");
    h.mount_and_flush().expect("mounts");
    h.resize(4.0, 4.0);
    assert_eq!(h.timeline(), vec![(0, 4.0, 4.0)]);
}

#[test]
fn rate_limited_mode_rejects_invalid_timeout() {
    for bad in [Props::new().with("timeoutMs", -1), Props::new().with("timeoutMs", 2.5)] {
        let props = bad.with("reportingMode", "debounce");
        let err = SizeReportHarness::from_props(|_| props).unwrap_err();
        assert!(err.to_string().starts_with("invalid `timeoutMs` prop"), "{err}");
    }
}

#[test]
fn strict_parsing_is_available_to_callers() {
    assert_eq!("debounce".parse::<ReportingMode>(), Ok(ReportingMode::Debounce));
    assert!("sometimes".parse::<ReportingMode>().is_err());
}
