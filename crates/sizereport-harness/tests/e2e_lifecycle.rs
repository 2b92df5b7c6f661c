//! E2E: lifecycle guarantees of the size reporter.
//!
//! 1. Nothing is delivered before mount completes
//! 2. The registration `{0,0}` sample is suppressed; a later collapse is not
//! 3. Unmount silences in-flight timers and late platform events
//! 4. The subscription is released exactly once
//! 5. Updates rebuild the handler without re-subscribing and never let a
//!    superseded debounce deliver stale arguments; updates that leave the
//!    callback, mode and timeout alone keep the handler's pending state
//! 6. Rejected updates leave the reporter as it was
//! 7. Platform refusal is fatal and logged

#![forbid(unsafe_code)]

use std::io;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use sizereport_core::{Props, SizeReportError};
use sizereport_harness::{HarnessPhase, PRIMARY, SizeReportHarness, Step};
use sizereport_runtime::testing::FakeResizePlatform;

fn props(recorder: &sizereport_harness::Recorder, label: &str, mode: &str, timeout_ms: u32) -> Props {
    Props::new()
        .with("onSizeUpdated", recorder.prop(label))
        .with("reportingMode", mode)
        .with("timeoutMs", timeout_ms)
}

// ── Mount ───────────────────────────────────────────────────────────────

#[test]
fn nothing_is_delivered_before_mount() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.resize(10.0, 10.0);
    h.advance_ms(1_000);
    assert!(h.recorder().is_empty());
    assert_eq!(h.platform().observe_calls(), 0);

    h.mount().expect("mounts");
    h.resize(11.0, 11.0);
    assert_eq!(h.timeline(), vec![(1_000, 11.0, 11.0)]);
}

#[test]
fn registration_sample_is_suppressed() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.mount().expect("mounts");
    assert_eq!(h.platform().queued(), 1);
    assert_eq!(h.flush(), 1);
    assert!(h.recorder().is_empty());
}

#[test]
fn collapse_to_zero_after_layout_is_forwarded() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(40.0, 30.0);
    h.resize(0.0, 0.0);
    assert_eq!(h.timeline(), vec![(0, 40.0, 30.0), (0, 0.0, 0.0)]);
}

#[test]
fn shrink_to_zero_on_one_axis_is_forwarded() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(0.0, 12.0);
    assert_eq!(h.timeline(), vec![(0, 0.0, 12.0)]);
}

#[test]
fn events_without_content_box_are_ignored() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.empty_event();
    h.resize(1.0, 2.0);
    assert_eq!(h.timeline(), vec![(0, 1.0, 2.0)]);
}

#[test]
fn refused_observation_is_fatal_and_logged() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .finish();

    let (err, phase, active) = tracing::subscriber::with_default(subscriber, || {
        let mut h = SizeReportHarness::from_props_on(
            FakeResizePlatform::refusing("ResizeObserver is not defined"),
            |r| props(r, PRIMARY, "immediate", 0),
        )
        .expect("valid");
        let err = h.mount().unwrap_err();
        (err, h.phase(), h.platform().active_observations())
    });

    assert_eq!(err, SizeReportError::platform("ResizeObserver is not defined"));
    assert_eq!(phase, HarnessPhase::Unmounted);
    assert_eq!(active, 0);
    let out = capture.text();
    assert!(out.contains("WARN"), "{out}");
    assert!(out.contains("ResizeObserver is not defined"), "{out}");
}

// ── Unmount ─────────────────────────────────────────────────────────────

#[test]
fn unmount_releases_exactly_once() {
    let mut h = SizeReportHarness::new("throttle", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.unmount();
    h.unmount();
    assert_eq!(h.platform().observe_calls(), 1);
    assert_eq!(h.platform().release_calls(), 1);
    assert_eq!(h.platform().active_observations(), 0);
}

#[test]
fn pending_debounce_never_fires_after_unmount() {
    let mut h = SizeReportHarness::new("debounce", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(10.0, 20.0);
    h.advance_to(60);
    h.unmount();

    assert_eq!(h.timers().pending(), 0);
    h.advance_to(1_000);
    assert!(h.recorder().is_empty());
}

#[test]
fn cooling_throttle_is_cleared_on_unmount() {
    let mut h = SizeReportHarness::new("throttle", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(10.0, 20.0);
    assert_eq!(h.timers().pending(), 1);
    h.unmount();
    assert_eq!(h.timers().pending(), 0);
    assert_eq!(h.timeline(), vec![(0, 10.0, 20.0)]);
}

#[test]
fn late_platform_event_after_unmount_is_dropped() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.queue_resize(50.0, 60.0);
    h.unmount();
    assert_eq!(h.flush(), 1);
    assert!(h.recorder().is_empty());
}

#[test]
fn unmount_before_mount_never_subscribes() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.unmount();
    h.mount().expect("ignored after teardown");
    assert_eq!(h.phase(), HarnessPhase::Unmounted);
    assert_eq!(h.platform().observe_calls(), 0);
}

// ── Update ──────────────────────────────────────────────────────────────

#[test]
fn update_during_pending_debounce_drops_stale_sample() {
    let mut h = SizeReportHarness::new("debounce", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(10.0, 20.0);
    h.advance_to(50);

    h.update_with(|r| props(r, "second", "debounce", 100)).expect("valid update");
    h.advance_to(500);
    assert!(h.recorder().is_empty(), "{}", h.recorder().to_jsonl());

    h.resize(11.0, 21.0);
    h.advance_to(600);
    assert_eq!(h.recorder().for_label("second"), vec![(600, 11.0, 21.0)]);
    assert!(h.recorder().for_label(PRIMARY).is_empty());
}

#[test]
fn update_switches_policy_without_resubscribing() {
    let mut h = SizeReportHarness::new("throttle", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(1.0, 1.0);
    h.resize(2.0, 2.0);

    h.update_with(|r| props(r, PRIMARY, "immediate", 0)).expect("valid update");
    h.resize(3.0, 3.0);
    h.resize(4.0, 4.0);

    assert_eq!(h.timeline(), vec![(0, 1.0, 1.0), (0, 3.0, 3.0), (0, 4.0, 4.0)]);
    assert_eq!(h.platform().observe_calls(), 1);
    assert_eq!(h.platform().release_calls(), 0);
    assert_eq!(h.timers().pending(), 0);
}

#[test]
fn attribute_only_update_keeps_pending_debounce() {
    let mut h = SizeReportHarness::new("debounce", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(10.0, 20.0);
    h.advance_to(50);

    h.update_keeping_callback(
        Props::new()
            .with("reportingMode", "debounce")
            .with("timeoutMs", 100)
            .with("className", "wide"),
    )
    .expect("valid update");
    assert_eq!(h.timers().pending(), 1);

    h.advance_to(550);
    assert_eq!(h.timeline(), vec![(100, 10.0, 20.0)]);
    assert_eq!(h.forwarded_attributes(), Some(Props::new().with("className", "wide")));
}

#[test]
fn attribute_only_update_keeps_throttle_window_closed() {
    let mut h = SizeReportHarness::new("throttle", 100).expect("valid");
    h.mount_and_flush().expect("mounts");
    h.resize(10.0, 20.0);
    h.advance_to(10);

    h.update_keeping_callback(
        Props::new()
            .with("reportingMode", "throttle")
            .with("timeoutMs", 100)
            .with("className", "wide"),
    )
    .expect("valid update");
    h.advance_to(20);
    h.resize(11.0, 21.0);
    h.advance_to(100);
    h.resize(12.0, 22.0);

    assert_eq!(h.timeline(), vec![(0, 10.0, 20.0), (100, 12.0, 22.0)]);
}

#[test]
fn rejected_update_keeps_previous_handler() {
    let mut h = SizeReportHarness::new("immediate", 0).expect("valid");
    h.mount_and_flush().expect("mounts");

    let err = h
        .update_with(|r| props(r, "second", "throttle", 0).with("timeoutMs", "later"))
        .unwrap_err();
    assert!(matches!(err, SizeReportError::Configuration { key: "timeoutMs", .. }));

    h.resize(5.0, 5.0);
    assert_eq!(h.recorder().for_label(PRIMARY), vec![(0, 5.0, 5.0)]);
    assert!(h.recorder().for_label("second").is_empty());
}

#[test]
fn forwarded_attributes_track_updates() {
    let mut h = SizeReportHarness::from_props(|r| {
        props(r, PRIMARY, "immediate", 0).with("id", "panel").with("title", "one")
    })
    .expect("valid");
    assert_eq!(
        h.forwarded_attributes(),
        Some(Props::new().with("id", "panel").with("title", "one"))
    );

    h.mount().expect("mounts");
    h.update_with(|r| props(r, PRIMARY, "immediate", 0).with("title", "two"))
        .expect("valid update");
    assert_eq!(h.forwarded_attributes(), Some(Props::new().with("title", "two")));

    h.unmount();
    assert_eq!(h.forwarded_attributes(), None);
}

#[test]
fn scripted_timeline_matches_expected_deliveries() {
    let mut h = SizeReportHarness::new("throttle", 100).expect("valid");
    h.run(&[
        Step::Resize { width: 1.0, height: 1.0 },
        Step::Mount,
        Step::Flush,
        Step::Resize { width: 10.0, height: 20.0 },
        Step::Advance { ms: 30 },
        Step::Resize { width: 11.0, height: 21.0 },
        Step::Advance { ms: 120 },
        Step::Resize { width: 12.0, height: 22.0 },
        Step::QueueResize { width: 13.0, height: 23.0 },
        Step::Unmount,
        Step::Flush,
        Step::Advance { ms: 500 },
    ])
    .expect("script runs");
    assert_eq!(h.timeline(), vec![(0, 10.0, 20.0), (150, 12.0, 22.0)]);
}

// ── Log capture ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("capture lock")).into_owned()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
