#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sizereport_core::Props;
use sizereport_harness::{HarnessPhase, PRIMARY, SizeReportHarness};

#[derive(Arbitrary, Debug, Clone, Copy)]
enum FuzzMode {
    Immediate,
    Debounce,
    Throttle,
    Unknown,
}

impl FuzzMode {
    fn as_str(self) -> &'static str {
        match self {
            FuzzMode::Immediate => "immediate",
            FuzzMode::Debounce => "debounce",
            FuzzMode::Throttle => "throttle",
            FuzzMode::Unknown => "sometimes",
        }
    }
}

#[derive(Arbitrary, Debug)]
enum FuzzOp {
    Mount,
    Flush,
    Resize { width: u16, height: u16 },
    QueueResize { width: u16, height: u16 },
    EmptyEvent,
    Advance { ms: u16 },
    Update { mode: FuzzMode, timeout_ms: u16, relabel: bool },
    Unmount,
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    mode: FuzzMode,
    timeout_ms: u16,
    ops: Vec<FuzzOp>,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(mut h) = SizeReportHarness::new(input.mode.as_str(), u64::from(input.timeout_ms)) else {
        return;
    };
    let mut silenced_at: Option<usize> = None;

    for op in input.ops.iter().take(512) {
        match *op {
            FuzzOp::Mount => {
                let _ = h.mount();
            }
            FuzzOp::Flush => {
                h.flush();
            }
            FuzzOp::Resize { width, height } => h.resize(f64::from(width), f64::from(height)),
            FuzzOp::QueueResize { width, height } => {
                h.queue_resize(f64::from(width), f64::from(height));
            }
            FuzzOp::EmptyEvent => h.empty_event(),
            FuzzOp::Advance { ms } => {
                h.advance_ms(u64::from(ms));
            }
            FuzzOp::Update { mode, timeout_ms, relabel } => {
                let label = if relabel { "next" } else { PRIMARY };
                let _ = h.update_with(|r| {
                    Props::new()
                        .with("onSizeUpdated", r.prop(label))
                        .with("reportingMode", mode.as_str())
                        .with("timeoutMs", u32::from(timeout_ms))
                });
            }
            FuzzOp::Unmount => h.unmount(),
        }

        if h.phase() == HarnessPhase::Unmounted && silenced_at.is_none() {
            silenced_at = Some(h.recorder().len());
            assert_eq!(h.timers().pending(), 0);
            assert_eq!(h.platform().active_observations(), 0);
        }
        if let Some(count) = silenced_at {
            assert_eq!(h.recorder().len(), count, "delivery after unmount");
        }
    }

    h.unmount();
    assert!(h.platform().release_calls() <= 1);
    assert_eq!(h.platform().observe_calls(), h.platform().release_calls());
});
