#![forbid(unsafe_code)]

//! Records every caller-visible size delivery against lab time.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use serde_json::json;
use sizereport_core::clock::LabClock;
use sizereport_core::{PropValue, SizeCallback};

/// One invocation of a recorded callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Lab time of the call, in milliseconds since the clock started.
    pub at_ms: u64,
    pub width: f64,
    pub height: f64,
    /// Which callback received it.
    pub label: Rc<str>,
}

/// Shared log of deliveries. Clones append to the same log.
#[derive(Debug, Clone)]
pub struct Recorder {
    clock: LabClock,
    log: Rc<RefCell<Vec<Delivery>>>,
}

impl Recorder {
    #[must_use]
    pub fn new(clock: LabClock) -> Self {
        Self {
            clock,
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A callback that records under `label`.
    #[must_use]
    pub fn callback(&self, label: &str) -> SizeCallback {
        let label: Rc<str> = Rc::from(label);
        let clock = self.clock.clone();
        let log = Rc::clone(&self.log);
        Rc::new(move |width, height| {
            log.borrow_mut().push(Delivery {
                at_ms: clock.elapsed_ms(),
                width,
                height,
                label: Rc::clone(&label),
            });
        })
    }

    /// [`callback`](Self::callback) as a property value.
    #[must_use]
    pub fn prop(&self, label: &str) -> PropValue {
        PropValue::Callback(self.callback(label))
    }

    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.borrow().clone()
    }

    /// `(at_ms, width, height)` for every delivery, labels dropped.
    #[must_use]
    pub fn timeline(&self) -> Vec<(u64, f64, f64)> {
        self.log
            .borrow()
            .iter()
            .map(|d| (d.at_ms, d.width, d.height))
            .collect()
    }

    /// Deliveries received by the callback named `label`.
    #[must_use]
    pub fn for_label(&self, label: &str) -> Vec<(u64, f64, f64)> {
        self.log
            .borrow()
            .iter()
            .filter(|d| &*d.label == label)
            .map(|d| (d.at_ms, d.width, d.height))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// One JSON object per line, for attaching to failure reports.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for d in self.log.borrow().iter() {
            let line = json!({
                "at_ms": d.at_ms,
                "label": &*d.label,
                "width": d.width,
                "height": d.height,
            });
            let _ = writeln!(out, "{line}");
        }
        out
    }
}
