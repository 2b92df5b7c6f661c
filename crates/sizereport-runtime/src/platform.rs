#![forbid(unsafe_code)]

//! Host capability for observing an element's content box.

use std::rc::Rc;

use sizereport_core::{Result, SizeSample};

/// One batched notification from the host's layout observer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawResizeEvent {
    /// Content box of the observed element, if the host reported one.
    pub content_box: Option<SizeSample>,
}

impl RawResizeEvent {
    #[must_use]
    pub fn sample(width: f64, height: f64) -> Self {
        Self {
            content_box: Some(SizeSample::new(width, height)),
        }
    }

    /// A notification that carried no content box.
    #[must_use]
    pub fn empty() -> Self {
        Self { content_box: None }
    }
}

impl From<SizeSample> for RawResizeEvent {
    fn from(sample: SizeSample) -> Self {
        Self {
            content_box: Some(sample),
        }
    }
}

/// Receiver the host invokes for every notification.
pub type RawEventSink = Rc<dyn Fn(RawResizeEvent)>;

/// Layout-observation primitive of a host environment.
///
/// `release` takes the handle by value: a handle can be released at most
/// once, and only by whoever owns it.
pub trait ResizePlatform {
    type Element;
    type Handle;

    /// Start delivering content-box changes of `element` to `sink`.
    ///
    /// Fails with [`SizeReportError::PlatformUnavailable`] when the host
    /// cannot create its observer.
    ///
    /// [`SizeReportError::PlatformUnavailable`]: sizereport_core::SizeReportError::PlatformUnavailable
    fn observe(&self, element: &Self::Element, sink: RawEventSink) -> Result<Self::Handle>;

    /// Stop observing.
    fn release(&self, handle: Self::Handle);
}
