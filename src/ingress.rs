use tracing::{debug, warn};

use crate::error::EncodeError;

/// The pipeline's injection point, seen through the two operations the
/// negotiator and the submission path need. `gst_app::AppSrc` is the real
/// implementation; tests substitute their own.
pub(crate) trait Ingress {
    fn current_caps(&self) -> Option<gst::Caps>;
    fn apply_caps(&self, caps: &gst::Caps);
    fn push(&self, buffer: gst::Buffer) -> Result<gst::FlowSuccess, gst::FlowError>;
}

impl Ingress for gst_app::AppSrc {
    fn current_caps(&self) -> Option<gst::Caps> {
        self.caps()
    }

    fn apply_caps(&self, caps: &gst::Caps) {
        self.set_caps(Some(caps));
    }

    fn push(&self, buffer: gst::Buffer) -> Result<gst::FlowSuccess, gst::FlowError> {
        self.push_buffer(buffer)
    }
}

/// Raw-video caps for one frame geometry. The framerate is pinned to 60/1;
/// frames are pushed as fast as the capture side produces them.
pub(crate) fn video_caps(format: &str, width: u32, height: u32) -> gst::Caps {
    gst::Caps::builder("video/x-raw")
        .field("format", format)
        .field("width", width as i32)
        .field("height", height as i32)
        .field("framerate", gst::Fraction::new(60, 1))
        .build()
}

/// Replaces the ingress caps only when the requested tuple differs from the
/// one currently applied. Comparison is structural; an unchanged geometry is
/// a no-op with no side effects.
pub(crate) fn ensure_caps<I: Ingress>(ingress: &I, format: &str, width: u32, height: u32) {
    let wanted = video_caps(format, width, height);
    match ingress.current_caps() {
        Some(current) if current == wanted => {}
        _ => {
            debug!("renegotiating ingress caps: {wanted:?}");
            ingress.apply_caps(&wanted);
        }
    }
}

/// Submits one frame: negotiate, wrap without copying, push.
///
/// The payload is owned by the buffer from here on; GStreamer frees it once
/// the pipeline is done reading. The call returns as soon as the hand-off
/// completes; encoding proceeds on the pipeline's own threads.
pub(crate) fn push_frame<I: Ingress>(
    ingress: &I,
    data: Vec<u8>,
    format: &str,
    width: u32,
    height: u32,
) -> Result<(), EncodeError> {
    ensure_caps(ingress, format, width, height);

    if let Some(expected) = expected_frame_size(format, width, height) {
        if data.len() != expected {
            warn!(
                "frame payload is {} bytes, caps describe {expected} ({format} {width}x{height})",
                data.len()
            );
        }
    }

    let buffer = gst::Buffer::from_slice(data);
    ingress.push(buffer).map_err(EncodeError::Rejected)?;
    Ok(())
}

fn expected_frame_size(format: &str, width: u32, height: u32) -> Option<usize> {
    let format = gst_video::VideoFormat::from_string(format);
    if format == gst_video::VideoFormat::Unknown {
        return None;
    }
    gst_video::VideoInfo::builder(format, width, height)
        .fps(gst::Fraction::new(60, 1))
        .build()
        .ok()
        .map(|info| info.size())
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;

    struct MockIngress {
        caps: RefCell<Option<gst::Caps>>,
        applied: Cell<usize>,
        reject: Cell<bool>,
        pushed: RefCell<Vec<gst::Buffer>>,
    }

    impl MockIngress {
        fn new() -> Self {
            gst::init().unwrap();
            Self {
                caps: RefCell::new(None),
                applied: Cell::new(0),
                reject: Cell::new(false),
                pushed: RefCell::new(Vec::new()),
            }
        }
    }

    impl Ingress for MockIngress {
        fn current_caps(&self) -> Option<gst::Caps> {
            self.caps.borrow().clone()
        }

        fn apply_caps(&self, caps: &gst::Caps) {
            self.applied.set(self.applied.get() + 1);
            *self.caps.borrow_mut() = Some(caps.clone());
        }

        fn push(&self, buffer: gst::Buffer) -> Result<gst::FlowSuccess, gst::FlowError> {
            if self.reject.get() {
                return Err(gst::FlowError::Flushing);
            }
            self.pushed.borrow_mut().push(buffer);
            Ok(gst::FlowSuccess::Ok)
        }
    }

    #[test]
    fn first_call_always_negotiates() {
        let ingress = MockIngress::new();
        ensure_caps(&ingress, "BGRA", 1920, 1080);
        assert_eq!(ingress.applied.get(), 1);
        assert_eq!(
            ingress.current_caps().unwrap(),
            video_caps("BGRA", 1920, 1080)
        );
    }

    #[test]
    fn unchanged_tuple_is_applied_exactly_once() {
        let ingress = MockIngress::new();
        for _ in 0..5 {
            ensure_caps(&ingress, "BGRA", 1280, 720);
        }
        assert_eq!(ingress.applied.get(), 1);
    }

    #[test]
    fn any_changed_field_reapplies_once() {
        let ingress = MockIngress::new();
        ensure_caps(&ingress, "BGRA", 1280, 720);
        ensure_caps(&ingress, "BGRA", 1280, 800);
        assert_eq!(ingress.applied.get(), 2);
        ensure_caps(&ingress, "BGRx", 1280, 800);
        assert_eq!(ingress.applied.get(), 3);
        // back to an already-seen tuple still differs from the current one
        ensure_caps(&ingress, "BGRA", 1280, 720);
        assert_eq!(ingress.applied.get(), 4);
    }

    #[test]
    fn push_wraps_payload_without_copying_dimensions_away() {
        let ingress = MockIngress::new();
        let data = vec![0u8; 64];
        push_frame(&ingress, data, "GRAY8", 8, 8).unwrap();
        let pushed = ingress.pushed.borrow();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].size(), 64);
    }

    #[test]
    fn rejected_push_reports_backpressure_and_leaves_caps_alone() {
        let ingress = MockIngress::new();
        ensure_caps(&ingress, "BGRA", 1920, 1080);
        ingress.reject.set(true);

        let err = push_frame(&ingress, vec![0u8; 16], "BGRA", 1920, 1080).unwrap_err();
        assert!(err.is_backpressure());
        assert_eq!(ingress.applied.get(), 1);
        assert!(ingress.pushed.borrow().is_empty());
    }

    #[test]
    fn submit_scenario_bgra_1080p() {
        let ingress = MockIngress::new();
        // factory negotiates the initial tuple
        ensure_caps(&ingress, "BGRA", 1920, 1080);
        assert_eq!(ingress.applied.get(), 1);

        // first submission with identical geometry: accepted, no re-apply
        push_frame(&ingress, vec![0u8; 1920 * 1080 * 4], "BGRA", 1920, 1080).unwrap();
        assert_eq!(ingress.applied.get(), 1);
        assert_eq!(ingress.pushed.borrow().len(), 1);

        // and again
        push_frame(&ingress, vec![0u8; 1920 * 1080 * 4], "BGRA", 1920, 1080).unwrap();
        assert_eq!(ingress.applied.get(), 1);
        assert_eq!(ingress.pushed.borrow().len(), 2);
    }

    #[test]
    fn caps_equality_is_structural() {
        gst::init().unwrap();
        assert_eq!(video_caps("BGRA", 1920, 1080), video_caps("BGRA", 1920, 1080));
        assert_ne!(video_caps("BGRA", 1920, 1080), video_caps("BGRA", 1920, 1081));
    }

    #[test]
    fn expected_size_matches_packed_formats() {
        gst::init().unwrap();
        assert_eq!(expected_frame_size("BGRA", 16, 16), Some(16 * 16 * 4));
        assert_eq!(expected_frame_size("no-such-format", 16, 16), None);
    }
}
