use tracing::warn;

use crate::error::EncodeError;
use crate::ingress::push_frame;
use crate::pipeline::PipelineHandle;

/// Common surface of the encoder variants.
///
/// Not internally synchronized: `&mut self` makes the single-writer
/// discipline a compile-time property instead of a calling convention.
pub trait FrameEncoder: Send {
    /// Submits one frame. The payload is owned by the pipeline from here on
    /// and freed once consumed; the call returns as soon as the hand-off
    /// completes. `Err(Rejected)` means the stream is broken — stop
    /// submitting.
    fn encode(
        &mut self,
        data: Vec<u8>,
        format: &str,
        width: u32,
        height: u32,
    ) -> Result<(), EncodeError>;

    /// Tears the pipeline down. Unconditional and immediate: in-flight
    /// frames are abandoned and queued samples may go undelivered. Every
    /// later operation, including a second `finish`, returns `ShutDown`.
    fn finish(&mut self) -> Result<(), EncodeError>;
}

/// Lifecycle plumbing shared by both variants: the live/destroyed tag and
/// the submit/teardown paths over it.
pub(crate) struct EncoderCore {
    handle: Option<PipelineHandle>,
}

impl EncoderCore {
    pub(crate) fn new(handle: PipelineHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub(crate) fn encode(
        &mut self,
        data: Vec<u8>,
        format: &str,
        width: u32,
        height: u32,
    ) -> Result<(), EncodeError> {
        let handle = self.handle.as_ref().ok_or(EncodeError::ShutDown)?;
        push_frame(handle.appsrc(), data, format, width, height)
    }

    pub(crate) fn finish(&mut self) -> Result<(), EncodeError> {
        // Taking the handle first makes any reentrant call a ShutDown error
        // before resources start going away.
        let handle = self.handle.take().ok_or(EncodeError::ShutDown)?;
        handle.shutdown().map_err(EncodeError::Stop)
    }

    /// Surfaces pending pipeline bus errors, if the encoder is still live.
    pub(crate) fn process_events(&self) -> anyhow::Result<()> {
        match &self.handle {
            Some(handle) => handle.process_events(),
            None => Ok(()),
        }
    }
}

impl Drop for EncoderCore {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.shutdown() {
                warn!("pipeline did not stop cleanly on drop: {err:?}");
            }
        }
    }
}
