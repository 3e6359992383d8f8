use derive_more::derive::{Display, Error};

/// Errors surfaced by `encode` and `finish`.
#[derive(Debug, Display, Error)]
pub enum EncodeError {
    /// The pipeline refused the frame. The stream should be considered
    /// broken; stop submitting.
    #[display("pipeline rejected the frame: {_0:?}")]
    Rejected(#[error(not(source))] gst::FlowError),
    /// The encoder was already shut down.
    #[display("encoder was already shut down")]
    ShutDown,
    /// The pipeline did not reach the Null state on teardown.
    #[display("failed to stop pipeline: {_0:?}")]
    Stop(#[error(not(source))] gst::StateChangeError),
}

impl EncodeError {
    /// Whether the caller should stop submitting frames on this stream.
    pub fn is_backpressure(&self) -> bool {
        matches!(self, EncodeError::Rejected(_))
    }
}

/// Error message drained from the pipeline bus.
#[derive(Debug, Display, Error)]
#[display("Received error from {src}: {error} (debug: {debug:?})")]
pub struct PipelineError {
    pub src: glib::GString,
    pub error: glib::Error,
    pub debug: Option<glib::GString>,
}
