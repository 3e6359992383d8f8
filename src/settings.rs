/// How many encoded samples a stream buffers before the pipeline's
/// streaming thread is held back.
pub const DEFAULT_SAMPLE_QUEUE_DEPTH: usize = 30;

/// Construction-time configuration for an encoder.
///
/// The format tag uses GStreamer raw-video format names ("BGRA", "BGRx", ...).
/// Geometry here is only the starting point: every frame carries its own
/// format and size, and the ingress caps follow along.
#[derive(Clone)]
pub struct EncoderSettings {
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub sample_queue_depth: usize,
}

impl EncoderSettings {
    pub fn new(format: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            format: format.into(),
            width,
            height,
            sample_queue_depth: DEFAULT_SAMPLE_QUEUE_DEPTH,
        }
    }
}
