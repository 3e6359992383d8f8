//! Turns raw captured pixel buffers into low-latency H.264 byte streams.
//!
//! Two variants: [`SingleStreamEncoder`] compresses the color channels into
//! one stream; [`AlphaSplitEncoder`] additionally extracts the transparency
//! channel through a per-pixel shader and compresses it as a second,
//! independently-timed stream, enabling transparent-window remoting.
//!
//! Frames go in through [`FrameEncoder::encode`] with their own format and
//! geometry — the ingress caps renegotiate only when the tuple actually
//! changes. Compressed samples come out through bounded per-stream
//! [`SampleStream`] channels, filled from the pipeline's own threads.

mod alpha_split;
mod encoder;
mod error;
mod ingress;
mod pipeline;
mod sample;
mod settings;
mod single;

pub use alpha_split::AlphaSplitEncoder;
pub use encoder::FrameEncoder;
pub use error::{EncodeError, PipelineError};
pub use sample::{EncodedSample, SampleStream, SplitStreams};
pub use settings::{DEFAULT_SAMPLE_QUEUE_DEPTH, EncoderSettings};
pub use single::SingleStreamEncoder;
