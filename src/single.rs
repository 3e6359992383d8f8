use anyhow::Result;
use gst::prelude::*;
use tracing::info;

use crate::encoder::{EncoderCore, FrameEncoder};
use crate::error::EncodeError;
use crate::ingress::ensure_caps;
use crate::pipeline::{PipelineHandle, SINGLE_STREAM_TUNING, build_appsrc, encode_branch};
use crate::sample::{SampleStream, attach_sink, sample_channel};
use crate::settings::EncoderSettings;

/// Compresses the color channels of submitted frames into one H.264
/// byte stream: ingress → GL upload/convert → x264 → egress.
pub struct SingleStreamEncoder {
    core: EncoderCore,
}

impl SingleStreamEncoder {
    /// Builds the pipeline, negotiates the initial caps and starts it.
    /// Returns the encoder together with the consumer end of its stream.
    pub fn with_settings(settings: EncoderSettings) -> Result<(Self, SampleStream)> {
        gst::init()?;

        let pipeline = gst::Pipeline::default();
        let appsrc = build_appsrc();
        pipeline.add(appsrc.upcast_ref::<gst::Element>())?;

        let (head, appsink) = encode_branch(&pipeline, &SINGLE_STREAM_TUNING, false, "sink")?;
        appsrc.link(&head)?;

        let (tx, stream) = sample_channel(settings.sample_queue_depth);
        attach_sink(&appsink, tx);

        ensure_caps(&appsrc, &settings.format, settings.width, settings.height);
        info!(
            "single-stream encoder: {} {}x{}",
            settings.format, settings.width, settings.height
        );

        let handle = PipelineHandle::new(pipeline, appsrc, vec![appsink]);
        handle.play()?;

        Ok((
            Self {
                core: EncoderCore::new(handle),
            },
            stream,
        ))
    }

    /// Surfaces pending pipeline bus errors.
    pub fn process_events(&self) -> Result<()> {
        self.core.process_events()
    }
}

impl FrameEncoder for SingleStreamEncoder {
    fn encode(
        &mut self,
        data: Vec<u8>,
        format: &str,
        width: u32,
        height: u32,
    ) -> Result<(), EncodeError> {
        self.core.encode(data, format, width, height)
    }

    fn finish(&mut self) -> Result<(), EncodeError> {
        self.core.finish()
    }
}
