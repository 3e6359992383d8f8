use anyhow::Result;
use gst::prelude::*;
use tracing::info;

use crate::encoder::{EncoderCore, FrameEncoder};
use crate::error::EncodeError;
use crate::ingress::ensure_caps;
use crate::pipeline::{PipelineHandle, SPLIT_BRANCH_TUNING, build_appsrc, encode_branch};
use crate::sample::{SplitStreams, attach_sink, sample_channel};
use crate::settings::EncoderSettings;

/// Compresses each submitted frame twice: a fan-out replicates the frame
/// into an opaque branch (color channels as-is) and an alpha branch that
/// first runs the alpha-extraction shader, so the transparency channel
/// travels as its own H.264 stream.
///
/// The branches encode and emit independently; nothing forces the two
/// egress streams into lockstep per input frame.
pub struct AlphaSplitEncoder {
    core: EncoderCore,
}

impl AlphaSplitEncoder {
    /// Builds the fan-out pipeline, negotiates the initial caps and starts
    /// it. Returns the encoder together with both stream consumers.
    pub fn with_settings(settings: EncoderSettings) -> Result<(Self, SplitStreams)> {
        gst::init()?;

        let pipeline = gst::Pipeline::default();
        let appsrc = build_appsrc();
        let tee = gst::ElementFactory::make("tee").build()?;
        pipeline.add(appsrc.upcast_ref::<gst::Element>())?;
        pipeline.add(&tee)?;
        appsrc.link(&tee)?;

        let (opaque_head, opaque_sink) =
            encode_branch(&pipeline, &SPLIT_BRANCH_TUNING, false, "opaque")?;
        let (alpha_head, alpha_sink) =
            encode_branch(&pipeline, &SPLIT_BRANCH_TUNING, true, "alpha")?;

        // Each branch gets its own queue so the tee never stalls one leg on
        // the other's encoder.
        for head in [&opaque_head, &alpha_head] {
            let queue = gst::ElementFactory::make("queue").build()?;
            pipeline.add(&queue)?;
            tee.link(&queue)?;
            queue.link(head)?;
        }

        let (opaque_tx, opaque_stream) = sample_channel(settings.sample_queue_depth);
        attach_sink(&opaque_sink, opaque_tx);
        let (alpha_tx, alpha_stream) = sample_channel(settings.sample_queue_depth);
        attach_sink(&alpha_sink, alpha_tx);

        ensure_caps(&appsrc, &settings.format, settings.width, settings.height);
        info!(
            "alpha-split encoder: {} {}x{}",
            settings.format, settings.width, settings.height
        );

        let handle = PipelineHandle::new(pipeline, appsrc, vec![opaque_sink, alpha_sink]);
        handle.play()?;

        Ok((
            Self {
                core: EncoderCore::new(handle),
            },
            SplitStreams {
                opaque: opaque_stream,
                alpha: alpha_stream,
            },
        ))
    }

    /// Surfaces pending pipeline bus errors.
    pub fn process_events(&self) -> Result<()> {
        self.core.process_events()
    }
}

impl FrameEncoder for AlphaSplitEncoder {
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
