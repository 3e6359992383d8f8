use crossbeam_channel::{Receiver, Sender, bounded};
use std::time::Duration;

/// One compressed H.264 access unit pulled from an egress sink.
///
/// Ownership moves to whoever receives it; the encoder never touches a
/// sample again after it is enqueued.
pub struct EncodedSample {
    sample: gst::Sample,
}

impl EncodedSample {
    pub(crate) fn new(sample: gst::Sample) -> Self {
        Self { sample }
    }

    pub fn sample(&self) -> &gst::Sample {
        &self.sample
    }

    pub fn into_sample(self) -> gst::Sample {
        self.sample
    }

    /// Size of the compressed payload in bytes.
    pub fn size(&self) -> usize {
        self.sample.buffer().map(|b| b.size()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Read access to the compressed bytes.
    pub fn map_readable(&self) -> Option<gst::BufferMap<'_, gst::buffer::Readable>> {
        self.sample.buffer().and_then(|b| b.map_readable().ok())
    }
}

/// Consumer end of one egress stream. Samples arrive in encode order; the
/// opaque and alpha streams of a split encoder fill independently.
///
/// The channel is bounded: leaving it full holds back the pipeline's
/// streaming thread, so drain it on the consumer's own schedule.
pub struct SampleStream {
    rx: Receiver<EncodedSample>,
}

impl SampleStream {
    /// Blocks for the next sample. `None` once the pipeline is gone and the
    /// queue has drained.
    pub fn recv(&self) -> Option<EncodedSample> {
        self.rx.recv().ok()
    }

    pub fn try_recv(&self) -> Option<EncodedSample> {
        self.rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EncodedSample> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// The two independently-timed outputs of an alpha-split encoder.
pub struct SplitStreams {
    pub opaque: SampleStream,
    pub alpha: SampleStream,
}

pub(crate) fn sample_channel(depth: usize) -> (Sender<EncodedSample>, SampleStream) {
    let (tx, rx) = bounded(depth);
    (tx, SampleStream { rx })
}

/// Wires an egress sink into its stream channel. Runs on the pipeline's
/// streaming thread: pulls exactly one sample per invocation, enqueues it,
/// and signals a fault upward if the pull comes back empty.
pub(crate) fn attach_sink(sink: &gst_app::AppSink, tx: Sender<EncodedSample>) {
    sink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Error)?;
                // A dropped receiver winds the stream down instead of erroring.
                tx.send(EncodedSample::new(sample))
                    .map_err(|_| gst::FlowError::Flushing)?;
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );
}
