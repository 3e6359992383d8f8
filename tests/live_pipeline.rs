//! End-to-end delivery checks against a real GStreamer install.
//!
//! These build and run the actual GL + x264 pipelines, so they need the
//! `opengl` and `x264` plugins and a GL-capable environment. Run with
//! `cargo test -- --ignored` on such a machine.

use std::time::Duration;

use remoting_encoder::{AlphaSplitEncoder, EncoderSettings, FrameEncoder, SingleStreamEncoder};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 240;
const FRAMES: usize = 10;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn bgra_frame(fill: u8) -> Vec<u8> {
    vec![fill; (WIDTH * HEIGHT * 4) as usize]
}

#[test]
#[ignore = "needs a GL-capable GStreamer install"]
fn single_stream_delivers_every_frame() {
    init_logging();

    let settings = EncoderSettings::new("BGRA", WIDTH, HEIGHT);
    let (mut encoder, samples) = SingleStreamEncoder::with_settings(settings).unwrap();

    for i in 0..FRAMES {
        encoder.encode(bgra_frame(i as u8), "BGRA", WIDTH, HEIGHT).unwrap();
    }

    for _ in 0..FRAMES {
        let sample = samples
            .recv_timeout(Duration::from_secs(10))
            .expect("missing encoded sample");
        assert!(!sample.is_empty());
    }

    encoder.process_events().unwrap();
    encoder.finish().unwrap();
    assert!(encoder.finish().is_err());
}

#[test]
#[ignore = "needs a GL-capable GStreamer install"]
fn alpha_split_delivers_both_streams() {
    init_logging();

    let settings = EncoderSettings::new("BGRA", WIDTH, HEIGHT);
    let (mut encoder, streams) = AlphaSplitEncoder::with_settings(settings).unwrap();

    for _ in 0..FRAMES {
        // half-transparent pixels so the alpha branch carries real signal
        encoder.encode(bgra_frame(0x80), "BGRA", WIDTH, HEIGHT).unwrap();
    }

    // The two streams advance at their own pace; drain each independently.
    for _ in 0..FRAMES {
        let opaque = streams
            .opaque
            .recv_timeout(Duration::from_secs(10))
            .expect("missing opaque sample");
        assert!(!opaque.is_empty());
    }
    for _ in 0..FRAMES {
        let alpha = streams
            .alpha
            .recv_timeout(Duration::from_secs(10))
            .expect("missing alpha sample");
        assert!(!alpha.is_empty());
    }

    encoder.process_events().unwrap();
    encoder.finish().unwrap();
}

#[test]
#[ignore = "needs a GL-capable GStreamer install"]
fn geometry_change_renegotiates_mid_stream() {
    init_logging();

    let settings = EncoderSettings::new("BGRA", WIDTH, HEIGHT);
    let (mut encoder, samples) = SingleStreamEncoder::with_settings(settings).unwrap();

    encoder.encode(bgra_frame(1), "BGRA", WIDTH, HEIGHT).unwrap();
    // shrink the window without rebuilding the pipeline
    let small = vec![2u8; (160 * 120 * 4) as usize];
    encoder.encode(small, "BGRA", 160, 120).unwrap();

    for _ in 0..2 {
        assert!(samples.recv_timeout(Duration::from_secs(10)).is_some());
    }

    encoder.finish().unwrap();
}
