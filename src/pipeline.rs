use anyhow::Result;
use gst::prelude::*;
use tracing::info;

use crate::error::PipelineError;

/// Per-pixel alpha extraction: the output pixel is `(a, a, a, 0)`, turning
/// the transparency channel into a grayscale image a luma encoder can carry.
pub(crate) const ALPHA_FRAGMENT_SHADER: &str = r#"
#version 120
#ifdef GL_ES
    precision mediump float;
#endif
varying vec2 v_texcoord;
uniform sampler2D tex;
uniform float time;
uniform float width;
uniform float height;
void main () {
        vec4 pix = texture2D(tex, v_texcoord);
        gl_FragColor = vec4(pix.a,pix.a,pix.a,0);
}
"#;

pub(crate) const ALPHA_VERTEX_SHADER: &str = r#"
#version 120
#ifdef GL_ES
    precision mediump float;
#endif
attribute vec4 a_position;
attribute vec2 a_texcoord;
varying vec2 v_texcoord;
void main() {
        gl_Position = a_position;
        v_texcoord = a_texcoord;
}
"#;

/// x264 settings for one egress stream. Everything targets low-latency
/// byte-stream output; the knobs that differ between the variants live here.
pub(crate) struct H264Tuning {
    pub speed_preset: &'static str,
    pub profile: &'static str,
    pub qp_max: Option<u32>,
    pub bitrate: Option<u32>,
    pub key_int_max: Option<u32>,
    pub quality_pass: bool,
}

/// Single-stream output: quality capped by qp-max, default key-frame bound.
pub(crate) const SINGLE_STREAM_TUNING: H264Tuning = H264Tuning {
    speed_preset: "veryfast",
    profile: "constrained-baseline",
    qp_max: Some(32),
    bitrate: None,
    key_int_max: None,
    quality_pass: false,
};

/// Split-stream branches: higher bitrate target, long key-frame interval.
pub(crate) const SPLIT_BRANCH_TUNING: H264Tuning = H264Tuning {
    speed_preset: "medium",
    profile: "baseline",
    qp_max: None,
    bitrate: Some(18000),
    key_int_max: Some(2000),
    quality_pass: true,
};

pub(crate) fn build_appsrc() -> gst_app::AppSrc {
    gst_app::AppSrc::builder()
        .name("src")
        .is_live(true)
        .format(gst::Format::Time)
        .build()
}

fn build_appsink(name: &str) -> gst_app::AppSink {
    gst_app::AppSink::builder().name(name).sync(false).build()
}

fn h264_encoder(tuning: &H264Tuning) -> Result<gst::Element> {
    let mut builder = gst::ElementFactory::make("x264enc")
        .property("byte-stream", true)
        .property_from_str("tune", "zerolatency")
        .property_from_str("speed-preset", tuning.speed_preset);
    if let Some(qp_max) = tuning.qp_max {
        builder = builder.property("qp-max", qp_max);
    }
    if let Some(bitrate) = tuning.bitrate {
        builder = builder.property("bitrate", bitrate);
    }
    if let Some(key_int_max) = tuning.key_int_max {
        builder = builder.property("key-int-max", key_int_max);
    }
    if tuning.quality_pass {
        builder = builder.property_from_str("pass", "qual");
    }
    Ok(builder.build()?)
}

fn gl_i420_caps() -> gst::Caps {
    gst::Caps::builder("video/x-raw")
        .features([gst_gl::CAPS_FEATURE_MEMORY_GL_MEMORY])
        .field("format", "I420")
        .build()
}

fn h264_caps(profile: &str) -> gst::Caps {
    gst::Caps::builder("video/x-h264")
        .field("profile", profile)
        .field("stream-format", "byte-stream")
        .field("alignment", "au")
        .field("framerate", gst::Fraction::new(60, 1))
        .build()
}

/// Builds one GL convert + H.264 encode chain ending in a named egress sink
/// and adds it to the pipeline. With `alpha_extract` the chain runs the
/// alpha shader between two color conversions, so the encoder sees the
/// transparency channel as luma.
///
/// Returns the chain's entry element and its sink; the caller links the
/// ingress (or a tee branch) to the entry.
pub(crate) fn encode_branch(
    pipeline: &gst::Pipeline,
    tuning: &H264Tuning,
    alpha_extract: bool,
    sink_name: &str,
) -> Result<(gst::Element, gst_app::AppSink)> {
    let glupload = gst::ElementFactory::make("glupload").build()?;
    let glconvert = gst::ElementFactory::make("glcolorconvert").build()?;
    let gldownload = gst::ElementFactory::make("gldownload").build()?;
    let x264enc = h264_encoder(tuning)?;
    let appsink = build_appsink(sink_name);

    pipeline.add_many([&glupload, &glconvert, &gldownload, &x264enc])?;
    pipeline.add(appsink.upcast_ref::<gst::Element>())?;
    glupload.link(&glconvert)?;

    if alpha_extract {
        let glshader = gst::ElementFactory::make("glshader")
            .property("fragment", ALPHA_FRAGMENT_SHADER)
            .property("vertex", ALPHA_VERTEX_SHADER)
            .build()?;
        let to_i420 = gst::ElementFactory::make("glcolorconvert").build()?;
        pipeline.add_many([&glshader, &to_i420])?;
        glconvert.link(&glshader)?;
        glshader.link(&to_i420)?;
        to_i420.link_filtered(&gldownload, &gl_i420_caps())?;
    } else {
        glconvert.link_filtered(&gldownload, &gl_i420_caps())?;
    }

    gldownload.link(&x264enc)?;
    x264enc.link_filtered(appsink.upcast_ref::<gst::Element>(), &h264_caps(tuning.profile))?;

    Ok((glupload, appsink))
}

/// Owns the processing graph: one ingress, one or two egress sinks.
///
/// Playing from construction; teardown forces the state to Null before any
/// element reference is released — releasing nodes while still Playing is
/// undefined behavior in the engine.
pub(crate) struct PipelineHandle {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    #[allow(dead_code)]
    sinks: Vec<gst_app::AppSink>,
}

impl PipelineHandle {
    pub(crate) fn new(
        pipeline: gst::Pipeline,
        appsrc: gst_app::AppSrc,
        sinks: Vec<gst_app::AppSink>,
    ) -> Self {
        Self {
            pipeline,
            appsrc,
            sinks,
        }
    }

    pub(crate) fn appsrc(&self) -> &gst_app::AppSrc {
        &self.appsrc
    }

    pub(crate) fn play(&self) -> Result<()> {
        info!("Start pipeline");
        self.pipeline.set_state(gst::State::Playing)?;
        Ok(())
    }

    /// Consumes the handle. State reaches Null first; the element references
    /// drop afterwards.
    pub(crate) fn shutdown(self) -> Result<(), gst::StateChangeError> {
        info!("Stop pipeline");
        self.pipeline.set_state(gst::State::Null)?;
        Ok(())
    }

    /// Drains pending bus messages, surfacing the first pipeline error.
    pub(crate) fn process_events(&self) -> Result<()> {
        let bus = self
            .pipeline
            .bus()
            .expect("Pipeline without bus. Shouldn't happen!");

        for msg in bus.iter() {
            use gst::MessageView;

            match msg.view() {
                MessageView::Eos(..) => break,
                MessageView::Error(err) => {
                    self.pipeline.set_state(gst::State::Null)?;
                    return Err(PipelineError {
                        src: msg
                            .src()
                            .map(|s| s.path_string())
                            .unwrap_or_else(|| glib::GString::from("UNKNOWN")),
                        error: err.error(),
                        debug: err.debug(),
                    }
                    .into());
                }
                _ => (),
            }
        }

        Ok(())
    }
}
