//! GStreamer/V4L2 camera backend.
//!
//! One pipeline per session: `v4l2src` teed into a raw-RGB appsink for
//! still grabs and a JPEG-encoded appsink for recording chunks. Which
//! device node serves which facing direction comes from [`FeedConfig`];
//! there is no portable way to probe facing on V4L2.

use std::sync::OnceLock;
use std::time::Duration;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app::AppSink;

use dualshot_common::config::FeedConfig;
use dualshot_common::error::HardwareError;
use dualshot_common::facing::CameraFacing;

use crate::{CameraBackend, CameraFeed, RawFrame};

/// Polling interval while waiting on an appsink sample.
const SAMPLE_POLL: Duration = Duration::from_millis(5);

fn init_gstreamer() -> Result<(), HardwareError> {
    static INIT: OnceLock<Result<(), String>> = OnceLock::new();
    INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()))
        .clone()
        .map_err(HardwareError::stream)
}

/// V4L2 capture backend.
pub struct GstBackend;

impl GstBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GstBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn device_for(facing: CameraFacing, config: &FeedConfig) -> Result<&str, HardwareError> {
    let device = match facing {
        CameraFacing::Rear => config.rear_device.as_deref(),
        CameraFacing::Front => config.front_device.as_deref(),
    };
    device.ok_or(HardwareError::NoDevice { facing })
}

#[async_trait::async_trait]
impl CameraBackend for GstBackend {
    async fn open(
        &mut self,
        facing: CameraFacing,
        config: &FeedConfig,
    ) -> Result<Box<dyn CameraFeed>, HardwareError> {
        init_gstreamer()?;

        let device = device_for(facing, config)?;
        let width = config.width;
        let height = config.height;
        let quality = config.jpeg_quality.clamp(1, 100);

        // leaky frame queue so a slow consumer never backs up into the
        // driver; the chunk branch keeps everything for the recorder.
        let launch = format!(
            "v4l2src device=\"{device}\" do-timestamp=true ! videoconvert ! videoscale \
             ! video/x-raw,format=RGB,width={width},height={height} ! tee name=t \
             t. ! queue max-size-buffers=2 leaky=downstream ! appsink name=frames max-buffers=1 drop=true \
             t. ! queue max-size-buffers=32 ! jpegenc quality={quality} ! appsink name=chunks max-buffers=64"
        );

        let element = gst::parse::launch(&launch)
            .map_err(|e| HardwareError::stream(format!("Failed to build pipeline: {e}")))?;
        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| HardwareError::stream("Launch string did not produce a pipeline"))?;

        let frames = appsink(&pipeline, "frames")?;
        let chunks = appsink(&pipeline, "chunks")?;

        pipeline.set_state(gst::State::Playing).map_err(|e| {
            HardwareError::stream(format!("Failed to start camera pipeline: {e:?}"))
        })?;

        // State changes are async; wait so the device is actually open
        // before the session is handed out.
        match pipeline.state(gst::ClockTime::from_seconds(10)) {
            (Ok(_), gst::State::Playing, _) => {}
            (Ok(_), state, _) => {
                tracing::warn!(?state, device, "Camera pipeline not Playing within timeout");
            }
            (Err(e), _, _) => {
                let _ = pipeline.set_state(gst::State::Null);
                return Err(HardwareError::stream(format!(
                    "Camera pipeline failed to reach Playing state: {e:?}"
                )));
            }
        }

        tracing::info!(device, ?facing, "V4L2 feed opened");
        Ok(Box::new(GstFeed {
            pipeline,
            frames,
            chunks,
            width,
            height,
            sequence: 0,
            stopped: false,
        }))
    }

    fn name(&self) -> &str {
        "gstreamer-v4l2"
    }

    fn is_available(&self) -> bool {
        init_gstreamer().is_ok()
    }
}

fn appsink(pipeline: &gst::Pipeline, name: &str) -> Result<AppSink, HardwareError> {
    pipeline
        .by_name(name)
        .and_then(|e| e.dynamic_cast::<AppSink>().ok())
        .ok_or_else(|| HardwareError::stream(format!("Pipeline is missing appsink '{name}'")))
}

struct GstFeed {
    pipeline: gst::Pipeline,
    frames: AppSink,
    chunks: AppSink,
    width: u32,
    height: u32,
    sequence: u64,
    stopped: bool,
}

fn sample_bytes(sample: &gst::Sample) -> Result<Vec<u8>, HardwareError> {
    let buffer = sample
        .buffer()
        .ok_or_else(|| HardwareError::stream("Sample carried no buffer"))?;
    let map = buffer
        .map_readable()
        .map_err(|_| HardwareError::stream("Buffer not readable"))?;
    Ok(map.as_slice().to_vec())
}

#[async_trait::async_trait]
impl CameraFeed for GstFeed {
    async fn current_frame(&mut self) -> Result<Option<RawFrame>, HardwareError> {
        if self.stopped {
            return Err(HardwareError::stream("feed stopped"));
        }
        let Some(sample) = self.frames.try_pull_sample(gst::ClockTime::ZERO) else {
            return Ok(None);
        };
        self.sequence += 1;
        Ok(Some(RawFrame {
            width: self.width,
            height: self.height,
            pixels: sample_bytes(&sample)?,
            sequence: self.sequence,
        }))
    }

    async fn read_chunk(&mut self) -> Result<Vec<u8>, HardwareError> {
        loop {
            if self.stopped {
                return Err(HardwareError::stream("feed stopped"));
            }
            if let Some(sample) = self.chunks.try_pull_sample(gst::ClockTime::ZERO) {
                return sample_bytes(&sample);
            }
            tokio::time::sleep(SAMPLE_POLL).await;
        }
    }

    fn set_torch(&mut self, _on: bool) -> Result<(), HardwareError> {
        // No portable torch control over V4L2.
        Err(HardwareError::TorchUnsupported)
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if !self.pipeline.send_event(gst::event::Eos::new()) {
            tracing::warn!("Failed to send EOS; feed may shut down uncleanly");
        }
        if let Err(e) = self.pipeline.set_state(gst::State::Null) {
            tracing::warn!(error = ?e, "Failed to stop camera pipeline");
        }
    }
}

impl Drop for GstFeed {
    fn drop(&mut self) {
        self.stop();
    }
}
