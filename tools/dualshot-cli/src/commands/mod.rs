pub mod check;
pub mod clip;
pub mod snap;

use std::path::{Path, PathBuf};

use dualshot_capture_engine::{DualCaptureResult, MediaRef, Progress};
use tokio::sync::mpsc::UnboundedReceiver;

/// Print advisory stage changes as they arrive.
pub async fn report_progress(mut rx: UnboundedReceiver<Progress>) {
    while let Some(progress) = rx.recv().await {
        match progress {
            Progress::GestureResolved(mode) => println!("  gesture resolved: {mode:?}"),
            Progress::PrimaryCaptured => println!("  primary captured"),
            Progress::Switching { to } => println!("  switching to {to:?} camera..."),
            Progress::RecordingStarted(stage) => println!("  recording {stage:?}..."),
            Progress::RecordingStopped(stage) => println!("  recording {stage:?} finalized"),
            Progress::Done => println!("  done"),
            Progress::Cancelled => println!("  cancelled"),
        }
    }
}

/// Write both media buffers of a finished capture next to each other.
pub fn write_result(result: &DualCaptureResult, output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;
    let stamp = result.captured_at.format("%Y%m%d_%H%M%S");

    let mut written = Vec::new();
    for (slot, media) in [("primary", &result.primary), ("secondary", &result.secondary)] {
        let (ext, data) = match media {
            MediaRef::Image(still) => ("jpg", &still.data),
            // Concatenated encoded chunks; the synthetic backend emits
            // tagged placeholders, the GStreamer backend MJPEG frames.
            MediaRef::Clip(clip) => ("mjpeg", &clip.data),
        };
        let path = output_dir.join(format!("dualshot_{stamp}_{slot}.{ext}"));
        std::fs::write(&path, data)?;
        println!("  wrote {} ({} bytes)", path.display(), data.len());
        written.push(path);
    }
    Ok(written)
}
