//! Capture a clip pair with a simulated hold gesture.

use std::path::PathBuf;
use std::time::Duration;

use dualshot_capture_engine::{ControlEvent, Sequencer};
use dualshot_common::config::AppConfig;
use dualshot_common::facing::CameraFacing;
use tokio::sync::mpsc;

pub async fn run(
    facing: CameraFacing,
    output: PathBuf,
    release_after_ms: Option<u64>,
    config: AppConfig,
) -> anyhow::Result<()> {
    println!("Capturing clip pair (phase 1: {facing:?})");
    println!("Press Ctrl+C to cancel");

    let hold_threshold = config.engine.hold_threshold();
    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let mut sequencer = Sequencer::new(config.engine, dualshot_camera::default_backend())
        .with_progress(progress_tx);
    let reporter = tokio::spawn(super::report_progress(progress_rx));

    let (tx, mut rx) = mpsc::channel(16);

    let cancel_tx = tx.clone();
    let canceller = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(ControlEvent::Cancel).await;
        }
    });

    let gesture = async {
        tokio::time::sleep(Duration::from_millis(500)).await;
        tx.send(ControlEvent::PressStart).await?;
        if let Some(release_ms) = release_after_ms {
            // The hold resolves at the threshold; release this far into
            // the primary recording.
            tokio::time::sleep(hold_threshold + Duration::from_millis(release_ms)).await;
            tx.send(ControlEvent::PressEnd).await?;
        }
        Ok::<_, anyhow::Error>(())
    };

    let (outcome, sent) = tokio::join!(sequencer.run(facing, &mut rx), gesture);
    sent?;
    reporter.abort();
    canceller.abort();

    match outcome? {
        Some(result) => {
            super::write_result(&result, &output)?;
            Ok(())
        }
        None => {
            println!("Sequence cancelled, nothing written");
            Ok(())
        }
    }
}
