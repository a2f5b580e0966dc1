//! Capture a photo pair with a simulated tap gesture.

use std::path::PathBuf;
use std::time::Duration;

use dualshot_capture_engine::{ControlEvent, Sequencer};
use dualshot_common::config::AppConfig;
use dualshot_common::facing::CameraFacing;
use tokio::sync::mpsc;

pub async fn run(facing: CameraFacing, output: PathBuf, config: AppConfig) -> anyhow::Result<()> {
    println!("Capturing photo pair (phase 1: {facing:?})");

    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let mut sequencer = Sequencer::new(config.engine, dualshot_camera::default_backend())
        .with_progress(progress_tx);
    let reporter = tokio::spawn(super::report_progress(progress_rx));

    let (tx, mut rx) = mpsc::channel(16);
    let gesture = async {
        // Give the feed a moment to warm up before the tap.
        tokio::time::sleep(Duration::from_millis(500)).await;
        tx.send(ControlEvent::PressStart).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(ControlEvent::PressEnd).await?;
        Ok::<_, anyhow::Error>(())
    };

    let (outcome, sent) = tokio::join!(sequencer.run(facing, &mut rx), gesture);
    sent?;
    reporter.abort();

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
