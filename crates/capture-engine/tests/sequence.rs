//! End-to-end capture sequences against the synthetic backend, on virtual
//! time.

use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tokio::sync::mpsc;

use dualshot_camera::synthetic::{test_pattern, SyntheticBackend, SyntheticProbe};
use dualshot_capture_engine::grabber::mirror_rgb_in_place;
use dualshot_capture_engine::{
    CaptureMode, CaptureStage, ControlEvent, MediaRef, Progress, Sequencer,
};
use dualshot_common::config::EngineConfig;
use dualshot_common::error::{CaptureError, HardwareError};
use dualshot_common::facing::CameraFacing;

/// Synthetic chunk pacing; one scheduler tick of tolerance on bounds.
const TICK: Duration = Duration::from_millis(34);

fn engine(backend: SyntheticBackend) -> (Sequencer, SyntheticProbe) {
    let probe = backend.probe();
    let sequencer = Sequencer::new(EngineConfig::default(), Box::new(backend));
    (sequencer, probe)
}

fn jpeg(pixels: &[u8], width: u32, height: u32, quality: u8) -> Vec<u8> {
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .write_image(pixels, width, height, ExtendedColorType::Rgb8)
        .unwrap();
    out
}

#[tokio::test(start_paused = true)]
async fn tap_from_rear_yields_mirrored_front_secondary() {
    let (mut sequencer, probe) = engine(SyntheticBackend::new());
    let (tx, mut rx) = mpsc::channel(16);
    let config = EngineConfig::default();

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(ControlEvent::PressEnd).await.unwrap();
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Rear, &mut rx), script);
    let result = outcome.unwrap().expect("tap should produce a result");

    assert_eq!(result.mode, CaptureMode::Photo);
    assert_eq!(result.primary_facing, CameraFacing::Rear);
    assert_eq!(sequencer.stage(), CaptureStage::Done);

    // Phase 1: rear frame, unmirrored.
    let expected_rear = jpeg(
        &test_pattern(config.feed.width, config.feed.height, CameraFacing::Rear),
        config.feed.width,
        config.feed.height,
        config.feed.jpeg_quality,
    );
    // Phase 2: front frame, mirrored to match the self-view preview.
    let mut front = test_pattern(config.feed.width, config.feed.height, CameraFacing::Front);
    mirror_rgb_in_place(&mut front, config.feed.width);
    let expected_front = jpeg(
        &front,
        config.feed.width,
        config.feed.height,
        config.feed.jpeg_quality,
    );

    match (&result.primary, &result.secondary) {
        (MediaRef::Image(primary), MediaRef::Image(secondary)) => {
            assert_eq!(primary.data, expected_rear);
            assert_eq!(secondary.data, expected_front);
        }
        other => panic!("expected two stills, got {other:?}"),
    }

    // One session per phase, all closed at the end.
    assert_eq!(probe.opens(), 2);
    assert_eq!(probe.live_feeds(), 0);
}

#[tokio::test(start_paused = true)]
async fn hold_from_front_records_bounded_clips() {
    let (mut sequencer, probe) = engine(SyntheticBackend::new());
    let (tx, mut rx) = mpsc::channel(16);

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        // Never released: both phases run to their bounds.
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Front, &mut rx), script);
    let result = outcome.unwrap().expect("hold should produce a result");

    assert_eq!(result.mode, CaptureMode::Video);
    assert_eq!(result.primary_facing, CameraFacing::Front);

    match (&result.primary, &result.secondary) {
        (MediaRef::Clip(primary), MediaRef::Clip(secondary)) => {
            assert!(primary.duration >= Duration::from_secs(5));
            assert!(primary.duration < Duration::from_secs(5) + TICK);
            assert!(secondary.duration >= Duration::from_secs(3));
            assert!(secondary.duration < Duration::from_secs(3) + TICK);
            // Facing alternation is visible in the chunk tags.
            assert!(primary.data.starts_with(b"Front|"));
            assert!(secondary.data.starts_with(b"Rear|"));
        }
        other => panic!("expected two clips, got {other:?}"),
    }

    assert_eq!(probe.opens(), 2);
    assert_eq!(probe.live_feeds(), 0);
}

#[tokio::test(start_paused = true)]
async fn early_release_shortens_primary_but_not_the_sequence() {
    let (mut sequencer, probe) = engine(SyntheticBackend::new());
    let (tx, mut rx) = mpsc::channel(16);

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        // Hold resolves at 300 ms; release one second into the recording.
        tokio::time::sleep(Duration::from_millis(1300)).await;
        tx.send(ControlEvent::PressEnd).await.unwrap();
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Front, &mut rx), script);
    let result = outcome.unwrap().expect("early stop must not abort");

    match (&result.primary, &result.secondary) {
        (MediaRef::Clip(primary), MediaRef::Clip(secondary)) => {
            assert!(primary.duration >= Duration::from_secs(1));
            assert!(primary.duration < Duration::from_secs(1) + TICK);
            assert!(secondary.duration >= Duration::from_secs(3));
        }
        other => panic!("expected two clips, got {other:?}"),
    }
    assert_eq!(probe.live_feeds(), 0);
}

#[tokio::test(start_paused = true)]
async fn permission_denied_surfaces_and_stays_idle() {
    let (mut sequencer, probe) = engine(SyntheticBackend::new().deny_permission());
    let (_tx, mut rx) = mpsc::channel::<ControlEvent>(16);

    let err = sequencer
        .run(CameraFacing::Rear, &mut rx)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CaptureError::Hardware(HardwareError::PermissionDenied { .. })
    ));
    assert_eq!(sequencer.stage(), CaptureStage::Idle);
    assert!(!sequencer.has_session());
    assert_eq!(probe.live_feeds(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_while_switching_releases_everything() {
    let (sequencer, probe) = engine(SyntheticBackend::new());
    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let mut sequencer = sequencer.with_progress(progress_tx);
    let (tx, mut rx) = mpsc::channel(16);

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(ControlEvent::PressEnd).await.unwrap();
        while let Some(progress) = progress_rx.recv().await {
            if matches!(progress, Progress::Switching { .. }) {
                tx.send(ControlEvent::Cancel).await.unwrap();
                break;
            }
        }
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Rear, &mut rx), script);

    assert!(outcome.unwrap().is_none(), "cancel must not yield a result");
    assert_eq!(sequencer.stage(), CaptureStage::Idle);
    assert!(!sequencer.has_session());
    assert_eq!(probe.live_feeds(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_primary_recording_discards_partial_media() {
    let (mut sequencer, probe) = engine(SyntheticBackend::new());
    let (tx, mut rx) = mpsc::channel(16);

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        tx.send(ControlEvent::Cancel).await.unwrap();
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Rear, &mut rx), script);

    assert!(outcome.unwrap().is_none());
    assert_eq!(sequencer.stage(), CaptureStage::Idle);
    assert_eq!(probe.live_feeds(), 0);
    // Only the phase-1 session was ever opened.
    assert_eq!(probe.opens(), 1);
}

#[tokio::test(start_paused = true)]
async fn sequencer_is_reusable_after_cancel() {
    let (mut sequencer, probe) = engine(SyntheticBackend::new());
    let (tx, mut rx) = mpsc::channel(16);

    let script = async {
        tx.send(ControlEvent::Cancel).await.unwrap();
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Rear, &mut rx), script);
    assert!(outcome.unwrap().is_none());

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(ControlEvent::PressEnd).await.unwrap();
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Front, &mut rx), script);
    let result = outcome.unwrap().expect("fresh sequence after cancel");
    assert_eq!(result.mode, CaptureMode::Photo);
    assert_eq!(result.primary_facing, CameraFacing::Front);
    assert_eq!(probe.live_feeds(), 0);
}

#[tokio::test(start_paused = true)]
async fn cold_feed_aborts_the_sequence() {
    // Warm-up of 1: the primary grab sees no frame and the sequence
    // aborts instead of blindly retrying.
    let (mut sequencer, probe) = engine(SyntheticBackend::new().with_warmup(1));
    let (tx, mut rx) = mpsc::channel(16);

    let script = async {
        tx.send(ControlEvent::PressStart).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(ControlEvent::PressEnd).await.unwrap();
    };
    let (outcome, ()) = tokio::join!(sequencer.run(CameraFacing::Rear, &mut rx), script);

    assert!(matches!(
        outcome.unwrap_err(),
        CaptureError::Grab(dualshot_common::error::GrabError::NoFrameAvailable)
    ));
    assert_eq!(sequencer.stage(), CaptureStage::Idle);
    assert_eq!(probe.live_feeds(), 0);
}
