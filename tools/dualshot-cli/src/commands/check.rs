//! Report camera backend availability.

use dualshot_camera::CameraBackend;
use dualshot_camera::synthetic::SyntheticBackend;

pub fn run() -> anyhow::Result<()> {
    println!("Camera backends:");

    let synthetic = SyntheticBackend::new();
    println!(
        "  {:<16} {}",
        synthetic.name(),
        availability(synthetic.is_available())
    );

    #[cfg(feature = "backend-gstreamer")]
    {
        let gst = dualshot_camera::gst::GstBackend::new();
        println!("  {:<16} {}", gst.name(), availability(gst.is_available()));
    }
    #[cfg(not(feature = "backend-gstreamer"))]
    println!("  gstreamer-v4l2   not built (enable the backend-gstreamer feature)");

    let default = dualshot_camera::default_backend();
    println!("\nDefault backend: {}", default.name());
    Ok(())
}

fn availability(available: bool) -> &'static str {
    if available {
        "available"
    } else {
        "unavailable"
    }
}
