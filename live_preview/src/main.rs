// THEORY:
// `live_preview` is the interactive front end of the detector: it reads the
// default camera, runs every frame through a `MotionPipeline` and shows the
// annotated result until Escape is pressed or the camera stops delivering.
//
// The loop per frame is: capture, poll the keyboard, analyze, display. The
// first frame only primes the detector, so the window appears with the second.

mod camera;

use anyhow::{Context, Result};
use camera::{CameraSession, PreviewWindow};
use motion_regions::{DetectorConfig, MotionPipeline};

const CAMERA_INDEX: i32 = 0;
const WINDOW_NAME: &str = "mag_flow";
const KEY_POLL_MS: i32 = 5;
const ESCAPE: u8 = 27;

fn main() -> Result<()> {
    env_logger::init();

    let mut camera = CameraSession::open(CAMERA_INDEX).context("failed to start capture")?;
    let mut window = PreviewWindow::new(WINDOW_NAME);
    let mut pipeline = MotionPipeline::new(DetectorConfig::default());

    loop {
        let frame = match camera.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("camera stopped delivering frames");
                break;
            }
            Err(e) => {
                log::error!("error reading frame: {e}");
                break;
            }
        };

        if window.poll_key(KEY_POLL_MS)? == Some(ESCAPE) {
            log::info!("escape pressed, stopping");
            break;
        }

        let analysis = pipeline
            .process_frame(&frame)
            .with_context(|| format!("failed to analyze frame {}", pipeline.frame_count()))?;
        if let Some(analysis) = analysis {
            log::debug!("{} moving regions", analysis.regions.len());
            window.show(&analysis.rendered).context("failed to display frame")?;
        }
    }

    log::info!("processed {} frames", pipeline.frame_count());
    Ok(())
}
