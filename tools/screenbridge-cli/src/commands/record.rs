//! Record a display, window or application to a file.

use std::time::Duration;

use screenbridge_capture_engine::{CaptureManager, RecordingConfig, SourceType};
use screenbridge_common::config::AppConfig;

use crate::RecordArgs;

pub async fn run(config: &AppConfig, args: RecordArgs) -> anyhow::Result<()> {
    if let Some(secs) = args.duration {
        anyhow::ensure!(
            secs.is_finite() && secs > 0.0,
            "--duration must be a positive number of seconds"
        );
    }
    let recording = recording_config(config, &args);

    println!("Recording to: {}", args.output.display());
    println!("  Source: {}", recording.source_type);
    println!("  Size: {}x{} @ {} fps", recording.width, recording.height, recording.fps);
    println!("  Video bitrate: {} kbit/s", recording.video_bitrate_kbps);
    println!("  System audio: {}", recording.capture_audio);
    println!("  Cursor: {}", recording.capture_cursor);
    println!();

    let mut manager = CaptureManager::from_config(config);
    manager.initialize()?;
    manager.start_recording(&args.output, &recording)?;

    match args.duration {
        Some(secs) => {
            println!("Recording for {secs} s (Ctrl+C stops early)...");
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs_f64(secs)) => {}
                result = tokio::signal::ctrl_c() => result?,
            }
        }
        None => {
            println!("Press Ctrl+C to stop recording...");
            tokio::signal::ctrl_c().await?;
        }
    }

    println!();
    match manager.stop_recording()? {
        Some(summary) => println!(
            "Recording saved to: {} ({:.1} s, {} bytes)",
            summary.path.display(),
            summary.duration_secs,
            summary.bytes_written
        ),
        None => println!("No recording was active."),
    }
    manager.shutdown();

    Ok(())
}

fn recording_config(config: &AppConfig, args: &RecordArgs) -> RecordingConfig {
    let mut recording = RecordingConfig::from(&config.recording);

    if let Some(display) = &args.display {
        recording.display_id = display.clone();
    }
    if let Some(window) = args.window {
        recording.source_type = SourceType::Window;
        recording.window_id = window;
    } else if let Some(app) = &args.app {
        recording.source_type = SourceType::Application;
        recording.application_id = app.clone();
    }
    if let Some(width) = args.width {
        recording.width = width;
    }
    if let Some(height) = args.height {
        recording.height = height;
    }
    if let Some(fps) = args.fps {
        recording.fps = fps;
    }
    if let Some(kbps) = args.video_bitrate {
        recording.video_bitrate_kbps = kbps;
    }
    if let Some(kbps) = args.audio_bitrate {
        recording.audio_bitrate_kbps = kbps;
    }
    if args.no_audio {
        recording.capture_audio = false;
    }
    if args.no_cursor {
        recording.capture_cursor = false;
    }
    recording
}
