//! Recording plans and the pipelines that run them.
//!
//! A [`RecordingPlan`] is rendered into a GStreamer launch description:
//!
//! ```text
//! video source ! queue ! videoconvert ! videoscale ! videorate ! caps
//!              ! x264enc ! h264parse ! queue ! mux.
//! audio source ! queue ! audioconvert ! audioresample ! caps
//!              ! avenc_aac ! aacparse ! queue ! mux.
//! <muxer> name=mux ! filesink
//! ```

use std::path::{Path, PathBuf};

use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};

use crate::backend::SourceElement;

/// Output container, chosen from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Mp4,
    QuickTime,
    Matroska,
    Flv,
}

impl Container {
    pub fn from_path(path: &Path) -> ScreenBridgeResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "mp4" | "m4v" => Ok(Self::Mp4),
            "mov" => Ok(Self::QuickTime),
            "mkv" => Ok(Self::Matroska),
            "flv" => Ok(Self::Flv),
            _ => Err(ScreenBridgeError::config(format!(
                "Unsupported output container for {} (use .mp4, .m4v, .mov, .mkv, or .flv)",
                path.display()
            ))),
        }
    }

    pub fn muxer(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4mux",
            Self::QuickTime => "qtmux",
            Self::Matroska => "matroskamux",
            Self::Flv => "flvmux",
        }
    }
}

/// Audio branch of a recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPlan {
    pub source: SourceElement,
    pub bitrate_kbps: u32,
    pub sample_rate: u32,
}

/// Everything needed to build one recording pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPlan {
    pub output: PathBuf,
    pub container: Container,
    pub video: SourceElement,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_bitrate_kbps: u32,
    pub audio: Option<AudioPlan>,
}

impl RecordingPlan {
    /// Element factories the plan instantiates, sources first.
    pub fn required_elements(&self) -> Vec<&'static str> {
        let mut elements = vec![self.video.factory];
        if let Some(audio) = &self.audio {
            elements.push(audio.source.factory);
        }
        elements.extend(VIDEO_CHAIN);
        if self.audio.is_some() {
            elements.extend(AUDIO_CHAIN);
        }
        elements.push(self.container.muxer());
        elements.push("filesink");
        elements
    }

    /// Render the plan as a `gst-launch` style description.
    pub fn launch_description(&self) -> String {
        let path = escape_path(&self.output);
        // One keyframe every 2 seconds allows reasonable seeking while
        // keeping file size low.
        let keyint = self.fps.saturating_mul(2).max(2);
        let mut launch = format!(
            "{video} ! queue max-size-buffers=200 leaky=downstream ! videoconvert ! videoscale ! videorate ! video/x-raw,width={width},height={height},framerate={fps}/1 ! x264enc tune=zerolatency speed-preset=veryfast bitrate={bitrate} key-int-max={keyint} ! h264parse ! queue max-size-buffers=8 ! mux.",
            video = self.video,
            width = self.width,
            height = self.height,
            fps = self.fps,
            bitrate = self.video_bitrate_kbps,
        );

        if let Some(audio) = &self.audio {
            launch.push_str(&format!(
                " {source} ! queue max-size-time=1000000000 leaky=downstream ! audioconvert ! audioresample ! audio/x-raw,rate={rate},channels=2 ! avenc_aac bitrate={bps} ! aacparse ! queue ! mux.",
                source = audio.source,
                rate = audio.sample_rate,
                bps = u64::from(audio.bitrate_kbps) * 1000,
            ));
        }

        launch.push_str(&format!(
            " {muxer} name=mux ! filesink location=\"{path}\"",
            muxer = self.container.muxer()
        ));
        launch
    }
}

const VIDEO_CHAIN: [&str; 6] = [
    "queue",
    "videoconvert",
    "videoscale",
    "videorate",
    "x264enc",
    "h264parse",
];

/// Encoding elements of the audio branch.
pub const AUDIO_CHAIN: [&str; 4] = ["audioconvert", "audioresample", "avenc_aac", "aacparse"];

/// Trait for a running media capture pipeline.
pub trait CapturePipeline: Send {
    /// Start the pipeline.
    fn start(&mut self) -> ScreenBridgeResult<()>;

    /// Stop the pipeline and finalize output.
    fn stop(&mut self) -> ScreenBridgeResult<()>;

    /// Check if the pipeline is currently running.
    fn is_running(&self) -> bool;
}

/// Escape a path for a quoted launch property. The launch parser drops a
/// backslash before any character, so backslashes are doubled first.
fn escape_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
}

#[cfg(feature = "gstreamer")]
pub use gst_pipeline::{init_gstreamer, GstCapturePipeline};

#[cfg(feature = "gstreamer")]
mod gst_pipeline {
    use std::sync::OnceLock;
    use std::time::{Duration, Instant};

    use gst::prelude::*;
    use gstreamer as gst;
    use screenbridge_common::error::{ScreenBridgeError, ScreenBridgeResult};

    use super::CapturePipeline;

    const EOS_DRAIN_DEADLINE: Duration = Duration::from_secs(10);

    pub struct GstCapturePipeline {
        name: String,
        pipeline: gst::Pipeline,
        running: bool,
    }

    impl GstCapturePipeline {
        pub fn from_launch(name: impl Into<String>, launch: &str) -> ScreenBridgeResult<Self> {
            init_gstreamer()?;

            let element = gst::parse::launch(launch).map_err(|e| {
                ScreenBridgeError::engine(format!("Failed to build pipeline: {e}"))
            })?;

            let pipeline = element.dynamic_cast::<gst::Pipeline>().map_err(|_| {
                ScreenBridgeError::engine("Launch string did not produce a pipeline")
            })?;

            Ok(Self {
                name: name.into(),
                pipeline,
                running: false,
            })
        }

        /// Wait for EOS to propagate through the entire pipeline so the
        /// muxer can finalize the container.
        fn drain(&self) {
            let Some(bus) = self.pipeline.bus() else {
                return;
            };

            let start = Instant::now();
            loop {
                let elapsed = start.elapsed();
                if elapsed >= EOS_DRAIN_DEADLINE {
                    tracing::warn!(pipeline = %self.name, "EOS drain timed out after 10s");
                    break;
                }
                let remaining = EOS_DRAIN_DEADLINE - elapsed;
                let timeout = gst::ClockTime::from_nseconds(remaining.as_nanos() as u64);

                match bus.timed_pop(timeout) {
                    Some(msg) => match msg.view() {
                        gst::MessageView::Eos(_) => {
                            tracing::debug!(pipeline = %self.name, "EOS received; pipeline drained");
                            break;
                        }
                        gst::MessageView::Error(e) => {
                            tracing::warn!(
                                pipeline = %self.name,
                                error = %e.error(),
                                "Pipeline error during EOS drain"
                            );
                            break;
                        }
                        _ => {}
                    },
                    None => {
                        tracing::warn!(pipeline = %self.name, "EOS drain timed out after 10s");
                        break;
                    }
                }
            }
        }

        /// First error already posted on the bus, if any.
        fn pending_error(&self) -> Option<String> {
            let bus = self.pipeline.bus()?;
            while let Some(msg) = bus.pop() {
                if let gst::MessageView::Error(e) = msg.view() {
                    return Some(e.error().to_string());
                }
            }
            None
        }
    }

    impl CapturePipeline for GstCapturePipeline {
        fn start(&mut self) -> ScreenBridgeResult<()> {
            self.pipeline.set_state(gst::State::Playing).map_err(|e| {
                let detail = self.pending_error().unwrap_or_else(|| format!("{e:?}"));
                let _ = self.pipeline.set_state(gst::State::Null);
                ScreenBridgeError::engine(format!("Failed to start {} pipeline: {detail}", self.name))
            })?;

            // State changes are async; wait so the capture source is open
            // before we report success.
            match self.pipeline.state(gst::ClockTime::from_seconds(10)) {
                (Ok(_), gst::State::Playing, _) => {}
                (Ok(_), state, _) => {
                    tracing::warn!(
                        pipeline = %self.name,
                        ?state,
                        "Pipeline did not reach Playing state within timeout"
                    );
                }
                (Err(e), _, _) => {
                    let detail = self.pending_error().unwrap_or_else(|| format!("{e:?}"));
                    let _ = self.pipeline.set_state(gst::State::Null);
                    return Err(ScreenBridgeError::engine(format!(
                        "{} pipeline failed to reach Playing state: {detail}",
                        self.name
                    )));
                }
            }

            self.running = true;
            Ok(())
        }

        fn stop(&mut self) -> ScreenBridgeResult<()> {
            if !self.pipeline.send_event(gst::event::Eos::new()) {
                tracing::warn!(pipeline = %self.name, "Failed to send EOS event; output may be truncated");
            } else {
                self.drain();
            }

            self.running = false;
            self.pipeline.set_state(gst::State::Null).map_err(|e| {
                ScreenBridgeError::engine(format!("Failed to stop {} pipeline: {e:?}", self.name))
            })?;
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    impl Drop for GstCapturePipeline {
        fn drop(&mut self) {
            if self.running {
                let _ = self.pipeline.set_state(gst::State::Null);
            }
        }
    }

    pub fn init_gstreamer() -> ScreenBridgeResult<()> {
        static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
        let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
        match init_res {
            Ok(()) => Ok(()),
            Err(e) => Err(ScreenBridgeError::engine(format!(
                "Failed to initialize GStreamer: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(output: &str, audio: bool) -> RecordingPlan {
        RecordingPlan {
            output: PathBuf::from(output),
            container: Container::from_path(Path::new(output)).unwrap(),
            video: SourceElement::new("ximagesrc").with("show-pointer", true),
            width: 1280,
            height: 720,
            fps: 30,
            video_bitrate_kbps: 4000,
            audio: audio.then(|| AudioPlan {
                source: SourceElement::new("pulsesrc").with("device", "@DEFAULT_MONITOR@"),
                bitrate_kbps: 160,
                sample_rate: 48000,
            }),
        }
    }

    #[test]
    fn container_follows_extension() {
        assert_eq!(Container::from_path(Path::new("a.MP4")).unwrap(), Container::Mp4);
        assert_eq!(Container::from_path(Path::new("a.m4v")).unwrap().muxer(), "mp4mux");
        assert_eq!(Container::from_path(Path::new("a.mov")).unwrap().muxer(), "qtmux");
        assert_eq!(Container::from_path(Path::new("a.mkv")).unwrap().muxer(), "matroskamux");
        assert_eq!(Container::from_path(Path::new("a.flv")).unwrap().muxer(), "flvmux");
    }

    #[test]
    fn container_rejects_unknown_extension() {
        let err = Container::from_path(Path::new("/tmp/out.avi")).unwrap_err();
        assert!(err.to_string().contains("Unsupported output container"));
        assert!(Container::from_path(Path::new("/tmp/out")).is_err());
    }

    #[test]
    fn video_only_plan_renders_single_branch() {
        let launch = plan("/tmp/out.mkv", false).launch_description();
        assert!(launch.starts_with("ximagesrc show-pointer=true ! queue"));
        assert!(launch.contains("video/x-raw,width=1280,height=720,framerate=30/1"));
        assert!(launch.contains("x264enc tune=zerolatency speed-preset=veryfast bitrate=4000 key-int-max=60"));
        assert!(launch.ends_with("matroskamux name=mux ! filesink location=\"/tmp/out.mkv\""));
        assert!(!launch.contains("avenc_aac"));
    }

    #[test]
    fn audio_plan_adds_aac_branch() {
        let launch = plan("/tmp/out.mp4", true).launch_description();
        assert!(launch.contains(
            "pulsesrc device=@DEFAULT_MONITOR@ ! queue max-size-time=1000000000 leaky=downstream ! audioconvert"
        ));
        assert!(launch.contains("audio/x-raw,rate=48000,channels=2 ! avenc_aac bitrate=160000 ! aacparse"));
        assert_eq!(launch.matches("mux.").count(), 2);
        assert!(launch.contains("mp4mux name=mux"));
    }

    #[test]
    fn output_path_quotes_are_escaped() {
        let launch = plan("/tmp/my \"take\".mkv", false).launch_description();
        assert!(launch.ends_with("filesink location=\"/tmp/my \\\"take\\\".mkv\""));
    }

    #[test]
    fn windows_path_backslashes_survive_launch_parsing() {
        let launch = plan("C:\\Users\\me\\out.mp4", false).launch_description();
        assert!(launch.ends_with("filesink location=\"C:\\\\Users\\\\me\\\\out.mp4\""));
        assert_eq!(escape_path(Path::new("a\\\"b")), "a\\\\\\\"b");
    }

    #[test]
    fn required_elements_cover_every_stage() {
        let elements = plan("/tmp/out.mov", true).required_elements();
        assert_eq!(elements[0], "ximagesrc");
        assert_eq!(elements[1], "pulsesrc");
        for name in ["x264enc", "avenc_aac", "qtmux", "filesink"] {
            assert!(elements.contains(&name), "missing {name}");
        }
        let video_only = plan("/tmp/out.mov", false).required_elements();
        assert!(!video_only.contains(&"avenc_aac"));
    }
}
