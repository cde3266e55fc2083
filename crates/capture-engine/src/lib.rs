//! ScreenBridge Capture Engine
//!
//! Owns the recording lifecycle. The [`CaptureManager`] resolves what to
//! record through a platform [`CaptureBackend`], turns the request into a
//! [`RecordingPlan`], and hands the plan to a [`MediaEngine`] that runs it.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │                CaptureManager                 │
//! │  ┌──────────────┐  plan   ┌────────────────┐  │
//! │  │CaptureBackend│───────▶│  MediaEngine   │  │
//! │  │ linux/mac/win│         │ gst/simulated  │  │
//! │  └──────┬───────┘         └───────┬────────┘  │
//! │         │ enumerate               │ pipeline  │
//! │         ▼                         ▼           │
//! │   displays/windows          output file       │
//! └───────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod engine;
pub mod manager;
pub mod pipeline;
pub mod recording;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{get_backend, CaptureBackend, CaptureTarget, SourceElement};
pub use engine::{default_engine, EngineSettings, MediaEngine, SimulatedEngine};
pub use manager::*;
pub use pipeline::{CapturePipeline, Container, RecordingPlan};
pub use recording::*;
