//! Serve the host protocol on stdio.

use std::io;

use screenbridge_bridge::{serve, Dispatcher};
use screenbridge_capture_engine::CaptureManager;
use screenbridge_common::config::AppConfig;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    let manager = CaptureManager::global_with(config);
    let dispatcher = Dispatcher::new(config.recording.clone());

    let handled = serve(manager, &dispatcher, io::stdin().lock(), io::stdout().lock())?;
    tracing::debug!(handled, "Bridge session finished");
    Ok(())
}
