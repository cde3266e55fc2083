//! List capturable windows.

use screenbridge_capture_engine::CaptureManager;
use screenbridge_common::config::AppConfig;
use screenbridge_platform_core::WindowFilter;

pub fn run(config: &AppConfig, untitled: bool, hidden: bool, json: bool) -> anyhow::Result<()> {
    let manager = CaptureManager::from_config(config);
    let windows = manager.windows(WindowFilter {
        include_untitled: untitled,
        include_hidden: hidden,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&windows)?);
        return Ok(());
    }

    if windows.is_empty() {
        println!("No windows matched.");
        return Ok(());
    }

    println!("{:<12} {:<20} {:>11}  {}", "ID", "OWNER", "SIZE", "TITLE");
    for w in &windows {
        println!(
            "{:<12} {:<20} {:>11}  {}{}",
            w.id,
            w.owner,
            format!("{}x{}", w.width, w.height),
            w.name,
            if w.on_screen { "" } else { " (hidden)" }
        );
    }
    Ok(())
}
