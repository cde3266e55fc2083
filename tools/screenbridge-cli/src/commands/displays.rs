//! List connected displays.

use screenbridge_capture_engine::CaptureManager;
use screenbridge_common::config::AppConfig;
use screenbridge_platform_core::virtual_desktop_bounds;

pub fn run(config: &AppConfig, json: bool) -> anyhow::Result<()> {
    let manager = CaptureManager::from_config(config);
    let displays = manager.displays()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&displays)?);
        return Ok(());
    }

    if displays.is_empty() {
        println!("No displays detected.");
        return Ok(());
    }

    println!("{:<12} {:<20} {:>11} {:>12}", "ID", "NAME", "SIZE", "ORIGIN");
    for d in &displays {
        println!(
            "{:<12} {:<20} {:>11} {:>12} {}",
            d.id,
            d.name,
            format!("{}x{}", d.width, d.height),
            format!("{},{}", d.x, d.y),
            if d.primary { "(primary)" } else { "" }
        );
    }

    let (x, y, width, height) = virtual_desktop_bounds(&displays);
    println!();
    println!("Virtual desktop: {width}x{height} at {x},{y}");
    Ok(())
}
