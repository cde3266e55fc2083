//! Check system capabilities.

use screenbridge_capture_engine::CaptureManager;
use screenbridge_common::config::AppConfig;
use screenbridge_platform_core::{print_capability_report, Capability, WindowFilter};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("ScreenBridge System Check");
    println!("{}", "=".repeat(50));

    let mut manager = CaptureManager::from_config(config);
    let mut ready = true;

    match manager.initialize() {
        Ok(()) => {
            let status = manager.status();
            println!("[OK] Media engine: {}", status.engine);
            println!("[OK] Display server: {:?}", status.display_server);
        }
        Err(e) => {
            ready = false;
            println!("[MISSING] Capture manager failed to start: {e}");
        }
    }

    match manager.displays() {
        Ok(displays) => {
            println!("[OK] Displays detected: {}", displays.len());
            for d in &displays {
                println!(
                    "     {} {} {}x{} at {},{} {}",
                    d.id,
                    d.name,
                    d.width,
                    d.height,
                    d.x,
                    d.y,
                    if d.primary { "(primary)" } else { "" }
                );
            }
        }
        Err(e) => {
            ready = false;
            println!("[MISSING] Display enumeration: {e}");
        }
    }

    match manager.windows(WindowFilter::default()) {
        Ok(windows) => println!("[OK] Windows visible: {}", windows.len()),
        Err(e) => println!("[WARN] Window enumeration: {e}"),
    }

    if manager.is_capture_audio_supported() {
        println!("[OK] System audio capture available");
    } else {
        println!("[WARN] System audio capture unavailable; recordings will be video-only");
    }

    if manager.check_screen_permission() {
        println!("[OK] Screen recording permitted");
    } else {
        ready = false;
        println!("[MISSING] Screen recording permission");
        println!("     Fix: run `screenbridge permission --request`");
    }

    let capabilities = platform_capabilities();
    if !capabilities.is_empty() {
        println!();
        print_capability_report(&capabilities);
        ready &= capabilities
            .iter()
            .filter(|c| c.required)
            .all(|c| c.available);
    }

    manager.shutdown();

    println!();
    if ready {
        println!("All required capabilities are available. ScreenBridge is ready.");
    } else {
        println!("Some required capabilities are missing. See above for fixes.");
    }

    Ok(())
}

#[cfg(target_os = "linux")]
fn platform_capabilities() -> Vec<Capability> {
    screenbridge_platform_linux::permissions::check_capabilities()
}

#[cfg(not(target_os = "linux"))]
fn platform_capabilities() -> Vec<Capability> {
    Vec::new()
}
