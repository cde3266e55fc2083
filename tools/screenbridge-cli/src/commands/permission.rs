//! Query or request screen recording permission.

use screenbridge_capture_engine::CaptureManager;
use screenbridge_common::config::AppConfig;

pub fn run(config: &AppConfig, request: bool) -> anyhow::Result<()> {
    let mut manager = CaptureManager::from_config(config);

    let granted = if request && !manager.check_screen_permission() {
        println!("Requesting screen recording permission...");
        manager.request_screen_permission()
    } else {
        manager.check_screen_permission()
    };

    if granted {
        println!("[OK] Screen recording permitted");
    } else {
        println!("[MISSING] Screen recording not permitted");
        if !request {
            println!("     Fix: run `screenbridge permission --request`");
        }
    }
    Ok(())
}
