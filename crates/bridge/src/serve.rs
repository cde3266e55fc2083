//! Stdio serve loop.

use std::io::{BufRead, Write};
use std::sync::{Mutex, MutexGuard};

use screenbridge_capture_engine::CaptureManager;
use screenbridge_common::error::ScreenBridgeResult;

use crate::dispatch::Dispatcher;
use crate::protocol::{to_jsonl, BridgeError, ErrorKind, Response, PROTOCOL_VERSION};

/// Answer requests from `input` on `output` until `input` closes.
///
/// The manager is locked for one request at a time. However the loop ends,
/// including on a read or write error, the manager is shut down, which
/// finalizes any active recording. Returns the number of requests handled.
pub fn serve<R: BufRead, W: Write>(
    manager: &Mutex<CaptureManager>,
    dispatcher: &Dispatcher,
    mut input: R,
    mut output: W,
) -> ScreenBridgeResult<usize> {
    tracing::info!(protocol = PROTOCOL_VERSION, "Bridge serving on stdio");
    let _shutdown = ShutdownOnExit(manager);

    let mut handled = 0;
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                dispatcher.handle_line(&mut lock(manager), line)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected request that is not UTF-8");
                Response::failure(
                    None,
                    BridgeError::new(ErrorKind::ParseError, format!("Invalid request: {e}")),
                )
            }
        };

        output.write_all(to_jsonl(&response)?.as_bytes())?;
        output.flush()?;
        handled += 1;
    }

    tracing::info!(handled, "Host closed the bridge; shutting down");
    Ok(handled)
}

/// Shuts the manager down when the serve loop exits by any path.
struct ShutdownOnExit<'a>(&'a Mutex<CaptureManager>);

impl Drop for ShutdownOnExit<'_> {
    fn drop(&mut self) {
        lock(self.0).shutdown();
    }
}

/// Lock the manager, recovering from a panic in an earlier holder.
pub fn lock(manager: &Mutex<CaptureManager>) -> MutexGuard<'_, CaptureManager> {
    manager.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("Capture manager lock was poisoned; continuing");
        poisoned.into_inner()
    })
}
