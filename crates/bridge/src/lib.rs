//! ScreenBridge host bridge.
//!
//! A host script drives the capture manager by writing one JSON request per
//! line to the process's stdin and reading one JSON response per line from
//! stdout:
//!
//! ```text
//! → {"id":1,"method":"init"}
//! ← {"id":1,"ok":true,"result":true}
//! → {"id":2,"method":"startRecording","params":["/tmp/demo.mp4",{"fps":30}]}
//! ← {"id":2,"ok":true,"result":true}
//! → {"id":3,"method":"stopRecording"}
//! ← {"id":3,"ok":true,"result":{"path":"/tmp/demo.mp4","durationSecs":4.2,"bytesWritten":913408}}
//! ```

pub mod dispatch;
pub mod options;
pub mod protocol;
pub mod serve;

pub use dispatch::{Dispatcher, METHODS};
pub use options::{RecordingOptions, WindowListOptions};
pub use protocol::*;
pub use serve::serve;
