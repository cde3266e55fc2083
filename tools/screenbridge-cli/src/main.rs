//! ScreenBridge CLI: list capture sources, record, and serve the host bridge.
//!
//! Usage:
//!   screenbridge displays            List connected displays
//!   screenbridge windows             List capturable windows
//!   screenbridge record <OUTPUT>     Record a display, window or application
//!   screenbridge check               Check system capabilities
//!   screenbridge permission          Query or request screen recording consent
//!   screenbridge bridge              Serve the JSONL protocol on stdio

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use screenbridge_common::config::AppConfig;
use screenbridge_common::logging::init_logging;

mod commands;

#[derive(Parser)]
#[command(
    name = "screenbridge",
    about = "Screen and window recording with a scriptable host bridge",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/screenbridge/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List connected displays
    Displays {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List capturable windows
    Windows {
        /// Include windows without a title
        #[arg(long)]
        untitled: bool,

        /// Include windows that are not on screen
        #[arg(long)]
        hidden: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Record to a file until Ctrl+C or the duration elapses
    Record(RecordArgs),

    /// Check system capabilities
    Check,

    /// Query screen recording permission
    Permission {
        /// Prompt for consent if it has not been granted
        #[arg(long)]
        request: bool,
    },

    /// Serve the host protocol on stdin/stdout
    Bridge,
}

#[derive(Args)]
pub struct RecordArgs {
    /// Output file (.mp4, .m4v, .mov, .mkv or .flv)
    pub output: PathBuf,

    /// Display id to record (defaults to the primary display)
    #[arg(long, conflicts_with_all = ["window", "app"])]
    pub display: Option<String>,

    /// Window id to record
    #[arg(long, conflicts_with = "app")]
    pub window: Option<u64>,

    /// Record the main window of this application
    #[arg(long)]
    pub app: Option<String>,

    /// Output width
    #[arg(long)]
    pub width: Option<u32>,

    /// Output height
    #[arg(long)]
    pub height: Option<u32>,

    /// Target FPS
    #[arg(long)]
    pub fps: Option<u32>,

    /// Video bitrate in kbit/s
    #[arg(long)]
    pub video_bitrate: Option<u32>,

    /// Audio bitrate in kbit/s
    #[arg(long)]
    pub audio_bitrate: Option<u32>,

    /// Disable system audio capture
    #[arg(long)]
    pub no_audio: bool,

    /// Leave the cursor out of the capture
    #[arg(long)]
    pub no_cursor: bool,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    init_logging(&config.logging);

    match cli.command {
        Commands::Displays { json } => commands::displays::run(&config, json),
        Commands::Windows {
            untitled,
            hidden,
            json,
        } => commands::windows::run(&config, untitled, hidden, json),
        Commands::Record(args) => commands::record::run(&config, args).await,
        Commands::Check => commands::check::run(&config),
        Commands::Permission { request } => commands::permission::run(&config, request),
        Commands::Bridge => commands::bridge::run(&config),
    }
}
