// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::config::CameraKind;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "webcam-scrubber")]
#[command(about = "Capture webcam frames and scrub through them", long_about = None)]
pub struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Camera backend
    #[arg(long, value_enum)]
    pub camera: Option<CameraKind>,

    /// Webcam device index
    #[arg(long)]
    pub device: Option<u32>,

    /// Requested capture width
    #[arg(long)]
    pub width: Option<u32>,

    /// Requested capture height
    #[arg(long)]
    pub height: Option<u32>,

    /// Loop and capture rate in frames per second
    #[arg(long = "frame-rate")]
    pub frame_rate: Option<f32>,

    /// Longest span of frames kept in memory, in seconds
    #[arg(long = "max-seconds")]
    pub max_seconds: Option<f32>,

    /// Directory recordings are written to
    #[arg(long = "output-dir")]
    pub output_dir: Option<PathBuf>,

    /// Start in encode-to-disk mode instead of buffer-to-memory
    #[arg(long, default_value = "false")]
    pub disk: bool,

    /// Log free memory every two seconds
    #[arg(long = "memory-log", default_value = "false")]
    pub memory_log: bool,

    /// Disable window title stats
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,
}
