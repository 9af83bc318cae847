use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::camera::picam::PiCameraSettings;
use crate::cli::Cli;
use crate::recorder::RecorderConfig;

/// Camera backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CameraKind {
    /// Pi camera on a Raspberry Pi, webcam elsewhere
    Auto,
    Webcam,
    Picam,
    TestPattern,
}

/// Runtime configuration, read from JSON and overridden by CLI flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera: CameraKind,
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    /// Rate requested from the webcam driver
    pub desired_frame_rate: u32,
    /// Render loop rate, also the capture rate that sizes the buffer
    pub frame_rate: f32,
    pub max_seconds: f32,
    pub start_on_disk: bool,
    /// None enables the memory log only for the Pi camera
    pub memory_log: Option<bool>,
    pub show_stats: bool,
    pub recorder: RecorderConfig,
    pub picam: PiCameraSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraKind::Auto,
            device_index: 0,
            width: 640,
            height: 480,
            desired_frame_rate: 60,
            frame_rate: 25.0,
            max_seconds: 99999.0,
            start_on_disk: false,
            memory_log: None,
            show_stats: true,
            recorder: RecorderConfig::default(),
            picam: PiCameraSettings::default(),
        }
    }
}

impl Config {
    /// Parse a JSON config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the effective config: file (if any), then CLI overrides
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(camera) = cli.camera {
            self.camera = camera;
        }
        if let Some(device) = cli.device {
            self.device_index = device;
        }
        if let Some(width) = cli.width {
            self.width = width;
        }
        if let Some(height) = cli.height {
            self.height = height;
        }
        if let Some(rate) = cli.frame_rate {
            self.frame_rate = rate;
        }
        if let Some(seconds) = cli.max_seconds {
            self.max_seconds = seconds;
        }
        if let Some(dir) = &cli.output_dir {
            self.recorder.output_dir = dir.clone();
        }
        if cli.disk {
            self.start_on_disk = true;
        }
        if cli.memory_log {
            self.memory_log = Some(true);
        }
        if cli.no_ui {
            self.show_stats = false;
        }
    }

    /// Whether the periodic free-memory log runs for the resolved camera
    pub fn memory_log_enabled(&self, camera: CameraKind) -> bool {
        self.memory_log.unwrap_or(camera == CameraKind::Picam)
    }
}
