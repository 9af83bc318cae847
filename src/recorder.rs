//! Video file recording through an `ffmpeg` child process
//!
//! Raw RGB frames are piped to ffmpeg's stdin. Closing a recording hands the
//! process to a finalizer thread; when ffmpeg exits, a [`RecordingComplete`]
//! arrives on the channel returned by [`FfmpegRecorder::new`].

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use serde::{Deserialize, Serialize};

use crate::core::Frame;

/// Recorder settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub ffmpeg_path: String,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub extension: String,
    pub video_codec: String,
    pub audio_codec: String,
    pub pixel_format: String,
    pub bitrate: Option<String>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            output_dir: PathBuf::from("."),
            file_prefix: "capture".to_string(),
            extension: "mp4".to_string(),
            video_codec: "libx264".to_string(),
            audio_codec: "aac".to_string(),
            pixel_format: "yuv420p".to_string(),
            bitrate: None,
        }
    }
}

/// Notification that a recording file has been finalized
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingComplete {
    pub path: PathBuf,
    pub frames: u64,
    pub success: bool,
}

/// Encoder collaborator driven by the capture tick
pub trait Encoder {
    /// Start a new file with fixed geometry
    fn open(&mut self, path: &Path, width: u32, height: u32, frame_rate: f32) -> Result<()>;

    /// Append one frame to the open file
    fn add_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Finish the open file; completion is reported asynchronously
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Path of the next file to open
    fn next_path(&self) -> PathBuf;
}

/// Output path `<dir>/<prefix>_<timestamp>.<ext>`
pub fn timestamped_path(dir: &Path, prefix: &str, extension: &str, now: DateTime<Local>) -> PathBuf {
    let stamp = now.format("%Y-%m-%d-%H-%M-%S-%3f");
    dir.join(format!("{}_{}.{}", prefix, stamp, extension))
}

/// Builds ffmpeg arguments for a raw RGB stdin stream
#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    width: u32,
    height: u32,
    framerate: f32,
    video_codec: String,
    pixel_format: String,
    bitrate: Option<String>,
    output_path: String,
}

impl FfmpegCommandBuilder {
    pub fn new(output_path: &Path, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            framerate: 25.0,
            video_codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            bitrate: None,
            output_path: output_path.to_string_lossy().to_string(),
        }
    }

    pub fn with_framerate(mut self, framerate: f32) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn with_video_codec(mut self, codec: &str) -> Self {
        self.video_codec = codec.to_string();
        self
    }

    pub fn with_pixel_format(mut self, format: &str) -> Self {
        self.pixel_format = format.to_string();
        self
    }

    pub fn with_bitrate(mut self, bitrate: Option<String>) -> Self {
        self.bitrate = bitrate;
        self
    }

    pub fn build(&self) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(), "error".to_string(),
            "-y".to_string(),
            "-f".to_string(), "rawvideo".to_string(),
            "-pix_fmt".to_string(), "rgb24".to_string(),
            "-s".to_string(), format!("{}x{}", self.width, self.height),
            "-r".to_string(), self.framerate.to_string(),
            "-i".to_string(), "-".to_string(),
            "-c:v".to_string(), self.video_codec.clone(),
            "-pix_fmt".to_string(), self.pixel_format.clone(),
        ];

        if let Some(bitrate) = &self.bitrate {
            args.push("-b:v".to_string());
            args.push(bitrate.clone());
        }

        args.push(self.output_path.clone());
        args
    }
}

/// Codec availability reported by `ffmpeg -encoders`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSupport {
    pub video: bool,
    pub audio: bool,
}

/// Check the configured codecs against an `ffmpeg -encoders` listing
pub fn parse_encoder_support(listing: &str, config: &RecorderConfig) -> EncoderSupport {
    let has = |codec: &str| {
        listing
            .lines()
            .any(|line| line.split_whitespace().nth(1) == Some(codec))
    };

    EncoderSupport {
        video: has(&config.video_codec),
        audio: has(&config.audio_codec),
    }
}

/// Startup check of the encoder; problems are logged, never fatal
pub fn probe(config: &RecorderConfig) -> Option<EncoderSupport> {
    let output = match Command::new(&config.ffmpeg_path)
        .args(["-hide_banner", "-encoders"])
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            log::warn!("Cannot run {}: {}; disk recording unavailable", config.ffmpeg_path, e);
            return None;
        }
    };

    let listing = String::from_utf8_lossy(&output.stdout);
    let support = parse_encoder_support(&listing, config);

    if !support.video {
        log::warn!("Video encoder {} not available in ffmpeg", config.video_codec);
    }
    if !support.audio {
        log::warn!("Audio encoder {} not available; audio samples cannot be encoded", config.audio_codec);
    }

    Some(support)
}

/// One file being written
struct Session {
    child: Child,
    stdin: Option<ChildStdin>,
    path: PathBuf,
    width: u32,
    height: u32,
    frames: u64,
}

impl Session {
    /// Close stdin and wait for ffmpeg to finish the container
    fn finish(mut self) -> RecordingComplete {
        drop(self.stdin.take());

        let success = match self.child.wait() {
            Ok(status) => status.success(),
            Err(e) => {
                log::warn!("Waiting for encoder failed: {}", e);
                false
            }
        };

        RecordingComplete {
            path: self.path,
            frames: self.frames,
            success,
        }
    }
}

/// ffmpeg-backed encoder
pub struct FfmpegRecorder {
    config: RecorderConfig,
    session: Option<Session>,
    completions: UnboundedSender<RecordingComplete>,
    finalizers: Vec<JoinHandle<()>>,
}

impl FfmpegRecorder {
    pub fn new(config: RecorderConfig) -> (Self, UnboundedReceiver<RecordingComplete>) {
        let (tx, rx) = unbounded();
        (
            Self {
                config,
                session: None,
                completions: tx,
                finalizers: Vec::new(),
            },
            rx,
        )
    }
}

impl Encoder for FfmpegRecorder {
    fn open(&mut self, path: &Path, width: u32, height: u32, frame_rate: f32) -> Result<()> {
        if self.session.is_some() {
            bail!("Recorder already writing");
        }

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let args = FfmpegCommandBuilder::new(path, width, height)
            .with_framerate(frame_rate)
            .with_video_codec(&self.config.video_codec)
            .with_pixel_format(&self.config.pixel_format)
            .with_bitrate(self.config.bitrate.clone())
            .build();

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("Failed to start {}", self.config.ffmpeg_path))?;

        let stdin = child.stdin.take().context("Encoder process has no stdin")?;

        log::info!("Recording to {} ({}x{} @ {} fps)", path.display(), width, height, frame_rate);
        self.session = Some(Session {
            child,
            stdin: Some(stdin),
            path: path.to_path_buf(),
            width,
            height,
            frames: 0,
        });
        Ok(())
    }

    fn add_frame(&mut self, frame: &Frame) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            bail!("Recorder is not open");
        };
        let Some(stdin) = session.stdin.as_mut() else {
            bail!("Encoder input already closed");
        };

        let rgb = if frame.dimensions() == (session.width, session.height) {
            frame.to_rgb()
        } else {
            frame.resized(session.width, session.height).to_rgb()
        };

        stdin
            .write_all(&rgb)
            .with_context(|| format!("Failed to write frame {} to encoder", session.frames))?;
        session.frames += 1;
        Ok(())
    }

    fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        let completions = self.completions.clone();
        let spawned = thread::Builder::new()
            .name("recorder-finalize".into())
            .spawn(move || {
                let complete = session.finish();
                // Receiver gone means the app is shutting down
                let _ = completions.unbounded_send(complete);
            });

        self.finalizers.retain(|handle| !handle.is_finished());
        match spawned {
            Ok(handle) => self.finalizers.push(handle),
            Err(e) => log::warn!("Failed to spawn recorder finalizer: {}", e),
        }
    }

    fn is_open(&self) -> bool {
        self.session.is_some()
    }

    fn next_path(&self) -> PathBuf {
        timestamped_path(
            &self.config.output_dir,
            &self.config.file_prefix,
            &self.config.extension,
            Local::now(),
        )
    }
}

impl Drop for FfmpegRecorder {
    fn drop(&mut self) {
        // Finish synchronously so the file is complete before exit
        if let Some(session) = self.session.take() {
            let complete = session.finish();
            log::info!(
                "Recording {} finalized at exit ({} frames)",
                complete.path.display(),
                complete.frames
            );
        }

        for handle in self.finalizers.drain(..) {
            if handle.join().is_err() {
                log::warn!("Recorder finalizer panicked");
            }
        }
    }
}
