use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{CameraSource, LatestFrame};
use crate::core::{Frame, PixelFormat, Throttled};

/// Frame rate forced by reinitialization
pub const PI_FRAME_RATE: f32 = 25.0;

/// Pi camera settings, on the 0-100 / -100..100 scales of the camera firmware
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiCameraSettings {
    pub program: String,
    pub sensor_width: u32,
    pub sensor_height: u32,
    pub frame_rate: f32,
    /// Legacy sensor mode number of the v1 camera module
    pub sensor_mode: u8,
    /// 0 lets the camera choose
    pub iso: u32,
    /// 0-100, 50 is neutral
    pub brightness: i32,
    /// -100..100, 0 is neutral
    pub contrast: i32,
    pub sharpness: i32,
    pub saturation: i32,
    pub auto_iso: bool,
    pub auto_shutter: bool,
    /// Exposure in microseconds when auto shutter is off, 0 lets the camera choose
    pub shutter_us: u32,
}

impl Default for PiCameraSettings {
    fn default() -> Self {
        Self {
            program: "rpicam-vid".to_string(),
            sensor_width: 1280,
            sensor_height: 720,
            frame_rate: PI_FRAME_RATE,
            sensor_mode: 7,
            iso: 0,
            brightness: 50,
            contrast: 0,
            sharpness: 0,
            saturation: 0,
            auto_iso: false,
            auto_shutter: false,
            shutter_us: 0,
        }
    }
}

/// `--mode` value for the legacy v1 sensor mode numbers
fn sensor_mode_arg(mode: u8) -> Option<&'static str> {
    match mode {
        1 => Some("1920:1080:10:P"),
        2 | 3 => Some("2592:1944:10:P"),
        4 => Some("1296:972:10:P"),
        5 => Some("1296:730:10:P"),
        6 | 7 => Some("640:480:10:P"),
        _ => None,
    }
}

/// Map -100..100 onto the multiplicative 0..2 scale, 0 -> 1.0
fn gain_scale(value: i32) -> f32 {
    1.0 + value.clamp(-100, 100) as f32 / 100.0
}

impl PiCameraSettings {
    /// Bytes in one packed YUV420 frame
    pub fn frame_bytes(&self) -> usize {
        let luma = self.sensor_width as usize * self.sensor_height as usize;
        let chroma = (self.sensor_width as usize).div_ceil(2) * (self.sensor_height as usize).div_ceil(2);
        luma + 2 * chroma
    }

    /// Arguments for a raw YUV420 stream on stdout
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--nopreview".to_string(),
            "-t".to_string(), "0".to_string(),
            "--codec".to_string(), "yuv420".to_string(),
            "--width".to_string(), self.sensor_width.to_string(),
            "--height".to_string(), self.sensor_height.to_string(),
            "--framerate".to_string(), self.frame_rate.to_string(),
            "--brightness".to_string(), format!("{:.2}", (self.brightness.clamp(0, 100) - 50) as f32 / 50.0),
            "--contrast".to_string(), format!("{:.2}", gain_scale(self.contrast)),
            "--sharpness".to_string(), format!("{:.2}", gain_scale(self.sharpness)),
            "--saturation".to_string(), format!("{:.2}", gain_scale(self.saturation)),
        ];

        if let Some(mode) = sensor_mode_arg(self.sensor_mode) {
            args.extend(["--mode".to_string(), mode.to_string()]);
        }
        if !self.auto_iso && self.iso > 0 {
            args.extend(["--gain".to_string(), format!("{:.2}", self.iso as f32 / 100.0)]);
        }
        if !self.auto_shutter && self.shutter_us > 0 {
            args.extend(["--shutter".to_string(), self.shutter_us.to_string()]);
        }

        args.extend(["-o".to_string(), "-".to_string()]);
        args
    }
}

/// Convert a packed planar YUV420 frame (BT.601, limited range) to RGB
pub fn yuv420_to_rgb(data: &[u8], width: u32, height: u32) -> Option<Frame> {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    if data.len() < w * h + 2 * cw * ch {
        return None;
    }

    let (y_plane, rest) = data.split_at(w * h);
    let (u_plane, v_plane) = rest.split_at(cw * ch);

    let mut rgb = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        for col in 0..w {
            let y = y_plane[row * w + col] as f32 - 16.0;
            let chroma_idx = (row / 2) * cw + col / 2;
            let u = u_plane[chroma_idx] as f32 - 128.0;
            let v = v_plane[chroma_idx] as f32 - 128.0;

            let r = 1.164 * y + 1.596 * v;
            let g = 1.164 * y - 0.392 * u - 0.813 * v;
            let b = 1.164 * y + 2.017 * u;

            rgb.extend([r, g, b].map(|c| c.round().clamp(0.0, 255.0) as u8));
        }
    }

    Frame::new(width, height, PixelFormat::Rgb8, rgb)
}

/// Running `rpicam-vid` child and its stdout reader
struct Capture {
    child: Child,
    reader: Option<JoinHandle<()>>,
}

impl Capture {
    fn start(settings: &PiCameraSettings) -> Result<(Self, mpsc::Receiver<Frame>)> {
        log::info!("Setting up PiCam: {} {}", settings.program, settings.args().join(" "));

        let mut child = Command::new(&settings.program)
            .args(settings.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start {}", settings.program))?;

        let stdout = child
            .stdout
            .take()
            .context("Camera process has no stdout")?;

        let (tx, rx) = mpsc::sync_channel(2);
        let reader_settings = settings.clone();
        let reader = thread::Builder::new()
            .name("picam-reader".into())
            .spawn(move || read_loop(stdout, reader_settings, tx))
            .context("Failed to spawn camera reader")?;

        Ok((
            Self {
                child,
                reader: Some(reader),
            },
            rx,
        ))
    }

    /// Kill the process and wait for the reader to see end of stream
    fn stop(&mut self) {
        if let Err(e) = self.child.kill() {
            log::debug!("Camera process already gone: {}", e);
        }
        let _ = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for Capture {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop(mut stdout: impl Read, settings: PiCameraSettings, frames: SyncSender<Frame>) {
    let mut raw = vec![0u8; settings.frame_bytes()];

    loop {
        match stdout.read_exact(&mut raw) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                log::info!("Camera stream ended");
                return;
            }
            Err(e) => {
                log::warn!("Camera stream read failed: {}", e);
                return;
            }
        }

        let Some(frame) = yuv420_to_rgb(&raw, settings.sensor_width, settings.sensor_height) else {
            continue;
        };
        if let Err(TrySendError::Disconnected(_)) = frames.try_send(frame) {
            return;
        }
    }
}

/// Pi camera source: capture ticks are throttled to the frame rate rather
/// than following new-frame signals
pub struct PiCameraSource {
    settings: PiCameraSettings,
    /// Settings the live capture was started with
    running: PiCameraSettings,
    capture: Capture,
    latest: LatestFrame,
    throttle: Throttled,
}

impl PiCameraSource {
    pub fn open(settings: PiCameraSettings) -> Result<Self> {
        let (capture, receiver) = Capture::start(&settings)?;
        let throttle = Throttled::per_second(settings.frame_rate);

        Ok(Self {
            running: settings.clone(),
            settings,
            capture,
            latest: LatestFrame::new(receiver),
            throttle,
        })
    }

    fn install(&mut self, settings: PiCameraSettings, capture: Capture, receiver: mpsc::Receiver<Frame>) {
        self.throttle = Throttled::per_second(settings.frame_rate);
        self.settings = settings.clone();
        self.running = settings;
        self.capture = capture;
        self.latest.replace(receiver);
    }
}

impl CameraSource for PiCameraSource {
    fn name(&self) -> &str {
        "picam"
    }

    fn is_ready(&self) -> bool {
        self.latest.frame().is_some()
    }

    fn update(&mut self, delta: f32) -> bool {
        self.latest.poll();
        self.throttle.try_tick(delta) && self.is_ready()
    }

    fn latest(&self) -> Option<&Frame> {
        self.latest.frame()
    }

    fn frame_rate(&self) -> f32 {
        self.settings.frame_rate
    }

    fn reinitialize(&mut self) -> Result<()> {
        let previous = self.running.clone();
        let mut next = self.settings.clone();
        next.frame_rate = PI_FRAME_RATE;

        // Only one process may hold the sensor
        self.capture.stop();

        match Capture::start(&next) {
            Ok((capture, receiver)) => {
                self.install(next, capture, receiver);
                Ok(())
            }
            Err(e) => {
                log::warn!("Camera restart failed, resuming previous settings: {:#}", e);
                let (capture, receiver) = Capture::start(&previous)
                    .context("Failed to resume previous camera settings")?;
                self.install(previous, capture, receiver);
                Err(e)
            }
        }
    }

    fn resets_scale(&self) -> bool {
        true
    }
}
