use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution};
use nokhwa::Camera;

use super::{CameraSource, LatestFrame};
use crate::config::Config;
use crate::core::{Frame, PixelFormat};

/// Frames allowed in flight between grabber and main loop
const GRABBER_QUEUE: usize = 2;
const GRAB_RETRY: Duration = Duration::from_millis(100);

/// Webcam open parameters
#[derive(Debug, Clone, PartialEq)]
pub struct WebcamSettings {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    /// Rate requested from the driver
    pub desired_frame_rate: u32,
    /// Rate the app captures at
    pub frame_rate: f32,
}

impl WebcamSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            device_index: config.device_index,
            width: config.width,
            height: config.height,
            desired_frame_rate: config.desired_frame_rate,
            frame_rate: config.frame_rate,
        }
    }

    fn requested_format(&self) -> RequestedFormat<'static> {
        let format = CameraFormat::new(
            Resolution::new(self.width, self.height),
            FrameFormat::MJPEG,
            self.desired_frame_rate,
        );
        RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format))
    }
}

/// Running grabber thread
struct Grabber {
    stop_flag: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Grabber {
    /// Open the device on a dedicated thread and wait for the result
    fn spawn(settings: WebcamSettings) -> Result<(Self, Receiver<Frame>, (u32, u32))> {
        let (frame_tx, frame_rx) = mpsc::sync_channel(GRABBER_QUEUE);
        let (ready_tx, ready_rx) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = stop_flag.clone();

        let handle = thread::Builder::new()
            .name("webcam-grabber".into())
            .spawn(move || grab_loop(settings, frame_tx, ready_tx, thread_stop))
            .context("Failed to spawn webcam grabber")?;

        let grabber = Self {
            stop_flag,
            handle: Some(handle),
        };

        let resolution = ready_rx
            .recv()
            .map_err(|_| anyhow!("Webcam grabber exited during setup"))?
            .map_err(|e| anyhow!("Failed to open webcam: {e}"))?;

        Ok((grabber, frame_rx, resolution))
    }
}

impl Grabber {
    /// Signal the grab loop and wait for it to release the device
    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Webcam grabber panicked");
            }
        }
    }
}

impl Drop for Grabber {
    fn drop(&mut self) {
        self.stop();
    }
}

fn open_camera(settings: &WebcamSettings) -> std::result::Result<Camera, nokhwa::NokhwaError> {
    let mut camera = Camera::new(
        CameraIndex::Index(settings.device_index),
        settings.requested_format(),
    )?;
    camera.open_stream()?;
    Ok(camera)
}

fn grab_loop(
    settings: WebcamSettings,
    frames: SyncSender<Frame>,
    ready: mpsc::Sender<std::result::Result<(u32, u32), String>>,
    stop: Arc<AtomicBool>,
) {
    let mut camera = match open_camera(&settings) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(e.to_string()));
            return;
        }
    };

    let resolution = camera.resolution();
    let _ = ready.send(Ok((resolution.width(), resolution.height())));

    while !stop.load(Ordering::Relaxed) {
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                log::warn!("Webcam frame grab failed: {}", e);
                thread::sleep(GRAB_RETRY);
                continue;
            }
        };

        let image = match buffer.decode_image::<RgbFormat>() {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Webcam frame decode failed: {}", e);
                continue;
            }
        };

        let (width, height) = (image.width(), image.height());
        let Some(frame) = Frame::new(width, height, PixelFormat::Rgb8, image.into_raw()) else {
            log::warn!("Webcam delivered a malformed {}x{} frame", width, height);
            continue;
        };

        // A full queue means the main loop is behind; the grabber drops the frame
        if let Err(TrySendError::Disconnected(_)) = frames.try_send(frame) {
            break;
        }
    }

    if let Err(e) = camera.stop_stream() {
        log::debug!("Webcam stop failed: {}", e);
    }
}

/// Webcam source: a new frame from the grabber is a capture tick
pub struct WebcamSource {
    settings: WebcamSettings,
    grabber: Grabber,
    latest: LatestFrame,
}

impl WebcamSource {
    pub fn open(settings: WebcamSettings) -> Result<Self> {
        let (grabber, receiver, (width, height)) = Grabber::spawn(settings.clone())?;
        log::info!(
            "Webcam {} opened at {}x{} (requested {}x{} @ {} fps)",
            settings.device_index,
            width,
            height,
            settings.width,
            settings.height,
            settings.desired_frame_rate
        );

        Ok(Self {
            settings,
            grabber,
            latest: LatestFrame::new(receiver),
        })
    }
}

impl CameraSource for WebcamSource {
    fn name(&self) -> &str {
        "webcam"
    }

    fn is_ready(&self) -> bool {
        self.latest.frame().is_some()
    }

    fn update(&mut self, _delta: f32) -> bool {
        self.latest.poll()
    }

    fn latest(&self) -> Option<&Frame> {
        self.latest.frame()
    }

    fn frame_rate(&self) -> f32 {
        self.settings.frame_rate
    }

    fn reinitialize(&mut self) -> Result<()> {
        // The device must be released before it can be opened again
        self.grabber.stop();

        match Grabber::spawn(self.settings.clone()) {
            Ok((grabber, receiver, _)) => {
                self.grabber = grabber;
                self.latest.replace(receiver);
                log::info!("Webcam {} reinitialized", self.settings.device_index);
                Ok(())
            }
            Err(e) => {
                log::warn!("Webcam restart failed, reopening once more: {:#}", e);
                let (grabber, receiver, _) = Grabber::spawn(self.settings.clone())
                    .context("Failed to reopen webcam")?;
                self.grabber = grabber;
                self.latest.replace(receiver);
                Err(e)
            }
        }
    }
}
