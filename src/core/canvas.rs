use super::display_context::DisplayContext;
use super::frame::Frame;

/// Background gray behind the camera layers
pub const BACKGROUND: [u8; 4] = [100, 100, 100, 255];
/// Recording indicator color
pub const RECORD_DOT: [u8; 4] = [255, 0, 0, 255];
/// Recording indicator radius in canvas pixels
pub const RECORD_DOT_RADIUS: u32 = 20;

/// RGBA canvas the layers are composed onto before upload
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    /// Create new canvas filled with the background color
    pub fn new(context: &DisplayContext) -> Self {
        let mut canvas = Self {
            pixels: vec![0; context.buffer_size()],
            width: context.width,
            height: context.height,
        };
        canvas.clear(BACKGROUND);
        canvas
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Fill entire canvas with color
    pub fn clear(&mut self, color: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&color);
        }
    }

    /// Draw a frame stretched over the whole canvas
    pub fn draw_frame(&mut self, frame: &Frame) {
        let fitted = frame.resized(self.width, self.height);
        self.pixels = fitted.to_rgba();
    }

    /// Draw filled circle at (cx, cy)
    pub fn fill_circle(&mut self, cx: u32, cy: u32, radius: u32, color: [u8; 4]) {
        let r_sq = (radius * radius) as i64;
        let cx_i = cx as i64;
        let cy_i = cy as i64;
        let radius_i = radius as i64;

        for dy in -radius_i..=radius_i {
            for dx in -radius_i..=radius_i {
                if dx * dx + dy * dy <= r_sq {
                    let px = cx_i + dx;
                    let py = cy_i + dy;

                    if px >= 0 && py >= 0 {
                        self.set_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }

        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }
}

/// Compose one displayed image: live preview, playback over it, record dot on top
pub fn compose(
    context: &DisplayContext,
    live: Option<&Frame>,
    playback: Option<&Frame>,
    recording: bool,
) -> Canvas {
    let mut canvas = Canvas::new(context);

    if let Some(frame) = live {
        canvas.draw_frame(frame);
    }
    if let Some(frame) = playback {
        canvas.draw_frame(frame);
    }
    if recording {
        let (cx, cy) = context.center();
        canvas.fill_circle(cx, cy, RECORD_DOT_RADIUS, RECORD_DOT);
    }

    canvas
}
