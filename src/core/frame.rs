/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Gray8,
    Rgb8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes used by one pixel
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Frame - one captured raster image
///
/// Frames are never mutated after capture; scaling and format conversion
/// produce new frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Frame {
    /// Wrap a raw sample buffer. Returns None when the buffer length does not
    /// match the geometry.
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * format.channels();
        if pixels.len() != expected {
            return None;
        }

        Some(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Frame filled with a single value in every channel
    pub fn filled(width: u32, height: u32, format: PixelFormat, value: u8) -> Self {
        let size = width as usize * height as usize * format.channels();
        Self {
            width,
            height,
            format,
            pixels: vec![value; size],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Nearest-neighbour resample to an explicit size
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        let width = width.max(1);
        let height = height.max(1);

        if (width, height) == self.dimensions() {
            return self.clone();
        }

        let channels = self.format.channels();
        let mut pixels = Vec::with_capacity(width as usize * height as usize * channels);

        for y in 0..height {
            let src_y = (y as u64 * self.height as u64 / height as u64) as usize;
            for x in 0..width {
                let src_x = (x as u64 * self.width as u64 / width as u64) as usize;
                let idx = (src_y * self.width as usize + src_x) * channels;
                pixels.extend_from_slice(&self.pixels[idx..idx + channels]);
            }
        }

        Frame {
            width,
            height,
            format: self.format,
            pixels,
        }
    }

    /// Resample by a uniform factor, truncating like an integer cast
    pub fn scaled(&self, factor: f32) -> Frame {
        let width = (self.width as f32 * factor) as u32;
        let height = (self.height as f32 * factor) as u32;
        self.resized(width, height)
    }

    /// Expand to packed RGB, as fed to the encoder
    pub fn to_rgb(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgb8 => self.pixels.clone(),
            PixelFormat::Rgba8 => self
                .pixels
                .chunks_exact(4)
                .flat_map(|p| [p[0], p[1], p[2]])
                .collect(),
            PixelFormat::Gray8 => self.pixels.iter().flat_map(|&v| [v, v, v]).collect(),
        }
    }

    /// Expand to packed RGBA, as uploaded to the GPU
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.format {
            PixelFormat::Rgba8 => self.pixels.clone(),
            PixelFormat::Rgb8 => self
                .pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            PixelFormat::Gray8 => self.pixels.iter().flat_map(|&v| [v, v, v, 255]).collect(),
        }
    }
}
