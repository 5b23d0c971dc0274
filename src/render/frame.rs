use crate::foundation::core::Canvas;
use crate::foundation::error::{LyricReelError, LyricReelResult};

/// A rendered frame as RGBA8 pixels.
///
/// Layer frames produced by `vello_cpu` are premultiplied; the backdrop, the cover layer and the
/// composited output are straight alpha. The `premultiplied` flag makes this explicit at API
/// boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Fully transparent frame.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0u8; canvas.rgba_len()],
            premultiplied: false,
        }
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Check that `data` matches `width * height * 4`.
    pub fn validate(&self) -> LyricReelResult<()> {
        if self.data.len() != self.canvas().rgba_len() {
            return Err(LyricReelError::render(format!(
                "frame buffer holds {} bytes, expected {} for {}x{}",
                self.data.len(),
                self.canvas().rgba_len(),
                self.width,
                self.height
            )));
        }
        Ok(())
    }
}
