use image::imageops::FilterType;

use crate::config::RenderConfig;
use crate::foundation::core::Canvas;
use crate::foundation::error::LyricReelResult;
use crate::foundation::math::quantize_u8;
use crate::render::blur::gaussian_blur_rgb;
use crate::render::frame::FrameRGBA;

/// Blurred, slowly pulsing backdrop derived from the cover art.
#[derive(Clone, Debug)]
pub struct BackgroundLayer {
    canvas: Canvas,
    base: Vec<f32>,
    amplitude: f32,
    speed: f32,
}

impl BackgroundLayer {
    /// Cover-fit `cover` to the canvas, blur it and keep the result as the base image.
    #[tracing::instrument(skip_all, fields(w = cfg.canvas.width, h = cfg.canvas.height))]
    pub fn new(cover: &image::DynamicImage, cfg: &RenderConfig) -> LyricReelResult<Self> {
        let Canvas { width, height } = cfg.canvas;
        let filled = cover
            .resize_to_fill(width, height, FilterType::Lanczos3)
            .to_rgb8();
        let blurred = gaussian_blur_rgb(&filled, cfg.blur_radius)?;
        let base = blurred.as_raw().iter().map(|&v| f32::from(v)).collect();
        tracing::debug!(blur = cfg.blur_radius, "background prepared");

        Ok(Self {
            canvas: cfg.canvas,
            base,
            amplitude: cfg.breathe_amplitude,
            speed: cfg.breathe_speed,
        })
    }

    /// Brightness multiplier at `t`.
    pub fn brightness(&self, t: f64) -> f32 {
        1.0 + self.amplitude * (t as f32 * self.speed).sin()
    }

    /// Opaque frame at `t`.
    pub fn frame(&self, t: f64) -> FrameRGBA {
        let k = self.brightness(t);
        let mut data = vec![0u8; self.canvas.rgba_len()];
        for (out, rgb) in data.chunks_exact_mut(4).zip(self.base.chunks_exact(3)) {
            out[0] = quantize_u8(rgb[0] * k);
            out[1] = quantize_u8(rgb[1] * k);
            out[2] = quantize_u8(rgb[2] * k);
            out[3] = 255;
        }
        FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: false,
        }
    }
}
