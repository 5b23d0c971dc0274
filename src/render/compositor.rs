//! Back-to-front fusion of the three layers plus the global fade envelope.

use crate::foundation::core::Canvas;
use crate::foundation::error::{LyricReelError, LyricReelResult};
use crate::foundation::math::quantize_u8;
use crate::render::frame::FrameRGBA;

/// Global brightness multiplier at time `t`.
///
/// Linear ramp `0 → 1` over the first `fade_in` seconds and `1 → 0` over the last `fade_out`
/// seconds. A zero-length fade disables that ramp. When the ramps overlap the lower one wins,
/// which keeps the envelope continuous.
pub fn fade_envelope(t: f64, duration: f64, fade_in: f64, fade_out: f64) -> f32 {
    let ramp_in = if fade_in > 0.0 { t / fade_in } else { 1.0 };
    let ramp_out = if fade_out > 0.0 {
        (duration - t) / fade_out
    } else {
        1.0
    };
    ramp_in.min(ramp_out).clamp(0.0, 1.0) as f32
}

/// Fade timing of a job.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FadeEnvelope {
    /// Total duration in seconds.
    pub duration: f64,
    /// Fade-in seconds.
    pub fade_in: f64,
    /// Fade-out seconds.
    pub fade_out: f64,
}

impl FadeEnvelope {
    /// Multiplier at `t`.
    pub fn at(&self, t: f64) -> f32 {
        fade_envelope(t, self.duration, self.fade_in, self.fade_out)
    }
}

/// Composes background, cover and lyrics frames into opaque output frames.
#[derive(Debug)]
pub struct Compositor {
    canvas: Canvas,
    fade: FadeEnvelope,
    acc: Vec<f32>,
}

impl Compositor {
    /// Create a compositor for frames of `canvas` size.
    pub fn new(canvas: Canvas, fade: FadeEnvelope) -> Self {
        Self {
            canvas,
            fade,
            acc: vec![0.0; (canvas.width as usize) * (canvas.height as usize) * 3],
        }
    }

    /// Compose one output frame at time `t`.
    ///
    /// `background` must be opaque; `cover` and `lyrics` may be straight or premultiplied. The
    /// output is straight RGBA8 with alpha 255.
    pub fn compose(
        &mut self,
        t: f64,
        background: &FrameRGBA,
        cover: &FrameRGBA,
        lyrics: &FrameRGBA,
    ) -> LyricReelResult<FrameRGBA> {
        for (name, f) in [
            ("background", background),
            ("cover", cover),
            ("lyrics", lyrics),
        ] {
            f.validate()?;
            if f.canvas() != self.canvas {
                return Err(LyricReelError::render(format!(
                    "{name} layer is {}x{}, expected {}x{}",
                    f.width, f.height, self.canvas.width, self.canvas.height
                )));
            }
        }

        for (acc, px) in self
            .acc
            .chunks_exact_mut(3)
            .zip(background.data.chunks_exact(4))
        {
            acc[0] = f32::from(px[0]);
            acc[1] = f32::from(px[1]);
            acc[2] = f32::from(px[2]);
        }
        over_in_place(&mut self.acc, cover);
        over_in_place(&mut self.acc, lyrics);

        let env = self.fade.at(t);
        let mut data = vec![0u8; self.canvas.rgba_len()];
        for (out, acc) in data.chunks_exact_mut(4).zip(self.acc.chunks_exact(3)) {
            out[0] = quantize_u8(acc[0] * env);
            out[1] = quantize_u8(acc[1] * env);
            out[2] = quantize_u8(acc[2] * env);
            out[3] = 255;
        }

        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: false,
        })
    }
}

/// `acc = layer.rgb * a + acc * (1 - a)` with `a` the layer's normalized alpha.
fn over_in_place(acc: &mut [f32], layer: &FrameRGBA) {
    for (d, s) in acc.chunks_exact_mut(3).zip(layer.data.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let a = f32::from(s[3]) / 255.0;
        let inv = 1.0 - a;
        for c in 0..3 {
            let src = if layer.premultiplied {
                f32::from(s[c])
            } else {
                f32::from(s[c]) * a
            };
            d[c] = src + d[c] * inv;
        }
    }
}
