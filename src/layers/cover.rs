use image::imageops::FilterType;
use vello_cpu::kurbo::Shape as _;

use crate::config::RenderConfig;
use crate::foundation::core::Canvas;
use crate::foundation::error::{LyricReelError, LyricReelResult};
use crate::render::frame::FrameRGBA;

/// Size of `(w, h)` shrunk to fit inside `(max_w, max_h)` with its aspect ratio kept.
///
/// Images already inside the box are left alone; nothing is ever enlarged.
pub fn thumbnail_size(w: u32, h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if w <= max_w && h <= max_h {
        return (w, h);
    }
    let scale = (f64::from(max_w) / f64::from(w)).min(f64::from(max_h) / f64::from(h));
    let fit = |v: u32, max: u32| ((f64::from(v) * scale).round() as u32).clamp(1, max);
    (fit(w, max_w), fit(h, max_h))
}

/// Rounded cover-art panel on an otherwise transparent canvas. Constant over time.
#[derive(Clone, Debug)]
pub struct CoverLayer {
    frame: FrameRGBA,
}

impl CoverLayer {
    /// Fit, round and place the cover once.
    #[tracing::instrument(skip_all)]
    pub fn new(cover: &image::DynamicImage, cfg: &RenderConfig) -> LyricReelResult<Self> {
        let canvas = cfg.canvas;
        let bx = cfg.cover_box;
        let (box_w, box_h) = (bx.width().round() as u32, bx.height().round() as u32);
        if box_w == 0 || box_h == 0 {
            return Err(LyricReelError::validation("cover_box must be non-empty"));
        }

        let (w, h) = thumbnail_size(cover.width(), cover.height(), box_w, box_h);
        let fitted = if (w, h) == (cover.width(), cover.height()) {
            cover.to_rgba8()
        } else {
            image::imageops::resize(&cover.to_rgba8(), w, h, FilterType::Lanczos3)
        };

        let radius = f64::from(cfg.cover_corner_ratio) * bx.width();
        let mask = rounded_mask(w, h, radius)?;

        let x0 = bx.x0.round() as i64 + i64::from((box_w - w) / 2);
        let y0 = bx.y0.round() as i64 + i64::from((box_h - h) / 2);
        tracing::debug!(w, h, x0, y0, radius, "cover placed");

        let mut frame = FrameRGBA::transparent(canvas);
        paste_masked(&mut frame, &fitted, &mask, x0, y0);
        Ok(Self { frame })
    }

    /// The cover frame; the same for every `t`.
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Canvas size.
    pub fn canvas(&self) -> Canvas {
        self.frame.canvas()
    }
}

/// Anti-aliased rounded-rectangle coverage, one byte per pixel.
fn rounded_mask(w: u32, h: u32, radius: f64) -> LyricReelResult<Vec<u8>> {
    let w16 = u16::try_from(w).map_err(|_| LyricReelError::validation("cover width exceeds u16"))?;
    let h16 =
        u16::try_from(h).map_err(|_| LyricReelError::validation("cover height exceeds u16"))?;

    let r = radius.clamp(0.0, f64::from(w.min(h)) / 2.0);
    let shape = vello_cpu::kurbo::RoundedRect::new(0.0, 0.0, f64::from(w), f64::from(h), r);

    let mut ctx = vello_cpu::RenderContext::new(w16, h16);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(255, 255, 255, 255));
    ctx.fill_path(&shape.to_path(0.1));
    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(pixmap
        .data_as_u8_slice()
        .chunks_exact(4)
        .map(|px| px[3])
        .collect())
}

/// Copy `img` into `dst` at `(x0, y0)` with `mask` as alpha, clipping to the canvas.
fn paste_masked(dst: &mut FrameRGBA, img: &image::RgbaImage, mask: &[u8], x0: i64, y0: i64) {
    let (w, h) = img.dimensions();
    for y in 0..h {
        let dy = y0 + i64::from(y);
        if dy < 0 || dy >= i64::from(dst.height) {
            continue;
        }
        for x in 0..w {
            let dx = x0 + i64::from(x);
            if dx < 0 || dx >= i64::from(dst.width) {
                continue;
            }
            let a = mask[(y * w + x) as usize];
            if a == 0 {
                continue;
            }
            let src = img.get_pixel(x, y).0;
            let i = ((dy as usize) * (dst.width as usize) + dx as usize) * 4;
            dst.data[i..i + 3].copy_from_slice(&src[..3]);
            dst.data[i + 3] = a;
        }
    }
}
