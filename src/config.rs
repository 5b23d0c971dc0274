//! Render configuration.
//!
//! [`RenderConfig`] holds every layout constant of a render job. `Default` reproduces the stock
//! 1280x720 layout; JSON files may override any subset of fields.

use std::path::Path;

use anyhow::Context as _;

use crate::foundation::core::{Canvas, Fps, Rect, Rgba8};
use crate::foundation::error::{LyricReelError, LyricReelResult};

/// Font size and color for one lyric style.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextStyle {
    /// Font size in pixels.
    pub size_px: f32,
    /// Text color (straight alpha).
    pub color: Rgba8,
}

/// Immutable layout constants for one render job.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output video dimensions.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,

    /// Area in which lyric lines are centered horizontally and vertically.
    pub lyric_area: Rect,
    /// Style of the active (highlighted) entry, drawn with the bold font.
    pub active: TextStyle,
    /// Style of every other entry, drawn with the regular font.
    pub inactive: TextStyle,
    /// Vertical gap between wrapped lines of one entry.
    pub line_spacing: f32,
    /// Vertical gap between consecutive entries.
    pub lyric_spacing: f32,

    /// Glow outline color around the active entry.
    pub glow_color: Rgba8,
    /// Glow outline offset in pixels (8 directions).
    pub glow_offset: f32,
    /// Drop-shadow color; its alpha channel is unused, see `shadow_alpha_ratio`.
    pub shadow_color: Rgba8,
    /// Drop-shadow offset in pixels (right and down).
    pub shadow_offset: f32,
    /// Shadow alpha as a fraction of the owning line's alpha.
    pub shadow_alpha_ratio: f32,

    /// Per-frame easing factor of the scroll cursor, in `(0, 1]`.
    pub scroll_smoothing: f32,
    /// Distance normalization: alpha reaches zero at `frame_height / falloff_divisor` pixels.
    pub falloff_divisor: f32,
    /// Exponent applied to the linear distance factor.
    pub falloff_exponent: f32,

    /// Gaussian blur radius applied to the backdrop.
    pub blur_radius: f32,
    /// Relative brightness swing of the backdrop.
    pub breathe_amplitude: f32,
    /// Angular speed (radians per second) of the backdrop brightness swing.
    pub breathe_speed: f32,

    /// Box the cover art is fitted into.
    pub cover_box: Rect,
    /// Corner radius as a fraction of the box width.
    pub cover_corner_ratio: f32,

    /// Fade-in duration at the start of the video, in seconds.
    pub fade_in_secs: f64,
    /// Fade-out duration at the end of the video, in seconds.
    pub fade_out_secs: f64,

    /// x264 constant rate factor.
    pub crf: u8,
    /// x264 preset.
    pub preset: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let (w, h) = (1280.0f64, 720.0f64);
        let cover_side = (h * 0.6).floor();
        let cover_x = (w * 0.08).floor();
        let cover_y = ((h - cover_side) / 2.0).floor();
        let area_x = cover_x + cover_side + (w * 0.05).floor();
        let area_w = w - (cover_x + cover_side + (w * 0.13).floor());

        Self {
            canvas: Canvas {
                width: 1280,
                height: 720,
            },
            fps: Fps { num: 24, den: 1 },
            lyric_area: Rect::new(area_x, 0.0, area_x + area_w, h),
            active: TextStyle {
                size_px: 50.0,
                color: Rgba8::new(255, 255, 255, 255),
            },
            inactive: TextStyle {
                size_px: 38.0,
                color: Rgba8::new(255, 255, 255, 180),
            },
            line_spacing: 15.0,
            lyric_spacing: 30.0,
            glow_color: Rgba8::new(255, 255, 255, 90),
            glow_offset: 2.0,
            shadow_color: Rgba8::new(0, 0, 0, 160),
            shadow_offset: 2.0,
            shadow_alpha_ratio: 0.4,
            scroll_smoothing: 0.08,
            falloff_divisor: 3.0,
            falloff_exponent: 2.0,
            blur_radius: 60.0,
            breathe_amplitude: 0.05,
            breathe_speed: 0.3,
            cover_box: Rect::new(cover_x, cover_y, cover_x + cover_side, cover_y + cover_side),
            cover_corner_ratio: 0.12,
            fade_in_secs: 1.5,
            fade_out_secs: 2.5,
            crf: 22,
            preset: "medium".to_string(),
        }
    }
}

impl RenderConfig {
    /// Load a (possibly partial) JSON configuration; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> LyricReelResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read render config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse render config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations that cannot produce a valid video.
    pub fn validate(&self) -> LyricReelResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(LyricReelError::validation(
                "canvas width/height must be non-zero",
            ));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(LyricReelError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX) {
            return Err(LyricReelError::validation("canvas dimensions exceed u16"));
        }
        Fps::new(self.fps.num, self.fps.den)?;

        if self.lyric_area.width() <= 0.0 || self.lyric_area.height() <= 0.0 {
            return Err(LyricReelError::validation("lyric_area must be non-empty"));
        }
        if self.cover_box.width() <= 0.0 || self.cover_box.height() <= 0.0 {
            return Err(LyricReelError::validation("cover_box must be non-empty"));
        }
        for (name, size) in [
            ("active.size_px", self.active.size_px),
            ("inactive.size_px", self.inactive.size_px),
        ] {
            if !size.is_finite() || size <= 0.0 {
                return Err(LyricReelError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if !(self.scroll_smoothing > 0.0 && self.scroll_smoothing <= 1.0) {
            return Err(LyricReelError::validation(
                "scroll_smoothing must be in (0, 1]",
            ));
        }
        if !self.falloff_divisor.is_finite() || self.falloff_divisor <= 0.0 {
            return Err(LyricReelError::validation("falloff_divisor must be > 0"));
        }
        if !self.falloff_exponent.is_finite() || self.falloff_exponent <= 0.0 {
            return Err(LyricReelError::validation("falloff_exponent must be > 0"));
        }
        if !self.blur_radius.is_finite() || self.blur_radius < 0.0 {
            return Err(LyricReelError::validation("blur_radius must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.shadow_alpha_ratio) {
            return Err(LyricReelError::validation(
                "shadow_alpha_ratio must be in [0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.breathe_amplitude) {
            return Err(LyricReelError::validation(
                "breathe_amplitude must be in [0, 1)",
            ));
        }
        for (name, v) in [
            ("fade_in_secs", self.fade_in_secs),
            ("fade_out_secs", self.fade_out_secs),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(LyricReelError::validation(format!("{name} must be >= 0")));
            }
        }
        for (name, v) in [
            ("line_spacing", self.line_spacing),
            ("lyric_spacing", self.lyric_spacing),
            ("glow_offset", self.glow_offset),
            ("shadow_offset", self.shadow_offset),
            ("breathe_speed", self.breathe_speed),
        ] {
            if !v.is_finite() {
                return Err(LyricReelError::validation(format!("{name} must be finite")));
            }
        }
        if self.crf > 51 {
            return Err(LyricReelError::validation("crf must be in 0..=51"));
        }
        Ok(())
    }

    /// Vertical center of the lyric area; the scroll cursor is anchored here.
    pub fn lyric_area_center_y(&self) -> f32 {
        (self.lyric_area.y0 + self.lyric_area.height() / 2.0) as f32
    }
}
