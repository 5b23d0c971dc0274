//! Scroll cursor state machine of the lyrics layer.
//!
//! Each sampled time picks the active entry, eases the scroll cursor toward it and produces a
//! [`LyricsPlan`]: which wrapped lines to draw, where, and in which colors. Painting the plan is
//! left to [`crate::layers::lyrics`].

use crate::config::RenderConfig;
use crate::foundation::core::Rgba8;
use crate::lyrics::layout::LayoutCache;
use crate::lyrics::lrc::LyricEntry;
use crate::text::wrap::TextMeasure;

/// Smoothed vertical scroll position in column coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    /// Column coordinate currently anchored at the lyric area's vertical center.
    pub current_y: f32,
}

impl ScrollState {
    /// Single-pole low-pass step toward `target`.
    pub fn ease_toward(&mut self, target: f32, smoothing: f32) {
        self.current_y += (target - self.current_y) * smoothing;
    }
}

/// Which font style a line is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineStyle {
    /// Bold face at the highlight size.
    Active,
    /// Regular face at the standard size.
    Inactive,
}

/// One wrapped line to paint.
#[derive(Clone, Debug, PartialEq)]
pub struct LineDraw {
    /// Index of the owning entry.
    pub entry: usize,
    /// Line text.
    pub text: String,
    /// Left edge in frame pixels.
    pub x: f32,
    /// Top edge in frame pixels.
    pub y: f32,
    /// Font style.
    pub style: LineStyle,
    /// Main text color.
    pub color: Rgba8,
    /// Drop-shadow color.
    pub shadow: Rgba8,
    /// Glow outline color, active entry only.
    pub glow: Option<Rgba8>,
}

/// Everything the painter needs for one sampled time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LyricsPlan {
    /// Active entry, if `t` falls inside any entry's window.
    pub active: Option<usize>,
    /// Scroll cursor after this step.
    pub scroll_y: f32,
    /// Lines to draw, back to front.
    pub lines: Vec<LineDraw>,
}

/// Owns the lyric entries, their layouts and the scroll state for one job.
#[derive(Clone, Debug)]
pub struct LyricsScroller {
    entries: Vec<LyricEntry>,
    cache: LayoutCache,
    state: ScrollState,
}

impl LyricsScroller {
    /// `cache` must hold one layout per entry, in the same order.
    pub fn new(entries: Vec<LyricEntry>, cache: LayoutCache) -> Self {
        debug_assert_eq!(entries.len(), cache.len());
        Self {
            entries,
            cache,
            state: ScrollState::default(),
        }
    }

    /// Current scroll state.
    pub fn state(&self) -> ScrollState {
        self.state
    }

    /// Lyric entries.
    pub fn entries(&self) -> &[LyricEntry] {
        &self.entries
    }

    /// Precomputed layouts.
    pub fn cache(&self) -> &LayoutCache {
        &self.cache
    }

    /// First entry (in order) whose window contains `t`.
    pub fn active_index(&self, t: f64) -> Option<usize> {
        self.entries.iter().position(|e| e.contains(t))
    }

    /// Advance the state machine to time `t` and plan the lines to draw.
    ///
    /// Outside every window the plan is empty and the scroll state is left untouched.
    pub fn step(
        &mut self,
        t: f64,
        cfg: &RenderConfig,
        active_measure: &mut dyn TextMeasure,
        inactive_measure: &mut dyn TextMeasure,
    ) -> LyricsPlan {
        let Some(active) = self.active_index(t) else {
            return LyricsPlan {
                active: None,
                scroll_y: self.state.current_y,
                lines: Vec::new(),
            };
        };
        let Some(active_layout) = self.cache.get(active) else {
            return LyricsPlan {
                active: None,
                scroll_y: self.state.current_y,
                lines: Vec::new(),
            };
        };

        self.state
            .ease_toward(active_layout.center_y(), cfg.scroll_smoothing);
        let scroll_y = self.state.current_y;
        let origin_y = cfg.lyric_area_center_y() - scroll_y;

        let frame_h = cfg.canvas.height as f32;
        let falloff_px = frame_h / cfg.falloff_divisor;
        let area_x = cfg.lyric_area.x0 as f32;
        let area_w = cfg.lyric_area.width() as f32;

        let mut lines = Vec::new();
        for (i, layout) in self.cache.layouts().iter().enumerate() {
            let is_active = i == active;
            let (style, measure): (LineStyle, &mut dyn TextMeasure) = if is_active {
                (LineStyle::Active, &mut *active_measure)
            } else {
                (LineStyle::Inactive, &mut *inactive_measure)
            };

            let color = if is_active {
                cfg.active.color
            } else {
                let dist = (layout.center_y() - scroll_y).abs();
                let linear = (1.0 - dist / falloff_px).max(0.0);
                cfg.inactive.color.scale_alpha(linear.powf(cfg.falloff_exponent))
            };
            let shadow = Rgba8 {
                a: (f32::from(color.a) * cfg.shadow_alpha_ratio) as u8,
                ..cfg.shadow_color
            };
            let glow = is_active.then_some(cfg.glow_color);

            let mut line_y = origin_y + layout.y_pos;
            for text in &layout.lines {
                let extent = measure.measure(text);
                let visible = line_y + extent.height > 0.0 && line_y < frame_h;
                if visible && color.a > 0 && !text.is_empty() {
                    lines.push(LineDraw {
                        entry: i,
                        text: text.clone(),
                        x: area_x + (area_w - extent.width) / 2.0,
                        y: line_y,
                        style,
                        color,
                        shadow,
                        glow,
                    });
                }
                line_y += extent.height + cfg.line_spacing;
            }
        }

        LyricsPlan {
            active: Some(active),
            scroll_y,
            lines,
        }
    }
}
