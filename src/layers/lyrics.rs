//! Rasterizes [`LyricsPlan`]s with `vello_cpu`.

use std::collections::HashMap;

use crate::config::RenderConfig;
use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{LyricReelError, LyricReelResult};
use crate::lyrics::layout::{ColumnSpacing, LayoutCache};
use crate::lyrics::lrc::LyricEntry;
use crate::lyrics::scroll::{LineDraw, LineStyle, LyricsPlan, LyricsScroller};
use crate::render::frame::FrameRGBA;
use crate::text::font::{FontFace, LoadedFonts, TextShaper};
use crate::text::wrap::{TextExtent, TextMeasure, WrapStrategy};

/// Eight glow directions, unit offsets.
const GLOW_DIRS: [(f32, f32); 8] = [
    (-1.0, -1.0),
    (0.0, -1.0),
    (1.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-1.0, 1.0),
    (0.0, 1.0),
    (1.0, 1.0),
];

struct ShapedLine {
    extent: TextExtent,
    glyphs: Vec<vello_cpu::Glyph>,
}

/// Shaped-line cache for one face and size.
///
/// Lyric lines repeat on every frame, so each distinct string is shaped once. Only final wrapped
/// lines land here; wrap candidates are measured on the bare shaper.
struct GlyphCache {
    shaper: TextShaper,
    font: vello_cpu::peniko::FontData,
    lines: HashMap<String, ShapedLine>,
}

impl GlyphCache {
    fn new(face: &FontFace, size_px: f32) -> LyricReelResult<Self> {
        Ok(Self {
            shaper: face.shaper(size_px)?,
            font: face.font_data().clone(),
            lines: HashMap::new(),
        })
    }

    fn line(&mut self, text: &str) -> &ShapedLine {
        if !self.lines.contains_key(text) {
            let layout = self.shaper.shape(text);
            let mut glyphs = Vec::new();
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    glyphs.extend(run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    }));
                }
            }
            let shaped = ShapedLine {
                extent: TextExtent {
                    width: layout.width(),
                    height: layout.height(),
                },
                glyphs,
            };
            self.lines.insert(text.to_string(), shaped);
        }
        &self.lines[text]
    }
}

impl TextMeasure for GlyphCache {
    fn measure(&mut self, text: &str) -> TextExtent {
        self.line(text).extent
    }
}

/// Scrolling lyrics layer: owns the scroll state machine and the text rasterizer.
pub struct LyricsLayer {
    canvas: Canvas,
    cfg: RenderConfig,
    scroller: LyricsScroller,
    active: GlyphCache,
    inactive: GlyphCache,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for LyricsLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LyricsLayer")
            .field("canvas", &self.canvas)
            .field("entries", &self.scroller.entries().len())
            .field("state", &self.scroller.state())
            .field("shaped_lines", &self.shaped_lines())
            .finish_non_exhaustive()
    }
}

impl LyricsLayer {
    /// Wrap every entry once with the highlight metrics and build the layout cache.
    #[tracing::instrument(skip_all, fields(entries = entries.len()))]
    pub fn new(
        entries: Vec<LyricEntry>,
        fonts: &LoadedFonts,
        strategy: &WrapStrategy,
        cfg: &RenderConfig,
    ) -> LyricReelResult<Self> {
        let canvas = cfg.canvas;
        let w = u16::try_from(canvas.width)
            .map_err(|_| LyricReelError::validation("canvas width exceeds u16"))?;
        let h = u16::try_from(canvas.height)
            .map_err(|_| LyricReelError::validation("canvas height exceeds u16"))?;

        let mut active = GlyphCache::new(&fonts.bold, cfg.active.size_px)?;
        let inactive = GlyphCache::new(&fonts.regular, cfg.inactive.size_px)?;

        let cache = LayoutCache::build(
            &entries,
            strategy,
            &mut active.shaper,
            cfg.lyric_area.width() as f32,
            ColumnSpacing {
                line: cfg.line_spacing,
                lyric: cfg.lyric_spacing,
            },
        );
        tracing::debug!(layouts = cache.len(), "lyric layout cache built");

        Ok(Self {
            canvas,
            cfg: cfg.clone(),
            scroller: LyricsScroller::new(entries, cache),
            active,
            inactive,
            pixmap: vello_cpu::Pixmap::new(w, h),
        })
    }

    /// Scroll state machine.
    pub fn scroller(&self) -> &LyricsScroller {
        &self.scroller
    }

    /// Distinct lines shaped and held for painting, across both faces.
    pub fn shaped_lines(&self) -> usize {
        self.active.lines.len() + self.inactive.lines.len()
    }

    /// Advance to `t` and return the draw plan without painting.
    pub fn plan(&mut self, t: f64) -> LyricsPlan {
        self.scroller
            .step(t, &self.cfg, &mut self.active, &mut self.inactive)
    }

    /// Advance to `t` and paint. The result is premultiplied RGBA8.
    pub fn frame(&mut self, t: f64) -> LyricReelResult<FrameRGBA> {
        let plan = self.plan(t);
        if plan.lines.is_empty() {
            let mut f = FrameRGBA::transparent(self.canvas);
            f.premultiplied = true;
            return Ok(f);
        }
        self.paint(&plan)
    }

    fn paint(&mut self, plan: &LyricsPlan) -> LyricReelResult<FrameRGBA> {
        self.pixmap.data_as_u8_slice_mut().fill(0);
        let mut ctx = vello_cpu::RenderContext::new(self.pixmap.width(), self.pixmap.height());

        for line in &plan.lines {
            if let Some(glow) = line.glow {
                let off = self.cfg.glow_offset;
                for (dx, dy) in GLOW_DIRS {
                    self.draw_line(&mut ctx, line, dx * off, dy * off, glow);
                }
            }
            let off = self.cfg.shadow_offset;
            self.draw_line(&mut ctx, line, off, off, line.shadow);
            self.draw_line(&mut ctx, line, 0.0, 0.0, line.color);
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);

        let frame = FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        };
        frame.validate()?;
        Ok(frame)
    }

    fn draw_line(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        line: &LineDraw,
        dx: f32,
        dy: f32,
        color: Rgba8,
    ) {
        if color.a == 0 {
            return;
        }
        let cache = match line.style {
            LineStyle::Active => &mut self.active,
            LineStyle::Inactive => &mut self.inactive,
        };
        let size = cache.shaper.size_px();
        let font = cache.font.clone();
        let shaped = cache.line(&line.text);

        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(line.x + dx),
            f64::from(line.y + dy),
        )));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        ctx.glyph_run(&font)
            .font_size(size)
            .fill_glyphs(shaped.glyphs.iter().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            }));
    }
}
