use crate::lyrics::lrc::LyricEntry;
use crate::text::wrap::{TextMeasure, WrapStrategy};

/// Wrapped geometry of one lyric entry in the virtual scroll column.
#[derive(Clone, Debug, PartialEq)]
pub struct LyricLayout {
    /// Wrapped lines, top to bottom.
    pub lines: Vec<String>,
    /// Offset of the entry's top edge from the top of the column.
    pub y_pos: f32,
    /// Summed line heights plus inner line spacing.
    pub height: f32,
}

impl LyricLayout {
    /// Column coordinate of the entry's vertical center.
    pub fn center_y(&self) -> f32 {
        self.y_pos + self.height / 2.0
    }
}

/// Spacing used when stacking entries into the scroll column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSpacing {
    /// Gap between wrapped lines of one entry.
    pub line: f32,
    /// Gap between consecutive entries.
    pub lyric: f32,
}

/// Precomputed layouts for every entry of a song, read-only while rendering.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutCache {
    layouts: Vec<LyricLayout>,
}

impl LayoutCache {
    /// Wrap every entry against `max_width` and stack them into one column.
    pub fn build(
        entries: &[LyricEntry],
        strategy: &WrapStrategy,
        measure: &mut dyn TextMeasure,
        max_width: f32,
        spacing: ColumnSpacing,
    ) -> Self {
        let mut layouts = Vec::with_capacity(entries.len());
        let mut cumulative_y = 0.0f32;
        for entry in entries {
            let lines = strategy.wrap(&entry.text, measure, max_width);
            let height = lines
                .iter()
                .map(|l| measure.measure(l).height + spacing.line)
                .sum::<f32>()
                - spacing.line;
            layouts.push(LyricLayout {
                lines,
                y_pos: cumulative_y,
                height,
            });
            cumulative_y += height + spacing.lyric;
        }
        Self { layouts }
    }

    /// All layouts, in entry order.
    pub fn layouts(&self) -> &[LyricLayout] {
        &self.layouts
    }

    /// Layout of entry `idx`.
    pub fn get(&self, idx: usize) -> Option<&LyricLayout> {
        self.layouts.get(idx)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Return `true` when no entries are cached.
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}
