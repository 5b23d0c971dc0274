//! Line wrapping against a pixel budget.

use std::fmt;
use std::sync::Arc;

use crate::text::script::Script;

/// Rendered size of a string in one font style.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    /// Advance width in pixels.
    pub width: f32,
    /// Line height in pixels.
    pub height: f32,
}

/// Font metrics provider used by wrapping and layout.
pub trait TextMeasure {
    /// Measure `text` laid out on a single line.
    fn measure(&mut self, text: &str) -> TextExtent;
}

/// Fixed-advance metrics: every character is `advance` wide.
///
/// Deterministic stand-in for a real font, handy for tests and layout previews.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    /// Width of one character in pixels.
    pub advance: f32,
    /// Height of every line in pixels.
    pub line_height: f32,
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&mut self, text: &str) -> TextExtent {
        TextExtent {
            width: text.chars().count() as f32 * self.advance,
            height: self.line_height,
        }
    }
}

/// Word segmenter for scripts written without spaces.
#[derive(Clone)]
pub struct Segmenter {
    jieba: Arc<jieba_rs::Jieba>,
}

impl Segmenter {
    /// Load the bundled dictionary.
    pub fn new() -> Self {
        Self {
            jieba: Arc::new(jieba_rs::Jieba::new()),
        }
    }

    /// Split `text` into words; concatenating the result gives back `text`.
    pub fn segment<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.jieba.cut(text, false)
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Segmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segmenter").finish_non_exhaustive()
    }
}

/// How text is split into wrap units. Chosen once per job.
#[derive(Clone, Debug)]
pub enum WrapStrategy {
    /// Whitespace-delimited words joined by single spaces.
    Latin,
    /// Dictionary-segmented words joined without separator.
    CjkSegmented(Segmenter),
    /// One character at a time.
    Generic,
}

impl WrapStrategy {
    /// Strategy for the detected script.
    pub fn for_script(script: Script) -> Self {
        match script {
            Script::Latin => Self::Latin,
            Script::Cjk => Self::CjkSegmented(Segmenter::new()),
            Script::Japanese => Self::Generic,
        }
    }

    /// Wrap `text` into lines no wider than `max_width`.
    ///
    /// A line is only wider than `max_width` when it holds a single character that alone exceeds
    /// the budget. The result is never empty.
    pub fn wrap(&self, text: &str, measure: &mut dyn TextMeasure, max_width: f32) -> Vec<String> {
        let mut lines = match self {
            Self::Latin => wrap_latin(text, measure, max_width),
            Self::CjkSegmented(seg) => wrap_units(
                seg.segment(text).into_iter().filter(|w| !w.is_empty()),
                measure,
                max_width,
            ),
            Self::Generic => wrap_units(chars(text), measure, max_width),
        };
        lines.retain(|l| !l.trim().is_empty());
        if lines.is_empty() {
            lines.push(String::new());
        }
        lines
    }
}

fn chars(s: &str) -> impl Iterator<Item = &str> {
    s.char_indices().map(|(i, c)| &s[i..i + c.len_utf8()])
}

fn fits(measure: &mut dyn TextMeasure, s: &str, max_width: f32) -> bool {
    measure.measure(s).width <= max_width
}

/// Greedy accumulation of units joined with `sep`.
///
/// A unit that does not fit on an empty line is still emitted, alone.
fn accumulate<'a>(
    units: impl Iterator<Item = &'a str>,
    sep: &str,
    measure: &mut dyn TextMeasure,
    max_width: f32,
    lines: &mut Vec<String>,
    line: &mut String,
) {
    for unit in units {
        if line.is_empty() {
            line.push_str(unit);
            continue;
        }
        let candidate = format!("{line}{sep}{unit}");
        if fits(measure, &candidate, max_width) {
            *line = candidate;
        } else {
            lines.push(std::mem::take(line));
            line.push_str(unit);
        }
    }
}

/// Hard-split one oversized unit into character runs that each fit.
fn hard_split(unit: &str, measure: &mut dyn TextMeasure, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    accumulate(chars(unit), "", measure, max_width, &mut pieces, &mut piece);
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Place an oversized unit: flush the open line, emit all but its last run, keep the last run
/// open so following units may join it.
fn place_oversized(
    unit: &str,
    measure: &mut dyn TextMeasure,
    max_width: f32,
    lines: &mut Vec<String>,
    line: &mut String,
) {
    if !line.is_empty() {
        lines.push(std::mem::take(line));
    }
    let mut pieces = hard_split(unit, measure, max_width);
    if let Some(last) = pieces.pop() {
        lines.extend(pieces);
        *line = last;
    }
}

fn wrap_latin(text: &str, measure: &mut dyn TextMeasure, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !fits(measure, word, max_width) {
            place_oversized(word, measure, max_width, &mut lines, &mut line);
            continue;
        }
        accumulate(
            std::iter::once(word),
            " ",
            measure,
            max_width,
            &mut lines,
            &mut line,
        );
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn wrap_units<'a>(
    units: impl Iterator<Item = &'a str>,
    measure: &mut dyn TextMeasure,
    max_width: f32,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for unit in units {
        if unit.chars().count() > 1 && !fits(measure, unit, max_width) {
            place_oversized(unit, measure, max_width, &mut lines, &mut line);
            continue;
        }
        accumulate(
            std::iter::once(unit),
            "",
            measure,
            max_width,
            &mut lines,
            &mut line,
        );
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono() -> MonospaceMeasure {
        MonospaceMeasure {
            advance: 10.0,
            line_height: 20.0,
        }
    }

    fn assert_width_bound(lines: &[String], max_width: f32) {
        let mut m = mono();
        for l in lines {
            let w = m.measure(l).width;
            assert!(
                w <= max_width || l.chars().count() == 1,
                "line {l:?} is {w}px wide (budget {max_width})"
            );
        }
    }

    #[test]
    fn latin_wraps_on_word_boundaries() {
        let lines = WrapStrategy::Latin.wrap("the quick brown fox jumps", &mut mono(), 100.0);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert_width_bound(&lines, 100.0);
    }

    #[test]
    fn latin_collapses_whitespace() {
        let lines = WrapStrategy::Latin.wrap("  a   b\tc ", &mut mono(), 1000.0);
        assert_eq!(lines, vec!["a b c"]);
    }

    #[test]
    fn latin_hard_splits_oversized_word() {
        let lines = WrapStrategy::Latin.wrap("hi abcdefghijkl yo", &mut mono(), 50.0);
        assert_eq!(lines, vec!["hi", "abcde", "fghij", "kl yo"]);
        assert_width_bound(&lines, 50.0);
    }

    #[test]
    fn generic_wraps_per_character() {
        let lines = WrapStrategy::Generic.wrap("ありがとうございます", &mut mono(), 40.0);
        assert_eq!(lines, vec!["ありがと", "うござい", "ます"]);
        assert_width_bound(&lines, 40.0);
    }

    #[test]
    fn oversized_single_characters_are_kept_alone() {
        let lines = WrapStrategy::Generic.wrap("abc", &mut mono(), 5.0);
        assert_eq!(lines, vec!["a", "b", "c"]);
        assert_width_bound(&lines, 5.0);

        let lines = WrapStrategy::Latin.wrap("abc", &mut mono(), 5.0);
        assert_eq!(lines, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_text_yields_one_empty_line() {
        for s in [
            WrapStrategy::Latin,
            WrapStrategy::Generic,
        ] {
            assert_eq!(s.wrap("", &mut mono(), 100.0), vec![String::new()]);
            assert_eq!(s.wrap("   ", &mut mono(), 100.0), vec![String::new()]);
        }
    }

    #[test]
    fn cjk_segmented_keeps_words_together() {
        let strategy = WrapStrategy::for_script(Script::Cjk);
        let text = "我们中出了一个叛徒";
        let lines = strategy.wrap(text, &mut mono(), 60.0);
        assert_eq!(lines.concat(), text);
        assert_width_bound(&lines, 60.0);
        assert!(lines.len() >= 2);
    }

    #[test]
    fn wrapping_preserves_all_characters() {
        let text = "supercalifragilistic expialidocious is quite long";
        let lines = WrapStrategy::Latin.wrap(text, &mut mono(), 70.0);
        let rejoined: String = lines.concat().split_whitespace().collect();
        let expected: String = text.split_whitespace().collect();
        assert_eq!(rejoined, expected);
        assert_width_bound(&lines, 70.0);
    }
}
