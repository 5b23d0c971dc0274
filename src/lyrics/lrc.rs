//! LRC parser.
//!
//! Supports the common `[mm:ss.xx]text` line format, several timestamps sharing one text,
//! metadata tags (ignored) and the `[offset:ms]` tag.

use std::path::Path;

use crate::foundation::error::{LyricReelError, LyricReelResult};

/// One timed lyric line with its `[start, end)` display window in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct LyricEntry {
    /// Window start in seconds.
    pub start: f64,
    /// Window end in seconds (exclusive).
    pub end: f64,
    /// Trimmed, non-empty lyric text.
    pub text: String,
}

impl LyricEntry {
    /// Return `true` when `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

enum Tag {
    Time(i64),
    Offset(i64),
    Meta,
}

/// Parse a timestamp body such as `01:02.30`, `01:02:30`, `1:02.345` or `01:02` into ms.
fn parse_time_ms(body: &str) -> Option<i64> {
    let (min, rest) = body.split_once(':')?;
    if min.is_empty() || !min.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let min: i64 = min.parse().ok()?;

    let (sec, frac) = match rest.find(['.', ':']) {
        Some(i) => (&rest[..i], Some(&rest[i + 1..])),
        None => (rest, None),
    };
    if sec.is_empty() || !sec.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let sec: i64 = sec.parse().ok()?;

    let ms = match frac {
        None => 0,
        Some(f) if f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit()) => return None,
        Some(f) => {
            let v: i64 = f.parse().ok()?;
            match f.len() {
                1 => v * 100,
                2 => v * 10,
                3 => v,
                _ => return None,
            }
        }
    };

    min.checked_mul(60_000)?
        .checked_add(sec.checked_mul(1000)?)?
        .checked_add(ms)
}

fn parse_tag(body: &str) -> Tag {
    if let Some(ms) = parse_time_ms(body) {
        return Tag::Time(ms);
    }
    if let Some((key, value)) = body.split_once(':')
        && key.trim().eq_ignore_ascii_case("offset")
        && let Ok(ms) = value.trim().parse::<i64>()
    {
        return Tag::Offset(ms);
    }
    Tag::Meta
}

struct RawLine {
    start_ms: i64,
    text: String,
}

/// Parse LRC text into ordered lyric entries.
///
/// Blank lines are discarded; each entry ends where the next one starts and the last one ends at
/// `duration`. When several entries share a timestamp, the first one in source order wins.
/// Entries starting at or after `duration` are dropped. An empty result is not an error.
pub fn parse_lrc(src: &str, duration: f64) -> Vec<LyricEntry> {
    let mut raw = Vec::<RawLine>::new();
    let mut offset_ms: i64 = 0;

    for line in src.lines() {
        let mut rest = line.trim();
        let mut stamps = Vec::new();

        while let Some(body_and_rest) = rest.strip_prefix('[') {
            let Some(close) = body_and_rest.find(']') else {
                break;
            };
            match parse_tag(&body_and_rest[..close]) {
                Tag::Time(ms) => stamps.push(ms),
                Tag::Offset(ms) => offset_ms = ms,
                Tag::Meta => {}
            }
            rest = &body_and_rest[close + 1..];
        }

        if stamps.is_empty() {
            continue;
        }
        let text = rest.trim();
        if text.is_empty() {
            continue;
        }
        for start_ms in stamps {
            raw.push(RawLine {
                start_ms,
                text: text.to_string(),
            });
        }
    }

    // The offset tag applies to the whole file, wherever it appears.
    for r in &mut raw {
        r.start_ms = r.start_ms.saturating_sub(offset_ms).max(0);
    }

    // Stable: equal timestamps keep source order.
    raw.sort_by_key(|r| r.start_ms);
    raw.dedup_by_key(|r| r.start_ms);

    let starts: Vec<f64> = raw.iter().map(|r| r.start_ms as f64 / 1000.0).collect();
    let total = raw.len();
    let mut entries = Vec::with_capacity(total);
    for (i, r) in raw.into_iter().enumerate() {
        let start = starts[i];
        if !(start < duration) {
            tracing::warn!(
                dropped = total - i,
                duration,
                "dropping lyric lines past the end of the audio"
            );
            break;
        }
        let end = starts.get(i + 1).copied().unwrap_or(duration).min(duration);
        entries.push(LyricEntry {
            start,
            end,
            text: r.text,
        });
    }
    entries
}

/// Read and parse an LRC file.
///
/// Fails with [`LyricReelError::Parse`] when the file cannot be read or is not valid UTF-8
/// (a byte-order mark is accepted).
pub fn read_lrc_file(path: &Path, duration: f64) -> LyricReelResult<Vec<LyricEntry>> {
    let bytes = std::fs::read(path).map_err(|e| {
        LyricReelError::parse(format!("failed to read '{}': {e}", path.display()))
    })?;
    let (text, had_errors) = encoding_rs::UTF_8.decode_with_bom_removal(&bytes);
    if had_errors {
        return Err(LyricReelError::parse(format!(
            "'{}' is not valid UTF-8",
            path.display()
        )));
    }
    Ok(parse_lrc(&text, duration))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_basic_lines_and_chains_ends() {
        let src = "[00:00.00]Hello\n[00:05.00]World\n";
        let entries = parse_lrc(src, 10.0);
        assert_eq!(
            entries,
            vec![
                LyricEntry {
                    start: 0.0,
                    end: 5.0,
                    text: "Hello".into()
                },
                LyricEntry {
                    start: 5.0,
                    end: 10.0,
                    text: "World".into()
                },
            ]
        );
    }

    #[test]
    fn blank_lines_and_metadata_are_dropped() {
        let src = "[ti:Song]\n[ar:Someone]\n[00:01.00]  \n[00:02.50] a \n\nplain text\n[00:04.00]b";
        let entries = parse_lrc(src, 8.0);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "a");
        assert_eq!(entries[0].start, 2.5);
        assert_eq!(entries[0].end, 4.0);
        assert_eq!(entries[1].end, 8.0);
    }

    #[test]
    fn fraction_precision_variants() {
        assert_eq!(parse_time_ms("01:02.3"), Some(62_300));
        assert_eq!(parse_time_ms("01:02.30"), Some(62_300));
        assert_eq!(parse_time_ms("01:02.345"), Some(62_345));
        assert_eq!(parse_time_ms("01:02:30"), Some(62_300));
        assert_eq!(parse_time_ms("01:02"), Some(62_000));
        assert_eq!(parse_time_ms("ar:x"), None);
        assert_eq!(parse_time_ms("01:02.3456"), None);
    }

    #[test]
    fn multiple_timestamps_share_text_and_sort() {
        let src = "[00:03.00][00:01.00]chorus\n[00:02.00]verse";
        let entries = parse_lrc(src, 5.0);
        let got: Vec<(f64, &str)> = entries.iter().map(|e| (e.start, e.text.as_str())).collect();
        assert_eq!(got, vec![(1.0, "chorus"), (2.0, "verse"), (3.0, "chorus")]);
    }

    #[test]
    fn identical_timestamps_keep_first_in_source_order() {
        let src = "[00:01.00]first\n[00:01.00]second\n[00:02.00]third";
        let entries = parse_lrc(src, 4.0);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text, "first");
        assert_eq!(entries[0].end, 2.0);
    }

    #[test]
    fn offset_tag_shifts_lines_earlier() {
        let src = "[offset:500]\n[00:01.00]a\n[00:00.20]b";
        let entries = parse_lrc(src, 3.0);
        assert_eq!(entries[0].start, 0.0);
        assert_eq!(entries[0].text, "b");
        assert_eq!(entries[1].start, 0.5);
    }

    #[test]
    fn oversized_timestamps_are_not_times() {
        assert_eq!(parse_time_ms("999999999999999999:00.00"), None);
        assert_eq!(parse_time_ms("1:9223372036854775807"), None);

        let src = "[999999999999999999:00.00]x\n[00:01.00]ok";
        let entries = parse_lrc(src, 5.0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "ok");
    }

    #[test]
    fn extreme_offsets_saturate() {
        let entries = parse_lrc("[offset:-9223372036854775808]\n[00:01.00]a", 5.0);
        assert!(entries.is_empty());

        let entries = parse_lrc("[offset:9223372036854775807]\n[00:01.00]a\n[00:02.00]b", 5.0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start, 0.0);
        assert_eq!(entries[0].text, "a");
    }

    #[test]
    fn lines_past_duration_are_dropped() {
        let src = "[00:01.00]a\n[00:09.00]b";
        let entries = parse_lrc(src, 5.0);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].end, 5.0);
    }

    #[test]
    fn entries_are_strictly_ordered_and_contiguous() {
        let src = "[00:00.50]a\n[00:01.25]b\n[00:01.25]c\n[00:03.00]d\n[00:02.00]e";
        let duration = 6.0;
        let entries = parse_lrc(src, duration);
        for pair in entries.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert_eq!(pair[0].end, pair[1].start);
        }
        for e in &entries {
            assert!(e.start < e.end);
        }
        assert_eq!(entries.last().unwrap().end, duration);
    }

    #[test]
    fn no_timed_lines_is_empty_not_error() {
        assert!(parse_lrc("", 10.0).is_empty());
        assert!(parse_lrc("[ti:x]\njust words", 10.0).is_empty());
    }

    #[test]
    fn read_rejects_invalid_utf8_and_accepts_bom() {
        let dir = std::path::PathBuf::from("target").join("lrc_read_tests");
        std::fs::create_dir_all(&dir).unwrap();

        let bad = dir.join("bad.lrc");
        std::fs::write(&bad, [b'[', b'0', 0xff, 0xfe, b'\n']).unwrap();
        let err = read_lrc_file(&bad, 10.0).unwrap_err();
        assert!(matches!(err, LyricReelError::Parse(_)));

        let bom = dir.join("bom.lrc");
        let mut bytes = vec![0xef, 0xbb, 0xbf];
        bytes.extend_from_slice("[00:01.00]hi".as_bytes());
        std::fs::write(&bom, bytes).unwrap();
        let entries = read_lrc_file(&bom, 10.0).unwrap();
        assert_eq!(entries[0].text, "hi");

        let missing = dir.join("nope.lrc");
        assert!(matches!(
            read_lrc_file(&missing, 10.0),
            Err(LyricReelError::Parse(_))
        ));
    }
}
