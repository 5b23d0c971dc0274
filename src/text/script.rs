/// Dominant script of a song's lyrics, used to pick fonts and the wrap strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    /// Space-delimited scripts.
    Latin,
    /// Text containing CJK Unified Ideographs (Chinese, and kanji-bearing Japanese).
    Cjk,
    /// Kana-only Japanese.
    Japanese,
}

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}')
}

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}')
}

/// Best-effort script detection over the whole song text (not per line).
///
/// Ideographs win over kana, so Japanese lyrics containing kanji are treated as [`Script::Cjk`].
pub fn detect_script(text: &str) -> Script {
    if text.chars().any(is_cjk_ideograph) {
        return Script::Cjk;
    }
    if text.chars().any(is_kana) {
        return Script::Japanese;
    }
    Script::Latin
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scripts() {
        assert_eq!(detect_script(""), Script::Latin);
        assert_eq!(detect_script("Hello world"), Script::Latin);
        assert_eq!(detect_script("Hello 世界"), Script::Cjk);
        assert_eq!(detect_script("ありがとう"), Script::Japanese);
        assert_eq!(detect_script("カタカナ"), Script::Japanese);
        assert_eq!(detect_script("夢を見た"), Script::Cjk);
    }
}
