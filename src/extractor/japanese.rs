use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    Hiragana,
    Katakana,
    Kanji,
}

const SCRIPT_RANGES: [(Script, RangeInclusive<char>); 3] = [
    (Script::Hiragana, '\u{3040}'..='\u{309F}'),
    (Script::Katakana, '\u{30A0}'..='\u{30FF}'),
    (Script::Kanji, '\u{4E00}'..='\u{9FFF}'),
];

pub fn script_of(c: char) -> Option<Script> {
    SCRIPT_RANGES
        .iter()
        .find(|(_, range)| range.contains(&c))
        .map(|(script, _)| *script)
}

/// True if at least one character is Hiragana, Katakana or a CJK unified
/// ideograph. Mixed-script lines pass.
pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(|c| script_of(c).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_boundaries() {
        assert_eq!(script_of('\u{3040}'), Some(Script::Hiragana));
        assert_eq!(script_of('\u{309F}'), Some(Script::Hiragana));
        assert_eq!(script_of('\u{30A0}'), Some(Script::Katakana));
        assert_eq!(script_of('\u{30FF}'), Some(Script::Katakana));
        assert_eq!(script_of('\u{4E00}'), Some(Script::Kanji));
        assert_eq!(script_of('\u{9FFF}'), Some(Script::Kanji));

        assert_eq!(script_of('\u{303F}'), None);
        assert_eq!(script_of('\u{3100}'), None);
        assert_eq!(script_of('\u{4DFF}'), None);
        assert_eq!(script_of('\u{A000}'), None);
    }

    #[test]
    fn test_japanese_lines() {
        assert!(contains_japanese("こんにちは"));
        assert!(contains_japanese("カタカナ"));
        assert!(contains_japanese("漢字"));
        assert!(contains_japanese("Hello 世界!"));
        assert!(contains_japanese("...ね?"));
        assert!(contains_japanese("ー"));
    }

    #[test]
    fn test_non_japanese_lines() {
        assert!(!contains_japanese(""));
        assert!(!contains_japanese("Hello"));
        assert!(!contains_japanese("123"));
        assert!(!contains_japanese("!?.,;:()[]"));
        assert!(!contains_japanese("안녕하세요"));
        // Fullwidth forms and CJK punctuation are outside the ranges.
        assert!(!contains_japanese("！？"));
        assert!(!contains_japanese("「」。、"));
    }
}
