//! Word tokenization for karaoke timing
//!
//! Karaoke timing is authored per character for CJK text but per word for
//! Latin text. The tokenizer mirrors that:
//!
//! - CJK ideographs, Hangul syllables and Hiragana each become their own unit
//! - runs of any other non-space characters form one unit
//! - whitespace is glued onto the unit before it, so highlight width includes it
//!
//! ## Example
//!
//! Input: `"你好 world"`
//! Output: `["你", "好 ", "world"]`

/// Check if a character is timed on its own (CJK ideograph, Hangul syllable or Hiragana)
fn is_standalone_char(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}') || // CJK Unified Ideographs
    matches!(c, '\u{3400}'..='\u{4DBF}') || // CJK Extension A
    matches!(c, '\u{20000}'..='\u{2A6DF}') || // CJK Extension B
    matches!(c, '\u{F900}'..='\u{FAFF}') || // CJK Compatibility Ideographs
    matches!(c, '\u{AC00}'..='\u{D7AF}') || // Hangul Syllables
    matches!(c, '\u{3040}'..='\u{309F}') // Hiragana
}

/// Check if a string consists only of ASCII letters
pub fn is_latin_word(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_alphabetic())
}

/// Split a line of text into timing units
///
/// Concatenating the result always reproduces `text`. An empty input yields a
/// single empty unit so unit counts stay aligned with duration arrays. A
/// whitespace-only input yields one unit holding that whitespace.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut units: Vec<String> = Vec::new();
    let mut pending = String::new();

    for c in text.chars() {
        if is_standalone_char(c) {
            if !pending.is_empty() {
                units.push(std::mem::take(&mut pending));
            }
            units.push(c.to_string());
        } else if c.is_whitespace() {
            if !pending.is_empty() {
                units.push(std::mem::take(&mut pending));
            }
            match units.last_mut() {
                Some(last) => last.push(c),
                None => units.push(c.to_string()),
            }
        } else {
            pending.push(c);
        }
    }

    if !pending.is_empty() {
        units.push(pending);
    }

    if units.is_empty() {
        units.push(String::new());
    }

    units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cjk_space_attaches_to_previous() {
        assert_eq!(tokenize("你好 world"), vec!["你", "好 ", "world"]);
    }

    #[test]
    fn test_latin_words_keep_trailing_space() {
        assert_eq!(tokenize("Hello big world"), vec!["Hello ", "big ", "world"]);
    }

    #[test]
    fn test_hangul_and_hiragana_split_per_char() {
        assert_eq!(tokenize("사랑"), vec!["사", "랑"]);
        assert_eq!(tokenize("ありがとう"), vec!["あ", "り", "が", "と", "う"]);
    }

    #[test]
    fn test_katakana_stays_grouped() {
        // Katakana is not timed per character
        assert_eq!(tokenize("カタカナ"), vec!["カタカナ"]);
    }

    #[test]
    fn test_mixed_run_flushes_before_cjk() {
        assert_eq!(tokenize("abc中def"), vec!["abc", "中", "def"]);
    }

    #[test]
    fn test_empty_input_yields_one_unit() {
        assert_eq!(tokenize(""), vec![""]);
    }

    #[test]
    fn test_leading_whitespace_becomes_first_unit() {
        assert_eq!(tokenize("  hi"), vec!["  ", "hi"]);
        assert_eq!(tokenize("   "), vec!["   "]);
    }

    #[test]
    fn test_blank_line_is_one_whitespace_unit() {
        assert_eq!(tokenize(" "), vec![" "]);
        assert_eq!(tokenize("\t \n"), vec!["\t \n"]);
        assert_ne!(tokenize("  "), vec![""]);
    }

    #[test]
    fn test_consecutive_spaces_merge() {
        assert_eq!(tokenize("a  b"), vec!["a  ", "b"]);
    }

    #[test]
    fn test_round_trip_is_lossless() {
        let samples = [
            "",
            " ",
            "你好 world",
            "  leading and trailing  ",
            "混合 text、with，标点！",
            "사랑해 I love you ありがとう",
            "tab\tseparated\nnewline",
        ];
        for sample in samples {
            assert_eq!(tokenize(sample).concat(), sample, "round trip of {sample:?}");
        }
    }

    #[test]
    fn test_is_latin_word() {
        assert!(is_latin_word("Hello"));
        assert!(!is_latin_word("hello1"));
        assert!(!is_latin_word("ai shi"));
        assert!(!is_latin_word("あい"));
        assert!(!is_latin_word(""));
    }
}
