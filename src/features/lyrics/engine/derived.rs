//! Secondary lyric tracks aligned with the primary document
//!
//! Translations arrive as untimed text, one entry per primary line.
//! Transliterations arrive pre-tokenized, one unit per primary unit. Both are
//! rebuilt as new documents that borrow their timing from the primary track.

use super::tokenizer::{is_latin_word, tokenize};
use super::types::{Document, DocumentKind, LyricLine};

/// Build a translation track from one text per primary line
///
/// Each derived line copies the primary line's start and end. With
/// `word_timed` set, the text is tokenized and the primary line's total
/// duration is spread evenly over the new units (integer division, the
/// remainder is dropped).
///
/// Returns `None` when either side is empty or the line counts differ.
pub fn build_word_timed_derived(
    primary: &Document,
    secondary_text: &[String],
    word_timed: bool,
) -> Option<Document> {
    if primary.is_empty() || secondary_text.is_empty() {
        return None;
    }
    if primary.len() != secondary_text.len() {
        tracing::warn!(
            "Translation has {} lines, primary has {}; ignoring",
            secondary_text.len(),
            primary.len()
        );
        return None;
    }

    let lines = primary
        .iter()
        .zip(secondary_text)
        .map(|(line, text)| {
            if word_timed {
                let words = tokenize(text);
                let total: u64 = line.word_durations().iter().sum();
                let average = total / words.len() as u64;
                let durations = vec![average; words.len()];
                LyricLine::from_parts(
                    line.sequence(),
                    line.start_ms(),
                    line.end_ms(),
                    text.clone(),
                    Some(words),
                    durations,
                )
            } else {
                LyricLine::from_parts(
                    line.sequence(),
                    line.start_ms(),
                    line.end_ms(),
                    text.clone(),
                    None,
                    Vec::new(),
                )
            }
        })
        .collect();

    let kind = if word_timed {
        DocumentKind::WordTimed
    } else {
        primary.kind()
    };
    tracing::debug!("Built {:?} translation track with {} lines", kind, primary.len());
    Some(Document::new(kind, lines))
}

/// Build a transliteration track aligned unit-for-unit with the primary
///
/// Spacing follows the primary units: a primary unit that ends a word gets a
/// trailing space, blank units become a single space, and Latin-letter
/// tokens are separated by a space. Other scripts stay contiguous.
///
/// Only word-timed primaries are supported. Returns `None` for a plain or
/// empty primary, or when the line counts differ.
pub fn build_latin_aware_derived(primary: &Document, secondary: &Document) -> Option<Document> {
    if primary.is_empty() || secondary.is_empty() || !primary.is_word_timed() {
        return None;
    }
    if primary.len() != secondary.len() {
        tracing::warn!(
            "Transliteration has {} lines, primary has {}; ignoring",
            secondary.len(),
            primary.len()
        );
        return None;
    }

    let lines = primary
        .iter()
        .zip(secondary)
        .map(|(line, other)| {
            let primary_words = line.words().unwrap_or_default();
            let secondary_words: Vec<String> = match other.words() {
                Some(words) => words.to_vec(),
                None => tokenize(other.text()),
            };

            let words: Vec<String> = primary_words
                .iter()
                .enumerate()
                .map(|(index, primary_word)| {
                    let token = secondary_words.get(index).map_or("", |w| w.trim());
                    align_unit(primary_word, token)
                })
                .collect();

            LyricLine::from_parts(
                line.sequence(),
                line.start_ms(),
                line.end_ms(),
                words.concat(),
                Some(words),
                line.word_durations().to_vec(),
            )
        })
        .collect();

    tracing::debug!("Built transliteration track with {} lines", primary.len());
    Some(Document::new(DocumentKind::WordTimed, lines))
}

/// Spacing rule for one transliterated unit (`token` already trimmed)
fn align_unit(primary_word: &str, token: &str) -> String {
    if primary_word.contains(' ') {
        format!("{token} ")
    } else if token.is_empty() {
        " ".to_string()
    } else if is_latin_word(token) {
        format!("{token} ")
    } else {
        token.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn primary() -> Document {
        Document::word_timed(vec![
            LyricLine::word_timed(0, strings(&["你", "好"]), vec![500, 503]),
            LyricLine::word_timed(2000, strings(&["Hel", "lo ", "you"]), vec![300, 300, 400]),
        ])
    }

    #[test]
    fn test_translation_spreads_duration_evenly() {
        let derived =
            build_word_timed_derived(&primary(), &strings(&["hi there", "你好"]), true).unwrap();
        assert_eq!(derived.len(), 2);
        assert!(derived.is_word_timed());

        let first = &derived.lines()[0];
        assert_eq!(first.words().unwrap(), &strings(&["hi ", "there"])[..]);
        // 1003 / 2 truncates
        assert_eq!(first.word_durations(), &[501, 501]);
        assert_eq!(first.start_ms(), 0);
        assert_eq!(first.end_ms(), 1003);

        let second = &derived.lines()[1];
        assert_eq!(second.word_durations(), &[500, 500]);
        assert_eq!(second.start_ms(), 2000);
        assert_eq!(second.end_ms(), 3000);
    }

    #[test]
    fn test_translation_keeps_primary_timing() {
        let doc = primary();
        let derived = build_word_timed_derived(&doc, &strings(&["a", "b"]), false).unwrap();
        for (line, other) in doc.iter().zip(&derived) {
            assert_eq!(line.start_ms(), other.start_ms());
            assert_eq!(line.end_ms(), other.end_ms());
            assert!(other.words().is_none());
        }
    }

    #[test]
    fn test_translation_of_plain_document() {
        let doc = Document::plain([(0, "一"), (1500, "二")]);
        let derived = build_word_timed_derived(&doc, &strings(&["one", "two"]), false).unwrap();
        assert_eq!(derived.kind(), DocumentKind::Plain);
        assert_eq!(derived.lines()[0].end_ms(), 1500);
        assert_eq!(derived.lines()[1].text(), "two");
    }

    #[test]
    fn test_translation_rejects_bad_input() {
        let doc = primary();
        assert!(build_word_timed_derived(&doc, &[], true).is_none());
        assert!(build_word_timed_derived(&doc, &strings(&["only one"]), true).is_none());
        assert!(build_word_timed_derived(&Document::default(), &strings(&["x"]), true).is_none());
    }

    #[test]
    fn test_translation_of_blank_line_has_one_unit() {
        let derived = build_word_timed_derived(&primary(), &strings(&["", "x"]), true).unwrap();
        assert_eq!(derived.lines()[0].words().unwrap().len(), 1);
        assert_eq!(derived.lines()[0].word_durations(), &[1003]);
    }

    #[test]
    fn test_transliteration_spacing_rules() {
        let secondary = Document::word_timed(vec![
            LyricLine::word_timed(0, strings(&["ni", "hao"]), vec![1, 1]),
            LyricLine::word_timed(0, strings(&["ハ", " ", "ゆ"]), vec![1, 1, 1]),
        ]);
        let derived = build_latin_aware_derived(&primary(), &secondary).unwrap();

        let first = &derived.lines()[0];
        assert_eq!(first.words().unwrap(), &strings(&["ni ", "hao "])[..]);
        assert_eq!(first.text(), "ni hao ");
        assert_eq!(first.word_durations(), &[500, 503]);

        let second = &derived.lines()[1];
        // "lo " ends a word, blank token becomes a single space either way
        assert_eq!(second.words().unwrap(), &strings(&["ハ", " ", "ゆ"])[..]);
        assert_eq!(second.start_ms(), 2000);
        assert_eq!(second.end_ms(), 3000);
    }

    #[test]
    fn test_transliteration_missing_units_are_blank() {
        let secondary = Document::word_timed(vec![
            LyricLine::word_timed(0, strings(&["ni"]), vec![1]),
            LyricLine::word_timed(0, strings(&["a", "b", "c"]), vec![1, 1, 1]),
        ]);
        let derived = build_latin_aware_derived(&primary(), &secondary).unwrap();
        assert_eq!(derived.lines()[0].words().unwrap(), &strings(&["ni ", " "])[..]);
    }

    #[test]
    fn test_transliteration_requires_word_timed_primary() {
        let plain = Document::plain([(0, "a"), (100, "b")]);
        let secondary = primary();
        assert!(build_latin_aware_derived(&plain, &secondary).is_none());
        assert!(build_latin_aware_derived(&primary(), &Document::plain([(0, "x")])).is_none());
    }
}
