//! Line reflow for fixed-width display
//!
//! Splits lines wider than the layout width into sub-lines without breaking
//! their timing:
//!
//! - word-timed lines are split greedily on unit boundaries; each sub-line
//!   keeps the durations of its own units and starts where the previous one
//!   ends
//! - plain lines are split on characters, preferring clause punctuation, and
//!   every fragment shares the parent's start time
//!
//! Text measurement is injected through [`MeasureText`] so the engine never
//! touches fonts directly.

use std::borrow::Cow;

use super::timeline::WordPosition;
use super::types::LyricLine;

/// Clause-ending punctuation preferred as plain-line break points
pub const CLAUSE_PUNCTUATION: [char; 5] = ['，', '！', '；', '。', '、'];

/// Width of rendered text in layout units
pub trait MeasureText {
    fn measure(&self, text: &str) -> f32;
}

impl<F> MeasureText for F
where
    F: Fn(&str) -> f32,
{
    fn measure(&self, text: &str) -> f32 {
        self(text)
    }
}

/// Split `line` into sub-lines no wider than `max_width`
///
/// A line that already fits comes back borrowed, unchanged. The result is
/// never empty.
pub fn reflow<'a>(
    line: &'a LyricLine,
    max_width: f32,
    measure: &dyn MeasureText,
) -> Vec<Cow<'a, LyricLine>> {
    let line_width = measure.measure(line.text().trim());
    if line_width <= max_width {
        return vec![Cow::Borrowed(line)];
    }

    let result = match line.words() {
        Some(words) => split_word_timed(line, words, max_width, measure),
        None => split_plain(line, line_width, max_width, measure),
    };

    if result.is_empty() {
        return vec![Cow::Borrowed(line)];
    }
    tracing::trace!(
        "Reflowed line {} ({:.1} > {:.1}) into {} sub-lines",
        line.sequence(),
        line_width,
        max_width,
        result.len()
    );
    result
}

/// Greedy split on unit boundaries
fn split_word_timed<'a>(
    line: &'a LyricLine,
    words: &[String],
    max_width: f32,
    measure: &dyn MeasureText,
) -> Vec<Cow<'a, LyricLine>> {
    let cumulative = line.cumulative_widths(measure);
    let width_of = |index: usize| cumulative[index + 1] - cumulative[index];

    let mut result = Vec::new();
    let mut line_width = 0.0f32;
    let mut start = 0;
    for index in 0..words.len() {
        line_width += width_of(index);
        let next_width = if index + 1 < words.len() {
            width_of(index + 1)
        } else {
            0.0
        };

        if line_width + next_width > max_width {
            result.push(Cow::Owned(word_timed_sub_line(line, words, start, index)));
            line_width = 0.0;
            start = index + 1;
        } else if index == words.len() - 1 {
            result.push(Cow::Owned(word_timed_sub_line(line, words, start, index)));
        }
    }
    result
}

/// Build the sub-line covering units `first..=last`
fn word_timed_sub_line(line: &LyricLine, words: &[String], first: usize, last: usize) -> LyricLine {
    let durations = line.word_durations();
    let start_ms = line.start_ms() + durations[..first].iter().sum::<u64>();
    let sub_durations = durations[first..=last].to_vec();
    let end_ms = start_ms + sub_durations.iter().sum::<u64>();
    let sub_words = words[first..=last].to_vec();

    LyricLine::from_parts(
        line.sequence(),
        start_ms,
        end_ms,
        sub_words.concat(),
        Some(sub_words),
        sub_durations,
    )
}

/// Character split for lines without unit timing
///
/// Once the accumulated width is within 3x of the overflow, the rest of the
/// line is cut in two: at the last clause punctuation in the current span, or
/// at the span's midpoint. This avoids one-character orphan rows.
fn split_plain<'a>(
    line: &'a LyricLine,
    line_width: f32,
    max_width: f32,
    measure: &dyn MeasureText,
) -> Vec<Cow<'a, LyricLine>> {
    let chars: Vec<char> = line.text().trim().chars().collect();
    let widths: Vec<f32> = chars
        .iter()
        .map(|c| {
            let mut buf = [0u8; 4];
            measure.measure(c.encode_utf8(&mut buf))
        })
        .collect();

    let mut fragments: Vec<String> = Vec::new();
    let mut span_width = 0.0f32;
    let mut start = 0;
    for index in 0..chars.len() {
        span_width += widths[index];
        let next_width = widths.get(index + 1).copied().unwrap_or(0.0);

        if span_width + next_width > max_width {
            if line_width - max_width < 3.0 * span_width {
                let split = chars[start..=index]
                    .iter()
                    .rposition(|c| CLAUSE_PUNCTUATION.contains(c))
                    .map(|offset| start + offset)
                    .unwrap_or(start + (index - start) / 2);
                fragments.push(chars[start..=split].iter().collect());
                fragments.push(chars[split + 1..].iter().collect());
                break;
            }
            fragments.push(chars[start..=index].iter().collect());
            span_width = 0.0;
            start = index + 1;
        } else if index == chars.len() - 1 {
            fragments.push(chars[start..].iter().collect());
        }
    }

    fragments
        .iter()
        .map(|fragment| trim_clause_punctuation(fragment.trim()))
        .filter(|fragment| !fragment.is_empty())
        .map(|fragment| {
            Cow::Owned(LyricLine::from_parts(
                line.sequence(),
                line.start_ms(),
                line.end_ms(),
                fragment.to_string(),
                None,
                Vec::new(),
            ))
        })
        .collect()
}

/// Drop one clause punctuation mark from each end of a fragment
pub fn trim_clause_punctuation(text: &str) -> &str {
    let text = text.strip_prefix(CLAUSE_PUNCTUATION).unwrap_or(text);
    text.strip_suffix(CLAUSE_PUNCTUATION).unwrap_or(text)
}

/// Width of the highlighted part of a line
///
/// Plain lines and finished lines are fully highlighted. Inside a unit the
/// highlight grows linearly with the time spent in it.
pub fn highlight_width(
    line: &LyricLine,
    position: WordPosition,
    elapsed_in_word_ms: u64,
    measure: &dyn MeasureText,
) -> f32 {
    let Some(words) = line.words() else {
        return measure.measure(line.text());
    };

    match position {
        WordPosition::NotStarted => 0.0,
        WordPosition::LineDone => measure.measure(line.text()),
        WordPosition::Active(index) => {
            let Some(word) = words.get(index) else {
                return 0.0;
            };
            let before = line.cumulative_widths(measure)[index];
            let word_width = measure.measure(word.trim());
            let duration = line.word_durations()[index];
            let progress = if duration == 0 {
                1.0
            } else {
                (elapsed_in_word_ms as f32 / duration as f32).min(1.0)
            };
            before + word_width * progress
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 10 units per character
    fn ten_per_char(text: &str) -> f32 {
        text.chars().count() as f32 * 10.0
    }

    fn owned_texts(lines: &[Cow<'_, LyricLine>]) -> Vec<String> {
        lines.iter().map(|l| l.text().to_string()).collect()
    }

    fn karaoke(words: &[&str], durations: &[u64]) -> LyricLine {
        LyricLine::word_timed(
            1000,
            words.iter().map(|w| w.to_string()).collect(),
            durations.to_vec(),
        )
    }

    #[test]
    fn test_fitting_line_is_borrowed() {
        let line = LyricLine::plain(0, "short");
        let result = reflow(&line, 100.0, &ten_per_char);
        assert_eq!(result.len(), 1);
        assert!(matches!(result[0], Cow::Borrowed(l) if std::ptr::eq(l, &line)));
    }

    #[test]
    fn test_word_timed_split_keeps_timing() {
        let line = karaoke(&["one ", "two ", "three ", "four"], &[200, 300, 400, 500]);
        let result = reflow(&line, 90.0, &ten_per_char);
        assert_eq!(owned_texts(&result), vec!["one two ", "three ", "four"]);

        assert_eq!(result[0].start_ms(), 1000);
        assert_eq!(result[0].end_ms(), 1500);
        assert_eq!(result[1].start_ms(), 1500);
        assert_eq!(result[1].word_durations(), &[400]);
        assert_eq!(result[2].start_ms(), 1900);
        assert_eq!(result[2].end_ms(), 2400);

        let total: u64 = result.iter().map(|l| l.duration_ms()).sum();
        assert_eq!(total, line.duration_ms());
        assert_eq!(result.iter().map(|l| l.text()).collect::<String>(), line.text());
    }

    #[test]
    fn test_oversized_first_unit_gets_own_row() {
        let line = karaoke(&["enormous ", "a"], &[100, 100]);
        let result = reflow(&line, 50.0, &ten_per_char);
        assert_eq!(owned_texts(&result), vec!["enormous ", "a"]);
    }

    #[test]
    fn test_zero_units_still_yield_a_row() {
        let line = LyricLine::word_timed(0, Vec::new(), Vec::new());
        let result = reflow(&line, -1.0, &ten_per_char);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_zero_width_measure_never_splits() {
        let line = karaoke(&["a ", "b"], &[100, 100]);
        let result = reflow(&line, 0.0, &|_: &str| 0.0);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_plain_split_prefers_clause_punctuation() {
        // 20 characters of 25 each, comma is the 10th character
        let text = "一二三四五六七八九，十百千万亿甲乙丙丁戊";
        let line = LyricLine::plain(3000, text);
        let measure = |t: &str| t.chars().count() as f32 * 25.0;
        let result = reflow(&line, 300.0, &measure);
        assert_eq!(owned_texts(&result), vec!["一二三四五六七八九", "十百千万亿甲乙丙丁戊"]);
        assert!(result.iter().all(|l| l.start_ms() == 3000));
        assert!(result.iter().all(|l| l.words().is_none()));
    }

    #[test]
    fn test_plain_split_falls_back_to_midpoint() {
        let text = "abcdefghijklmnopqrst";
        let line = LyricLine::plain(0, text);
        let result = reflow(&line, 120.0, &ten_per_char);
        // Overflow at index 11, span 0..=11 has no punctuation, midpoint is index 5
        assert_eq!(owned_texts(&result), vec!["abcdef", "ghijklmnopqrst"]);
    }

    #[test]
    fn test_plain_split_drops_space_at_split_point() {
        let line = LyricLine::plain(0, "abcdef ghijklmnopqrs");
        let result = reflow(&line, 120.0, &ten_per_char);
        assert_eq!(owned_texts(&result), vec!["abcdef", "ghijklmnopqrs"]);
        assert!(result.iter().all(|l| l.text().trim() == l.text()));
    }

    #[test]
    fn test_plain_split_far_over_width_cuts_rows() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let line = LyricLine::plain(0, text);
        let result = reflow(&line, 50.0, &ten_per_char);
        assert_eq!(result[0].text(), "abcde");
        assert_eq!(result.iter().map(|l| l.text()).collect::<String>(), text);
    }

    #[test]
    fn test_plain_punctuation_only_fragments_are_dropped() {
        let line = LyricLine::plain(0, "，，，，，");
        let result = reflow(&line, 20.0, &ten_per_char);
        assert!(!result.is_empty());
        assert!(result.iter().all(|l| !l.text().is_empty()));
    }

    #[test]
    fn test_trim_clause_punctuation() {
        assert_eq!(trim_clause_punctuation("，你好。"), "你好");
        assert_eq!(trim_clause_punctuation("、"), "");
        assert_eq!(trim_clause_punctuation("，，"), "");
        assert_eq!(trim_clause_punctuation("你好"), "你好");
        assert_eq!(trim_clause_punctuation("！！好"), "！好");
    }

    #[test]
    fn test_highlight_width_progress() {
        let line = karaoke(&["ab ", "cd"], &[200, 400]);
        assert_eq!(highlight_width(&line, WordPosition::NotStarted, 0, &ten_per_char), 0.0);
        assert_eq!(highlight_width(&line, WordPosition::Active(0), 100, &ten_per_char), 10.0);
        assert_eq!(highlight_width(&line, WordPosition::Active(1), 200, &ten_per_char), 40.0);
        assert_eq!(highlight_width(&line, WordPosition::LineDone, 0, &ten_per_char), 50.0);
        assert_eq!(highlight_width(&line, WordPosition::Active(9), 0, &ten_per_char), 0.0);
    }

    #[test]
    fn test_highlight_width_plain_line_is_full() {
        let line = LyricLine::plain(0, "abc");
        assert_eq!(highlight_width(&line, WordPosition::NotStarted, 0, &ten_per_char), 30.0);
    }
}
