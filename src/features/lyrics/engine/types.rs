//! Core data types for the lyrics engine
//!
//! A [`Document`] is an ordered list of [`LyricLine`]s keyed by their sequence
//! number. Lines are built once by the format layer and stay read-only for the
//! lifetime of a song, apart from two memoized layout caches:
//!
//! - cumulative unit widths (prefix sums of measured word widths)
//! - reflowed sub-lines for the current layout width
//!
//! Both caches are cleared explicitly through the `invalidate_*` methods when
//! the font or layout width changes.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

use super::reflow::{self, MeasureText};

/// Timing resolution of a lyrics document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Line-level timing only (LRC style)
    #[default]
    Plain,
    /// Per-unit timing for karaoke highlighting
    WordTimed,
}

/// Memoized layout state attached to a line
#[derive(Debug, Clone, Default)]
struct LineCache {
    /// Prefix sums of unit widths, `len(words) + 1` entries starting at 0
    cumulative_widths: OnceCell<Vec<f32>>,
    /// Reflowed sub-lines. Empty means the line fits as-is.
    sub_lines: OnceCell<Vec<LyricLine>>,
}

/// A single timed lyric line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    /// Position in the document
    #[serde(default)]
    sequence: usize,
    /// Start time in milliseconds
    start_ms: u64,
    /// End time in milliseconds
    #[serde(default)]
    end_ms: u64,
    /// Full line text
    #[serde(default)]
    text: String,
    /// Timing units (words / characters), word-timed lines only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    words: Option<Vec<String>>,
    /// Duration of each unit in milliseconds
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    word_durations: Vec<u64>,
    #[serde(skip)]
    cache: LineCache,
}

impl LyricLine {
    /// Create a line-timed line. The end time is filled in by [`Document::new`].
    pub fn plain(start_ms: u64, text: impl Into<String>) -> Self {
        Self {
            start_ms,
            end_ms: start_ms,
            text: text.into(),
            ..Default::default()
        }
    }

    /// Create a word-timed line from its units and per-unit durations
    ///
    /// The text is the concatenation of the units and the end time is the start
    /// plus the summed durations. Mismatched lengths are truncated to the
    /// shorter of the two.
    pub fn word_timed(start_ms: u64, words: Vec<String>, word_durations: Vec<u64>) -> Self {
        let mut words = words;
        let mut word_durations = word_durations;
        if words.len() != word_durations.len() {
            tracing::warn!(
                "Unit count {} does not match duration count {}, truncating",
                words.len(),
                word_durations.len()
            );
            let len = words.len().min(word_durations.len());
            words.truncate(len);
            word_durations.truncate(len);
        }

        let text: String = words.concat();
        let end_ms = start_ms + word_durations.iter().sum::<u64>();
        Self {
            start_ms,
            end_ms,
            text,
            words: Some(words),
            word_durations,
            ..Default::default()
        }
    }

    /// Build a line with every field given explicitly
    pub(crate) fn from_parts(
        sequence: usize,
        start_ms: u64,
        end_ms: u64,
        text: String,
        words: Option<Vec<String>>,
        word_durations: Vec<u64>,
    ) -> Self {
        Self {
            sequence,
            start_ms,
            end_ms,
            text,
            words,
            word_durations,
            cache: LineCache::default(),
        }
    }

    /// Repair unit data that did not come through [`LyricLine::word_timed`]
    fn normalize_units(&mut self) {
        let Some(words) = self.words.as_mut() else {
            return;
        };
        if words.len() != self.word_durations.len() {
            tracing::warn!(
                "Line {}: unit count {} does not match duration count {}, truncating",
                self.sequence,
                words.len(),
                self.word_durations.len()
            );
            let len = words.len().min(self.word_durations.len());
            words.truncate(len);
            self.word_durations.truncate(len);
        }
        if self.text.is_empty() {
            self.text = words.concat();
        }
        let units_end = self.start_ms + self.word_durations.iter().sum::<u64>();
        if self.end_ms < units_end {
            self.end_ms = units_end;
        }
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn start_ms(&self) -> u64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> u64 {
        self.end_ms
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Timing units, `None` for line-timed lines
    pub fn words(&self) -> Option<&[String]> {
        self.words.as_deref()
    }

    pub fn word_durations(&self) -> &[u64] {
        &self.word_durations
    }

    /// Whether this line carries per-unit timing
    pub fn is_word_timed(&self) -> bool {
        self.words.is_some()
    }

    /// Total sung duration of the line
    ///
    /// For word-timed lines this is the sum of unit durations; for plain lines
    /// it is the distance to the derived end time.
    pub fn duration_ms(&self) -> u64 {
        if self.is_word_timed() {
            self.word_durations.iter().sum()
        } else {
            self.end_ms.saturating_sub(self.start_ms)
        }
    }

    /// Prefix sums of measured unit widths (memoized)
    ///
    /// Entry `i` is the width of all units before unit `i`; the last entry is
    /// the width of the whole line. Plain lines yield `[0.0]`.
    pub fn cumulative_widths(&self, measure: &dyn MeasureText) -> &[f32] {
        self.cache.cumulative_widths.get_or_init(|| {
            let words = self.words.as_deref().unwrap_or_default();
            let mut widths = Vec::with_capacity(words.len() + 1);
            let mut total = 0.0f32;
            widths.push(total);
            for word in words {
                total += measure.measure(word);
                widths.push(total);
            }
            tracing::trace!("Cached {} unit widths for line {}", words.len(), self.sequence);
            widths
        })
    }

    /// Reflowed sub-lines for `max_width`, computed on first use
    ///
    /// The cache does not remember which width it was built for; call
    /// [`LyricLine::invalidate_sub_lines`] when the layout width changes.
    pub fn reflowed(&self, max_width: f32, measure: &dyn MeasureText) -> &[LyricLine] {
        let cached = self.cache.sub_lines.get_or_init(|| {
            reflow::reflow(self, max_width, measure)
                .into_iter()
                .filter_map(|line| match line {
                    std::borrow::Cow::Borrowed(_) => None,
                    std::borrow::Cow::Owned(line) => Some(line),
                })
                .collect()
        });
        self.sub_lines_view(cached)
    }

    /// Previously computed sub-lines, `None` until [`LyricLine::reflowed`] runs
    pub fn sub_lines(&self) -> Option<&[LyricLine]> {
        self.cache
            .sub_lines
            .get()
            .map(|cached| self.sub_lines_view(cached))
    }

    fn sub_lines_view<'a>(&'a self, cached: &'a [LyricLine]) -> &'a [LyricLine] {
        if cached.is_empty() {
            std::slice::from_ref(self)
        } else {
            cached
        }
    }

    /// Drop the cumulative width cache (font or size changed)
    pub fn invalidate_widths(&mut self) {
        self.cache.cumulative_widths.take();
    }

    /// Drop the reflow cache (layout width or font changed)
    pub fn invalidate_sub_lines(&mut self) {
        self.cache.sub_lines.take();
    }

    /// Drop every memoized layout value
    pub fn invalidate_layout(&mut self) {
        self.invalidate_widths();
        self.invalidate_sub_lines();
    }
}

impl PartialEq for LyricLine {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
            && self.start_ms == other.start_ms
            && self.end_ms == other.end_ms
            && self.text == other.text
            && self.words == other.words
            && self.word_durations == other.word_durations
    }
}

/// Serialized shape of a document, normalized through [`Document::new`]
#[derive(Deserialize)]
struct DocumentRepr {
    #[serde(default)]
    kind: DocumentKind,
    #[serde(default)]
    lines: Vec<LyricLine>,
}

impl From<DocumentRepr> for Document {
    fn from(repr: DocumentRepr) -> Self {
        Document::new(repr.kind, repr.lines)
    }
}

/// An ordered lyrics document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DocumentRepr")]
pub struct Document {
    kind: DocumentKind,
    lines: Vec<LyricLine>,
}

impl Document {
    /// Build a document, enforcing the ordering invariants
    ///
    /// Lines are stably sorted by start time if needed and renumbered from 0.
    /// Plain documents get each line's end set to the next line's start
    /// (the last line never ends).
    pub fn new(kind: DocumentKind, lines: Vec<LyricLine>) -> Self {
        let mut lines = lines;

        if !lines.windows(2).all(|w| w[0].start_ms <= w[1].start_ms) {
            tracing::warn!("Lyrics lines out of order, sorting by start time");
            lines.sort_by_key(|line| line.start_ms);
        }

        for (sequence, line) in lines.iter_mut().enumerate() {
            line.sequence = sequence;
            line.normalize_units();
        }

        if kind == DocumentKind::Plain {
            let mut next_start = u64::MAX;
            for line in lines.iter_mut().rev() {
                line.end_ms = next_start;
                next_start = line.start_ms;
            }
        }

        tracing::debug!("Loaded {:?} lyrics document with {} lines", kind, lines.len());
        Self { kind, lines }
    }

    /// Build a plain document from `(start_ms, text)` pairs
    pub fn plain<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        let lines = lines
            .into_iter()
            .map(|(start_ms, text)| LyricLine::plain(start_ms, text))
            .collect();
        Self::new(DocumentKind::Plain, lines)
    }

    /// Build a word-timed document from prepared lines
    pub fn word_timed(lines: Vec<LyricLine>) -> Self {
        Self::new(DocumentKind::WordTimed, lines)
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn is_word_timed(&self) -> bool {
        self.kind == DocumentKind::WordTimed
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    pub fn get(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LyricLine> {
        self.lines.iter()
    }

    /// Clear cumulative widths on every line
    pub fn invalidate_widths(&mut self) {
        self.lines.iter_mut().for_each(LyricLine::invalidate_widths);
    }

    /// Clear reflowed sub-lines on every line
    pub fn invalidate_sub_lines(&mut self) {
        self.lines.iter_mut().for_each(LyricLine::invalidate_sub_lines);
    }

    /// Clear all layout caches on every line
    pub fn invalidate_layout(&mut self) {
        self.lines.iter_mut().for_each(LyricLine::invalidate_layout);
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a LyricLine;
    type IntoIter = std::slice::Iter<'a, LyricLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}
