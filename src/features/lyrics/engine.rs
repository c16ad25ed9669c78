//! Lyric timing and layout engine
//!
//! Answers "which line and word are active now" for a playback clock, and
//! prepares lines for fixed-width display.
//!
//! ## Key Components
//!
//! - `LyricsEngine`: owns the document, its derived tracks and the lookup hint
//! - `TimelineIndex`: amortized O(1) line lookup with binary-search fallback
//! - `reflow`: width-bounded sub-lines that keep their timing
//! - `derived`: translation / transliteration tracks timed from the primary
//! - `TextShaper`: cosmic-text based `MeasureText`
//!
//! ## Caches
//!
//! Widths, sub-lines and line offsets are memoized and only cleared through
//! the explicit entry points below:
//!
//! - `set_document`: new song, everything goes
//! - `font_changed`: measurement output changed
//! - `set_max_width`: layout width changed

// Core modules
pub mod derived;
pub mod layout;
pub mod reflow;
pub mod text_shaper;
pub mod timeline;
pub mod tokenizer;
pub mod types;

// Re-exports for convenience
pub use derived::{build_latin_aware_derived, build_word_timed_derived};
pub use layout::{LayoutMetrics, LineOffsets, highlight_scroll_x};
pub use reflow::{MeasureText, highlight_width, reflow};
pub use text_shaper::{FontConfig, SharedFontSystem, TextShaper};
pub use timeline::{Interlude, TimelineIndex, WordPosition};
pub use tokenizer::tokenize;
pub use types::{Document, DocumentKind, LyricLine};

use parking_lot::Mutex;
use std::sync::Arc;

use crate::features::settings::{ExtraTrack, LyricsSettings};

/// Engine behind a lock, for callers that query from more than one thread
pub type SharedLyricsEngine = Arc<Mutex<LyricsEngine>>;

/// Everything the UI needs to draw the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Active document line
    pub line: usize,
    /// Active sub-line within that line
    pub sub_line: usize,
    /// Index of the active sub-line among all displayed rows
    pub row: usize,
    /// Active unit, local to the sub-line
    pub word: WordPosition,
    /// Time spent inside the active unit
    pub word_elapsed_ms: u64,
}

/// Main lyrics engine - timing lookups, derived tracks and layout caches
#[derive(Debug)]
pub struct LyricsEngine {
    settings: LyricsSettings,
    document: Document,
    translation: Option<Document>,
    transliteration: Option<Document>,
    timeline: TimelineIndex,
    /// Width available to a row; lines wider than this are reflowed
    max_width: f32,
    /// Vertical offsets, None until the next `reflow_all`
    offsets: Option<LineOffsets>,
}

impl LyricsEngine {
    pub fn new(settings: LyricsSettings) -> Self {
        Self {
            settings,
            document: Document::default(),
            translation: None,
            transliteration: None,
            timeline: TimelineIndex::new(),
            max_width: f32::INFINITY,
            offsets: None,
        }
    }

    /// Wrap the engine for shared use
    pub fn into_shared(self) -> SharedLyricsEngine {
        Arc::new(Mutex::new(self))
    }

    pub fn settings(&self) -> &LyricsSettings {
        &self.settings
    }

    /// Replace settings, clearing whatever caches the change affects
    pub fn set_settings(&mut self, settings: LyricsSettings) {
        let font_changed = self.settings.font_differs(&settings);
        let layout_changed = font_changed
            || self.settings.extra_track != settings.extra_track
            || self.settings.line_spacing != settings.line_spacing
            || self.settings.extra_line_spacing != settings.extra_line_spacing;
        self.settings = settings;

        if font_changed {
            self.font_changed();
        } else if layout_changed {
            self.offsets = None;
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Load a new song. Derived tracks and every cache are dropped.
    pub fn set_document(&mut self, document: Document) {
        tracing::debug!(
            "Lyrics document replaced: {} lines ({:?})",
            document.len(),
            document.kind()
        );
        self.document = document;
        self.translation = None;
        self.transliteration = None;
        self.timeline.reset();
        self.offsets = None;
    }

    pub fn translation(&self) -> Option<&Document> {
        self.translation.as_ref()
    }

    pub fn transliteration(&self) -> Option<&Document> {
        self.transliteration.as_ref()
    }

    /// Attach a translation, one text per primary line
    ///
    /// Word-timed primaries get word-timed translations. Returns false (and
    /// shows the primary track alone) when the text does not line up.
    pub fn set_translation(&mut self, lines: &[String]) -> bool {
        self.translation =
            build_word_timed_derived(&self.document, lines, self.document.is_word_timed());
        if self.translation.is_none() {
            tracing::warn!("Translation rejected, showing primary lyrics only");
        }
        self.offsets = None;
        self.translation.is_some()
    }

    /// Attach a pre-tokenized transliteration
    ///
    /// Returns false when it cannot be aligned with the primary document.
    pub fn set_transliteration(&mut self, secondary: &Document) -> bool {
        self.transliteration = build_latin_aware_derived(&self.document, secondary);
        if self.transliteration.is_none() {
            tracing::warn!("Transliteration rejected, showing primary lyrics only");
        }
        self.offsets = None;
        self.transliteration.is_some()
    }

    /// Derived track selected by the `extra_track` setting, if it exists
    pub fn extra_document(&self) -> Option<&Document> {
        match self.settings.extra_track {
            ExtraTrack::None => None,
            ExtraTrack::Translation => self.translation.as_ref(),
            ExtraTrack::Transliteration => self.transliteration.as_ref(),
        }
    }

    /// Font face or size changed: drop measured widths and sub-lines
    pub fn font_changed(&mut self) {
        tracing::debug!("Font changed, clearing width and sub-line caches");
        self.for_each_document(Document::invalidate_layout);
        self.offsets = None;
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    /// Layout width changed: drop sub-lines, keep measured widths
    pub fn set_max_width(&mut self, max_width: f32) {
        if self.max_width == max_width {
            return;
        }
        tracing::debug!("Layout width {} -> {}", self.max_width, max_width);
        self.max_width = max_width;
        self.for_each_document(Document::invalidate_sub_lines);
        self.offsets = None;
    }

    fn for_each_document(&mut self, f: impl Fn(&mut Document)) {
        f(&mut self.document);
        if let Some(translation) = self.translation.as_mut() {
            f(translation);
        }
        if let Some(transliteration) = self.transliteration.as_mut() {
            f(transliteration);
        }
    }

    /// Reflow the document and the shown extra track, then rebuild offsets
    ///
    /// The extra track is measured with `extra_measure` since it uses its own
    /// font size.
    pub fn reflow_all(
        &mut self,
        measure: &dyn MeasureText,
        extra_measure: &dyn MeasureText,
    ) -> &LineOffsets {
        for line in &self.document {
            line.reflowed(self.max_width, measure);
        }
        if let Some(extra) = self.extra_document() {
            for line in extra {
                line.reflowed(self.max_width, extra_measure);
            }
        }

        let metrics = LayoutMetrics::from_settings(&self.settings);
        let offsets = LineOffsets::for_document(&metrics, &self.document, self.extra_document());
        self.offsets.insert(offsets)
    }

    /// Offsets from the last `reflow_all`, None if a cache was cleared since
    pub fn line_offsets(&self) -> Option<&LineOffsets> {
        self.offsets.as_ref()
    }

    /// Line under a scroll offset (the last line while offsets are stale)
    pub fn line_at_offset(&self, y: f32) -> usize {
        match &self.offsets {
            Some(offsets) => offsets.line_at_offset(y),
            None => self.document.len().saturating_sub(1),
        }
    }

    /// Playback clock with the configured offset applied
    pub fn lyrics_time(&self, playback_ms: u64) -> u64 {
        playback_ms.saturating_add_signed(self.settings.play_offset_ms)
    }

    /// Active line at a raw playback time
    pub fn line_at(&mut self, playback_ms: u64) -> usize {
        let time = self.lyrics_time(playback_ms);
        self.timeline.line_at(&self.document, time)
    }

    /// Active unit of the active line (indices into the whole line)
    pub fn word_at(&mut self, playback_ms: u64) -> WordPosition {
        let time = self.lyrics_time(playback_ms);
        let line = self.timeline.line_at(&self.document, time);
        self.document
            .get(line)
            .map_or(WordPosition::NotStarted, |l| timeline::word_at(l, time))
    }

    /// Full position at a raw playback time, None for an empty document
    pub fn position(&mut self, playback_ms: u64) -> Option<PlaybackPosition> {
        let time = self.lyrics_time(playback_ms);
        let line_index = self.timeline.line_at(&self.document, time);
        let line = self.document.get(line_index)?;
        let sub_line = timeline::sub_line_at(line, time);
        let row = active_row(line, time);

        Some(PlaybackPosition {
            line: line_index,
            sub_line,
            row: timeline::flat_line_index(&self.document, line_index, sub_line),
            word: timeline::word_at(row, time),
            word_elapsed_ms: timeline::word_elapsed_ms(row, time),
        })
    }

    /// Text of the active line
    pub fn text_at(&mut self, playback_ms: u64) -> Option<&str> {
        let line = self.line_at(playback_ms);
        self.document.get(line).map(LyricLine::text)
    }

    /// Text of the active sub-line
    pub fn sub_text_at(&mut self, playback_ms: u64) -> Option<&str> {
        let time = self.lyrics_time(playback_ms);
        let line = self.timeline.line_at(&self.document, time);
        self.document
            .get(line)
            .map(|line| active_row(line, time).text())
    }

    /// Text of the shown extra track for the active line
    pub fn extra_text_at(&mut self, playback_ms: u64) -> Option<&str> {
        let line = self.line_at(playback_ms);
        self.extra_document()?.get(line).map(LyricLine::text)
    }

    /// Highlighted width of the active sub-line
    pub fn highlight_width(&mut self, playback_ms: u64, measure: &dyn MeasureText) -> f32 {
        let time = self.lyrics_time(playback_ms);
        let line = self.timeline.line_at(&self.document, time);
        let Some(line) = self.document.get(line) else {
            return 0.0;
        };

        let row = active_row(line, time);
        highlight_width(
            row,
            timeline::word_at(row, time),
            timeline::word_elapsed_ms(row, time),
            measure,
        )
    }

    /// Interlude around the active line, if the gap is long enough
    pub fn interlude_at(&mut self, playback_ms: u64) -> Option<Interlude> {
        let time = self.lyrics_time(playback_ms);
        let line = self.timeline.line_at(&self.document, time);
        timeline::interlude_at(
            &self.document,
            line,
            time,
            self.settings.interlude_min_duration_ms,
        )
    }
}

impl Default for LyricsEngine {
    fn default() -> Self {
        Self::new(LyricsSettings::default())
    }
}

/// Sub-line of `line` active at `time_ms` (the line itself if never reflowed)
fn active_row(line: &LyricLine, time_ms: u64) -> &LyricLine {
    match line.sub_lines() {
        Some(sub_lines) => &sub_lines[timeline::sub_line_at(line, time_ms)],
        None => line,
    }
}
