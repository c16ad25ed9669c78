//! Layout calculations for scrolling lyrics
//!
//! Row heights come from font sizes, vertical offsets from the number of
//! reflowed rows each line occupies (plus the rows of the extra track when one
//! is shown). The horizontal scroll keeps the highlight of an over-wide line
//! on screen.

use crate::features::settings::LyricsSettings;

use super::types::{Document, LyricLine};

/// Row sizes derived from font configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Main lyric font size in pixels
    pub font_size: f32,
    /// Translation/transliteration font size in pixels
    pub extra_font_size: f32,
    /// Main line height in pixels
    pub line_height: f32,
    /// Extra track line height in pixels
    pub extra_line_height: f32,
    /// Space below each main row
    pub line_spacing: f32,
    /// Space below each extra track row
    pub extra_line_spacing: f32,
    /// Horizontal padding used when scrolling wide lines
    pub padding: f32,
}

impl LayoutMetrics {
    /// Metrics for the given font sizes with spacing of half a line
    pub fn new(font_size: f32, extra_font_size: f32) -> Self {
        Self {
            font_size,
            extra_font_size,
            // Line heights (1.4x main, 1.3x extra)
            line_height: font_size * 1.4,
            extra_line_height: extra_font_size * 1.3,
            line_spacing: font_size * 0.5,
            extra_line_spacing: extra_font_size * 0.5,
            padding: 0.0,
        }
    }

    pub fn from_settings(settings: &LyricsSettings) -> Self {
        Self {
            line_spacing: settings.line_spacing,
            extra_line_spacing: settings.extra_line_spacing,
            padding: settings.padding,
            ..Self::new(settings.font_size, settings.extra_font_size)
        }
    }

    /// Height of one main row including its spacing
    pub fn row_height(&self) -> f32 {
        self.line_height + self.line_spacing
    }

    /// Height of one extra track row including its spacing
    pub fn extra_row_height(&self) -> f32 {
        self.extra_line_height + self.extra_line_spacing
    }
}

/// Number of display rows of each line (1 for lines that were never reflowed)
pub fn row_counts(document: &Document) -> Vec<usize> {
    document
        .iter()
        .map(|line| line.sub_lines().map_or(1, <[LyricLine]>::len))
        .collect()
}

/// Vertical offset of every document line
///
/// Stored as prefix sums: `offsets[i]` is the top of line `i` and the final
/// entry is the total height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineOffsets {
    offsets: Vec<f32>,
}

impl LineOffsets {
    /// Build the table from per-line row counts
    ///
    /// Extra rows beyond the end of `extra_rows` count as zero.
    pub fn build(metrics: &LayoutMetrics, rows: &[usize], extra_rows: Option<&[usize]>) -> Self {
        let mut offsets = Vec::with_capacity(rows.len() + 1);
        let mut y = 0.0f32;
        offsets.push(y);
        for (index, &count) in rows.iter().enumerate() {
            y += metrics.row_height() * count as f32;
            if let Some(extra) = extra_rows.and_then(|extra| extra.get(index)) {
                y += metrics.extra_row_height() * *extra as f32;
            }
            offsets.push(y);
        }

        tracing::debug!("Built line offsets for {} lines, height {:.1}", rows.len(), y);
        Self { offsets }
    }

    /// Build the table from the current sub-lines of a document and its extra track
    pub fn for_document(
        metrics: &LayoutMetrics,
        document: &Document,
        extra: Option<&Document>,
    ) -> Self {
        let extra_rows = extra.map(row_counts);
        Self::build(metrics, &row_counts(document), extra_rows.as_deref())
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top of a line; indices past the end give the total height
    pub fn offset_of(&self, line_index: usize) -> f32 {
        let index = line_index.min(self.len());
        self.offsets.get(index).copied().unwrap_or(0.0)
    }

    /// Line under a scroll offset: the first line whose bottom is below `y`,
    /// or the last line when `y` is past the end
    pub fn line_at_offset(&self, y: f32) -> usize {
        if self.is_empty() {
            return 0;
        }
        let index = self.offsets[1..].partition_point(|&bottom| bottom <= y);
        index.min(self.len() - 1)
    }

    pub fn total_height(&self) -> f32 {
        self.offsets.last().copied().unwrap_or(0.0)
    }
}

/// X position of a single-row line while its highlight advances
///
/// Lines that fit are centred. Wider lines start at the padding, then follow
/// the highlight so it stays at the centre of the view, and finally stop with
/// their end aligned to the right padding.
pub fn highlight_scroll_x(
    text_width: f32,
    highlight_width: f32,
    view_width: f32,
    padding: f32,
) -> f32 {
    if text_width <= view_width {
        return (view_width - text_width) / 2.0;
    }

    let half = view_width / 2.0;
    if highlight_width < half {
        padding
    } else if text_width - highlight_width >= half {
        half - highlight_width
    } else {
        view_width - text_width - padding
    }
}
