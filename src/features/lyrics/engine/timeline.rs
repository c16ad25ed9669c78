//! Time-indexed line and word lookup
//!
//! `TimelineIndex` answers "which line is active at this playback time".
//! Normal playback moves forward monotonically, so the index remembers the
//! last answer and checks it (and the line after it) before falling back to a
//! binary search over line start times:
//!
//! 1. hint line still covers the time → O(1)
//! 2. time advanced into the next line → O(1), hint moves by one
//! 3. anything else (seek, new song) → O(log n)
//!
//! Word-timed lines keep their highlight through the gap between their end
//! and the next line's start.

use super::types::{Document, DocumentKind, LyricLine};

/// Position of the playback time within a line's timing units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordPosition {
    /// Playback has not reached the line yet
    NotStarted,
    /// The unit at this index is being sung
    Active(usize),
    /// Every unit has been sung
    LineDone,
}

impl WordPosition {
    /// Index of the active unit, if any
    pub fn index(&self) -> Option<usize> {
        match self {
            WordPosition::Active(index) => Some(*index),
            _ => None,
        }
    }
}

/// A gap in the lyrics long enough to show an interlude indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interlude {
    /// Time the gap opens
    pub start_ms: u64,
    /// Time the next line starts
    pub end_ms: u64,
    /// Line that follows the gap
    pub next_line: usize,
}

impl Interlude {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Start time of the line after `index`, or `u64::MAX` past the end
fn next_start(lines: &[LyricLine], index: usize) -> u64 {
    lines.get(index + 1).map_or(u64::MAX, LyricLine::start_ms)
}

/// Stateful line lookup with a last-known-line hint
///
/// Not shareable between threads; use one instance per playback view or wrap
/// the owning engine in a lock.
#[derive(Debug, Clone, Default)]
pub struct TimelineIndex {
    last_line: usize,
}

impl TimelineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the hint (document replaced or playback jumped)
    pub fn reset(&mut self) {
        self.last_line = 0;
    }

    /// Line returned by the previous query
    pub fn last_line(&self) -> usize {
        self.last_line
    }

    /// Index of the line active at `time_ms`
    ///
    /// Times before the first line map to 0 and times past the end map to the
    /// last line. Empty documents return 0.
    pub fn line_at(&mut self, document: &Document, time_ms: u64) -> usize {
        let lines = document.lines();
        if lines.is_empty() {
            return 0;
        }
        if self.last_line >= lines.len() {
            self.last_line = 0;
        }

        if let Some(index) = self.check_hint(document.kind(), lines, time_ms) {
            return index;
        }

        let index = match document.kind() {
            DocumentKind::Plain => Self::search_plain(lines, time_ms),
            DocumentKind::WordTimed => Self::search_word_timed(lines, time_ms),
        };
        tracing::trace!("Line lookup fell back to search: {} ms -> line {}", time_ms, index);
        self.last_line = index;
        index
    }

    /// Fast path: the hint line or the one right after it
    fn check_hint(
        &mut self,
        kind: DocumentKind,
        lines: &[LyricLine],
        time_ms: u64,
    ) -> Option<usize> {
        let hint = self.last_line;
        let line = &lines[hint];
        let next = next_start(lines, hint);

        if time_ms < next && (time_ms >= line.start_ms() || hint == 0) {
            if kind == DocumentKind::WordTimed && time_ms > line.end_ms() {
                tracing::trace!("Holding line {} through gap at {} ms", hint, time_ms);
            }
            return Some(hint);
        }

        if hint + 1 < lines.len() && time_ms >= next && time_ms < next_start(lines, hint + 1) {
            self.last_line = hint + 1;
            return Some(hint + 1);
        }

        None
    }

    /// Greatest line whose start is not after `time_ms`
    fn search_plain(lines: &[LyricLine], time_ms: u64) -> usize {
        if time_ms < lines[0].start_ms() {
            return 0;
        }
        lines
            .partition_point(|line| line.start_ms() <= time_ms)
            .saturating_sub(1)
    }

    /// Binary search that stops early on a line whose `[start, end]` holds the time
    fn search_word_timed(lines: &[LyricLine], time_ms: u64) -> usize {
        let last = lines.len() - 1;
        if time_ms >= lines[last].end_ms() && time_ms >= lines[last].start_ms() {
            return last;
        }

        let mut low = 0;
        let mut high = lines.len();
        let mut result = 0;
        while low < high {
            let mid = low + (high - low) / 2;
            let line = &lines[mid];
            if line.start_ms() <= time_ms {
                result = mid;
                // Exact hit, unless a later line has already started
                if time_ms <= line.end_ms() && time_ms < next_start(lines, mid) {
                    return mid;
                }
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        result
    }
}

/// Which unit of `line` is being sung at `time_ms`
///
/// Returns the first unit whose cumulative end is at or after the time.
/// Line-timed lines have no units and report `LineDone` once started.
pub fn word_at(line: &LyricLine, time_ms: u64) -> WordPosition {
    if time_ms < line.start_ms() {
        return WordPosition::NotStarted;
    }

    let mut elapsed = line.start_ms();
    for (index, duration) in line.word_durations().iter().enumerate() {
        elapsed += duration;
        if time_ms <= elapsed {
            return WordPosition::Active(index);
        }
    }

    WordPosition::LineDone
}

/// Milliseconds already spent inside the active unit
pub fn word_elapsed_ms(line: &LyricLine, time_ms: u64) -> u64 {
    if time_ms < line.start_ms() {
        return 0;
    }

    let mut elapsed = line.start_ms();
    for duration in line.word_durations() {
        elapsed += duration;
        if time_ms <= elapsed {
            return duration - (elapsed - time_ms);
        }
    }

    0
}

/// Index of the active sub-line of a reflowed line
///
/// Lines that were never reflowed have a single sub-line (themselves).
pub fn sub_line_at(line: &LyricLine, time_ms: u64) -> usize {
    let Some(sub_lines) = line.sub_lines() else {
        return 0;
    };

    for (index, sub) in sub_lines.iter().enumerate() {
        if time_ms < sub.start_ms() {
            return index.saturating_sub(1);
        }
        if time_ms <= sub.end_ms() {
            return index;
        }
        if let Some(next) = sub_lines.get(index + 1) {
            if time_ms < next.start_ms() {
                return index;
            }
        }
    }

    sub_lines.len() - 1
}

/// Active unit within the active sub-line (unit index local to that sub-line)
pub fn sub_word_at(line: &LyricLine, time_ms: u64) -> WordPosition {
    match line.sub_lines() {
        Some(sub_lines) => word_at(&sub_lines[sub_line_at(line, time_ms)], time_ms),
        None => word_at(line, time_ms),
    }
}

/// Position of a sub-line in the flattened list of displayed rows
pub fn flat_line_index(document: &Document, line_index: usize, sub_line: usize) -> usize {
    let before: usize = document
        .iter()
        .take(line_index)
        .map(|line| line.sub_lines().map_or(1, <[LyricLine]>::len))
        .sum();
    before + sub_line
}

/// Detect an interlude around the active line
///
/// Reports the gap before the first line, or the gap between a word-timed
/// line's end and the next line's start, when it lasts at least
/// `min_duration_ms` and `time_ms` falls inside it.
pub fn interlude_at(
    document: &Document,
    line_index: usize,
    time_ms: u64,
    min_duration_ms: u64,
) -> Option<Interlude> {
    let first = document.get(0)?;
    if time_ms < first.start_ms() {
        return (first.start_ms() >= min_duration_ms).then_some(Interlude {
            start_ms: 0,
            end_ms: first.start_ms(),
            next_line: 0,
        });
    }

    if !document.is_word_timed() {
        return None;
    }

    let current = document.get(line_index)?;
    let next = document.get(line_index + 1)?;
    if current.end_ms() < time_ms && time_ms < next.start_ms() {
        let gap = next.start_ms() - current.end_ms();
        if gap >= min_duration_ms {
            return Some(Interlude {
                start_ms: current.end_ms(),
                end_ms: next.start_ms(),
                next_line: line_index + 1,
            });
        }
    }

    None
}
