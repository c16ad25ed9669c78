//! Lyrics module - timing and layout
//!
//! - `engine`: line/word lookup, reflow and derived tracks

pub mod engine;

// Re-export commonly used items
pub use engine::{
    Document, DocumentKind, LyricLine, LyricsEngine, SharedLyricsEngine, WordPosition,
};
