//! lyric-sync - lyric timing and layout engine
//!
//! Synchronizes timed lyric documents with a playback clock and reflows their
//! lines for fixed-width display. Parsing concrete lyric formats and painting
//! glyphs are left to the host application.

pub mod features;

pub use features::lyrics::engine::{
    Document, DocumentKind, LyricLine, LyricsEngine, MeasureText, PlaybackPosition,
    SharedLyricsEngine, WordPosition,
};
pub use features::{ExtraTrack, LyricsSettings, SettingsError};

/// Crate version, as reported by the command line tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
