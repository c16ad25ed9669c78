//! Feature modules - business logic separated from presentation
//!
//! Each feature module contains the core logic for a specific functionality.
//! Features should not depend on rendering code directly.

pub mod lyrics;
pub mod settings;

pub use settings::{ExtraTrack, LyricsSettings, SettingsError};
