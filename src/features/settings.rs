//! Lyrics display settings persistence
//!
//! Handles saving and loading the user's timing and layout preferences.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Secondary track shown under each lyric line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtraTrack {
    /// Primary lyrics only
    #[default]
    None,
    /// Translation track
    Translation,
    /// Transliteration track
    Transliteration,
}

impl std::fmt::Display for ExtraTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtraTrack::None => write!(f, "none"),
            ExtraTrack::Translation => write!(f, "translation"),
            ExtraTrack::Transliteration => write!(f, "transliteration"),
        }
    }
}

/// Lyrics timing and layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsSettings {
    /// Added to the playback clock before every lookup (negative shows lyrics later)
    #[serde(default)]
    pub play_offset_ms: i64,
    /// Main lyric font size in pixels
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    /// Extra track font size in pixels
    #[serde(default = "default_extra_font_size")]
    pub extra_font_size: f32,
    /// Space below each main row
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    /// Space below each extra track row
    #[serde(default = "default_extra_line_spacing")]
    pub extra_line_spacing: f32,
    /// Horizontal padding for scrolled lines
    #[serde(default = "default_padding")]
    pub padding: f32,
    /// Shortest gap reported as an interlude
    #[serde(default = "default_interlude_min_duration")]
    pub interlude_min_duration_ms: u64,
    #[serde(default)]
    pub extra_track: ExtraTrack,
    /// Font family; None uses the system sans-serif
    #[serde(default)]
    pub font_family: Option<String>,
}

fn default_font_size() -> f32 {
    48.0
}

fn default_extra_font_size() -> f32 {
    26.0
}

fn default_line_spacing() -> f32 {
    24.0
}

fn default_extra_line_spacing() -> f32 {
    12.0
}

fn default_padding() -> f32 {
    15.0
}

fn default_interlude_min_duration() -> u64 {
    4000
}

impl Default for LyricsSettings {
    fn default() -> Self {
        Self {
            play_offset_ms: 0,
            font_size: default_font_size(),
            extra_font_size: default_extra_font_size(),
            line_spacing: default_line_spacing(),
            extra_line_spacing: default_extra_line_spacing(),
            padding: default_padding(),
            interlude_min_duration_ms: default_interlude_min_duration(),
            extra_track: ExtraTrack::None,
            font_family: None,
        }
    }
}

impl LyricsSettings {
    /// Get the settings file path
    pub fn file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "lyric-sync", "lyric-sync")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return defaults if not found
    pub fn load() -> Self {
        Self::file_path()
            .and_then(|path| Self::load_from_file(&path).ok())
            .unwrap_or_default()
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    /// Save settings to the default file
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(path) = Self::file_path() {
            self.save_to_file(&path)
        } else {
            Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            ))
        }
    }

    /// Save settings to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| SettingsError::Io(e.to_string()))?;
        Ok(())
    }

    /// Whether a change from `other` invalidates measured text widths
    pub fn font_differs(&self, other: &LyricsSettings) -> bool {
        self.font_size != other.font_size
            || self.extra_font_size != other.extra_font_size
            || self.font_family != other.font_family
    }
}

/// Errors that can occur with settings
#[derive(Debug, Clone)]
pub enum SettingsError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {}
