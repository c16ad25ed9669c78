//! Text measurement using cosmic-text
//!
//! `TextShaper` is the production [`MeasureText`]: it shapes each string as
//! a single unbounded line with the configured font and reads back the run
//! width.
//!
//! ## Caching
//!
//! Shaping is expensive and reflow measures the same units over and over, so
//! widths are cached per text. The cache is keyed on text only and is
//! cleared whenever the font size or font config changes.

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Weight};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::reflow::MeasureText;

/// Font system shared between every shaper in the process
pub type SharedFontSystem = Arc<Mutex<FontSystem>>;

/// Entries kept before the width cache is flushed
const WIDTH_CACHE_LIMIT: usize = 1000;

/// Font configuration for text measurement
#[derive(Debug, Clone, PartialEq)]
pub struct FontConfig {
    /// Font family name (e.g., "Noto Sans CJK SC")
    /// When None, falls back to system sans-serif
    pub font_family: Option<String>,
    pub font_weight: Weight,
    /// Enable debug logging for font selection and cache flushes
    pub debug_logging: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            font_family: None,
            font_weight: Weight::NORMAL,
            debug_logging: false,
        }
    }
}

impl FontConfig {
    /// Create a new FontConfig with a specific font family
    pub fn with_family(family: impl Into<String>) -> Self {
        Self {
            font_family: Some(family.into()),
            ..Default::default()
        }
    }

    /// Set the font weight
    pub fn weight(mut self, weight: Weight) -> Self {
        self.font_weight = weight;
        self
    }

    /// Enable debug logging
    pub fn with_debug(mut self) -> Self {
        self.debug_logging = true;
        self
    }
}

/// Text measurer backed by a shared cosmic-text font system
pub struct TextShaper {
    font_system: SharedFontSystem,
    config: FontConfig,
    font_size: f32,
    /// Measured widths keyed by text
    width_cache: Mutex<HashMap<String, f32>>,
}

impl TextShaper {
    /// Create a new text shaper with default font config
    pub fn new(font_system: SharedFontSystem, font_size: f32) -> Self {
        Self::with_config(font_system, FontConfig::default(), font_size)
    }

    /// Create a new text shaper with custom font config
    pub fn with_config(font_system: SharedFontSystem, config: FontConfig, font_size: f32) -> Self {
        if config.debug_logging {
            match &config.font_family {
                Some(family) => tracing::debug!("[TextShaper] Using font family: {}", family),
                None => tracing::debug!("[TextShaper] Using fallback font: SansSerif"),
            }
        }
        Self {
            font_system,
            config,
            font_size,
            width_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn config(&self) -> &FontConfig {
        &self.config
    }

    /// Change the font size. Widths measured so far are dropped.
    pub fn set_font_size(&mut self, font_size: f32) {
        if (self.font_size - font_size).abs() > f32::EPSILON {
            self.font_size = font_size;
            self.clear_cache();
        }
    }

    /// Change the font config. Widths measured so far are dropped.
    pub fn set_config(&mut self, config: FontConfig) {
        if self.config != config {
            self.config = config;
            self.clear_cache();
        }
    }

    pub fn clear_cache(&self) {
        let mut cache = self.width_cache.lock();
        if self.config.debug_logging {
            tracing::debug!("[TextShaper] Dropping {} cached widths", cache.len());
        }
        cache.clear();
    }

    /// Get the font family for text attributes
    fn font_family(&self) -> Family<'_> {
        match &self.config.font_family {
            Some(name) => Family::Name(name),
            None => Family::SansSerif,
        }
    }

    /// Width of `text` shaped as one unbounded line
    pub fn width(&self, text: &str) -> f32 {
        if text.is_empty() {
            return 0.0;
        }

        {
            let cache = self.width_cache.lock();
            if let Some(width) = cache.get(text) {
                return *width;
            }
        }

        let width = self.width_uncached(text);

        {
            let mut cache = self.width_cache.lock();
            // Limit cache size to prevent memory bloat
            if cache.len() > WIDTH_CACHE_LIMIT {
                cache.clear();
            }
            cache.insert(text.to_string(), width);
        }

        width
    }

    fn width_uncached(&self, text: &str) -> f32 {
        let mut font_system = self.font_system.lock();

        let metrics = Metrics::new(self.font_size, self.font_size * 1.4);
        let mut buffer = Buffer::new(&mut font_system, metrics);
        buffer.set_size(&mut font_system, None, None);

        let attrs = Attrs::new()
            .family(self.font_family())
            .weight(self.config.font_weight);
        buffer.set_text(&mut font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut font_system, false);

        buffer
            .layout_runs()
            .map(|run| run.line_w)
            .fold(0.0f32, f32::max)
    }
}

impl MeasureText for TextShaper {
    fn measure(&self, text: &str) -> f32 {
        self.width(text)
    }
}
