//! lyric-sync - print what a lyrics view would show at given playback times
//!
//! Without times, the start of every line is used.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cosmic_text::FontSystem;
use parking_lot::Mutex;

use lyric_sync::features::lyrics::engine::{FontConfig, TextShaper, highlight_scroll_x};
use lyric_sync::{Document, ExtraTrack, LyricsEngine, LyricsSettings, MeasureText, WordPosition};

/// Print the active line, row and highlight of a lyrics document over time
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Lyrics document (JSON)
    document: PathBuf,

    /// Width available to a row, in pixels
    #[arg(long, default_value_t = 800.0)]
    width: f32,

    /// Translation text, one line per document line
    #[arg(long)]
    translation: Option<PathBuf>,

    /// Transliteration document (JSON, word-timed)
    #[arg(long)]
    transliteration: Option<PathBuf>,

    /// Playback times in milliseconds
    times: Vec<u64>,
}

fn read_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let mut settings = LyricsSettings::load();
    let document = read_document(&args.document)?;

    // Show whichever extra track was passed when settings pick none
    if settings.extra_track == ExtraTrack::None {
        if args.transliteration.is_some() {
            settings.extra_track = ExtraTrack::Transliteration;
        } else if args.translation.is_some() {
            settings.extra_track = ExtraTrack::Translation;
        }
    }

    let font_system = Arc::new(Mutex::new(FontSystem::new()));
    let font_config = match &settings.font_family {
        Some(family) => FontConfig::with_family(family.clone()),
        None => FontConfig::default(),
    };
    let shaper = TextShaper::with_config(
        Arc::clone(&font_system),
        font_config.clone(),
        settings.font_size,
    );
    let extra_shaper = TextShaper::with_config(font_system, font_config, settings.extra_font_size);

    let times = if args.times.is_empty() {
        document.iter().map(|line| line.start_ms()).collect()
    } else {
        args.times
    };

    let padding = settings.padding;
    let mut engine = LyricsEngine::new(settings);
    engine.set_document(document);
    if let Some(path) = &args.translation {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        engine.set_translation(&lines);
    }
    if let Some(path) = &args.transliteration {
        let transliteration = read_document(path)?;
        engine.set_transliteration(&transliteration);
    }
    engine.set_max_width(args.width);
    let offsets = engine.reflow_all(&shaper, &extra_shaper);
    println!(
        "{} lines, {:.0}px tall at width {}",
        offsets.len(),
        offsets.total_height(),
        args.width
    );

    for time in times {
        let Some(position) = engine.position(time) else {
            println!("{time:>8} ms  (no lyrics)");
            continue;
        };
        let word = match position.word {
            WordPosition::NotStarted => "-".to_string(),
            WordPosition::Active(index) => index.to_string(),
            WordPosition::LineDone => "done".to_string(),
        };
        let text = engine.sub_text_at(time).unwrap_or_default().to_string();
        let highlight = engine.highlight_width(time, &shaper);
        let x = highlight_scroll_x(shaper.measure(&text), highlight, args.width, padding);

        println!(
            "{time:>8} ms  line {:>3}.{} row {:>3} word {:>4} x {:>7.1}  {}",
            position.line, position.sub_line, position.row, word, x, text
        );
        if let Some(extra) = engine.extra_text_at(time) {
            println!("{:>14}{extra}", "");
        }
        if let Some(interlude) = engine.interlude_at(time) {
            println!(
                "{:>14}interlude {} ms until line {}",
                "",
                interlude.end_ms.saturating_sub(engine.lyrics_time(time)),
                interlude.next_line
            );
        }
    }

    Ok(())
}
