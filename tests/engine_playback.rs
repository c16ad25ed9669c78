//! End-to-end playback through the public engine API

use lyric_sync::features::lyrics::engine::reflow::CLAUSE_PUNCTUATION;
use lyric_sync::features::lyrics::engine::{reflow, tokenize};
use lyric_sync::{Document, ExtraTrack, LyricLine, LyricsEngine, LyricsSettings, WordPosition};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn measure(text: &str) -> f32 {
    text.chars().count() as f32 * 10.0
}

const KARAOKE_JSON: &str = r#"{
    "kind": "word_timed",
    "lines": [
        { "startMs": 0,    "words": ["Da", "y "],       "wordDurations": [400, 500] },
        { "startMs": 1000, "words": ["Hel", "lo "],     "wordDurations": [700, 700] },
        { "startMs": 2500, "words": ["A", "gain"],      "wordDurations": [750, 750] }
    ]
}"#;

#[test]
fn test_json_document_plays_back_in_order() {
    let document: Document = serde_json::from_str(KARAOKE_JSON).unwrap();
    assert_eq!(document.lines()[1].text(), "Hello ");
    assert_eq!(document.lines()[1].end_ms(), 2400);

    let mut engine = LyricsEngine::default();
    engine.set_document(document);
    assert_eq!(engine.word_at(2000), WordPosition::Active(1));

    let mut previous = 0;
    for time in (0..5000).step_by(50) {
        let line = engine.line_at(time);
        assert!(line >= previous, "line went backwards at {time} ms");
        previous = line;
    }
    assert_eq!(previous, 2);
}

#[test]
fn test_seek_back_and_forth() {
    let document: Document = serde_json::from_str(KARAOKE_JSON).unwrap();
    let mut engine = LyricsEngine::default();
    engine.set_document(document);

    assert_eq!(engine.line_at(3500), 2);
    assert_eq!(engine.line_at(100), 0);
    // Gap between line 1 (ends 2400) and line 2 holds line 1
    assert_eq!(engine.line_at(2450), 1);
    assert_eq!(engine.word_at(2450), WordPosition::LineDone);
    assert_eq!(engine.text_at(2600), Some("Again"));
}

#[test]
fn test_translation_and_transliteration_follow_primary() {
    let mut engine = LyricsEngine::new(LyricsSettings {
        extra_track: ExtraTrack::Transliteration,
        ..Default::default()
    });
    engine.set_document(Document::word_timed(vec![
        LyricLine::word_timed(0, tokenize("你好"), vec![300, 300]),
        LyricLine::word_timed(1000, tokenize("世界"), vec![400, 400]),
    ]));

    assert!(engine.set_translation(&["hello".to_string(), "world".to_string()]));
    let romaji = Document::word_timed(vec![
        LyricLine::word_timed(0, vec!["ni".into(), "hao".into()], vec![1, 1]),
        LyricLine::word_timed(0, vec!["shi".into(), "jie".into()], vec![1, 1]),
    ]);
    assert!(engine.set_transliteration(&romaji));

    let translation = engine.translation().unwrap();
    for (primary, derived) in engine.document().iter().zip(translation) {
        assert_eq!(primary.start_ms(), derived.start_ms());
        assert_eq!(primary.end_ms(), derived.end_ms());
    }
    assert_eq!(engine.extra_text_at(1200), Some("shi jie "));
}

#[test]
fn test_random_reflow_preserves_text_and_time() {
    let mut rng = StdRng::seed_from_u64(7);
    let alphabet = ["la ", "da ", "你", "好", "世", "界", "sing ", "oh "];

    for _ in 0..200 {
        let count = rng.random_range(1..20);
        let words: Vec<String> = (0..count)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())].to_string())
            .collect();
        let durations: Vec<u64> = (0..count).map(|_| rng.random_range(0..800)).collect();
        let line = LyricLine::word_timed(rng.random_range(0..100_000), words, durations);
        let max_width = rng.random_range(10.0..120.0);

        let sub_lines = reflow(&line, max_width, &measure);
        assert!(!sub_lines.is_empty());

        let text: String = sub_lines.iter().map(|l| l.text()).collect();
        assert_eq!(text, line.text());
        let total: u64 = sub_lines.iter().map(|l| l.duration_ms()).sum();
        assert_eq!(total, line.duration_ms());
        for pair in sub_lines.windows(2) {
            assert_eq!(pair[0].end_ms(), pair[1].start_ms());
        }
    }
}

/// Text with clause punctuation and whitespace removed
fn without_breaks(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && !CLAUSE_PUNCTUATION.contains(c))
        .collect()
}

#[test]
fn test_random_plain_reflow_keeps_text() {
    let mut rng = StdRng::seed_from_u64(11);
    let alphabet = ['你', '好', 'a', 'b', ' ', '，', '。', '！', '、', '；', 'x'];

    for _ in 0..2000 {
        let len = rng.random_range(0..40);
        let text: String = (0..len)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect();
        let start = rng.random_range(0..100_000);
        let line = LyricLine::plain(start, text.as_str());
        let max_width: f32 = rng.random_range(10.0..200.0);

        let sub_lines = reflow(&line, max_width, &measure);
        assert!(!sub_lines.is_empty());
        assert!(sub_lines.iter().all(|l| l.start_ms() == start));
        assert!(sub_lines.iter().all(|l| l.words().is_none()));

        let joined: String = sub_lines.iter().map(|l| l.text()).collect();
        assert_eq!(without_breaks(&joined), without_breaks(&text), "text {text:?}");
    }
}

#[test]
fn test_tokenize_round_trip_on_mixed_scripts() {
    for text in ["你好 world", "  lead", "한국어 and ひらがな", "", "tab\there", "end "] {
        assert_eq!(tokenize(text).concat(), text);
    }
}
