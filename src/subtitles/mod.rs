pub mod ass;
pub mod srt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::config::SubtitleConfig;

/// One recognized word with its timestamps, as emitted by the
/// speech-recognition step (`[{"word": ..., "start": ..., "end": ...}]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordStamp {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Cue grouping rules.
#[derive(Debug, Clone)]
pub struct CueSettings {
    pub max_words: usize,
    pub max_duration_secs: f64,
    pub max_gap_secs: f64,
}

impl Default for CueSettings {
    fn default() -> Self {
        Self {
            max_words: 3,
            max_duration_secs: 5.0,
            max_gap_secs: 1.5,
        }
    }
}

impl From<&SubtitleConfig> for CueSettings {
    fn from(config: &SubtitleConfig) -> Self {
        Self {
            max_words: config.max_words_per_cue,
            max_duration_secs: config.max_cue_duration_secs,
            max_gap_secs: config.max_word_gap_secs,
        }
    }
}

/// A group of consecutive words shown together on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub words: Vec<WordStamp>,
}

impl Cue {
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.word.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Read a word-timestamp transcript JSON file. Empty words are dropped and
/// inverted timestamps are repaired.
pub async fn load_words(path: &Path) -> Result<Vec<WordStamp>> {
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("cannot read transcript {}", path.display()))?;
    let mut words: Vec<WordStamp> = serde_json::from_str(&data)
        .with_context(|| format!("cannot parse transcript {}", path.display()))?;

    words.retain(|w| !w.word.trim().is_empty());
    for word in &mut words {
        word.word = word.word.trim().to_string();
        if word.end < word.start {
            std::mem::swap(&mut word.start, &mut word.end);
        }
    }

    info!("📜 Loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

/// Group words into cues: a cue closes when it reaches the word limit, the
/// duration limit, or a silence gap longer than the configured threshold.
pub fn group_into_cues(words: &[WordStamp], settings: &CueSettings) -> Vec<Cue> {
    let mut cues = Vec::new();
    let mut current: Vec<WordStamp> = Vec::new();

    let flush = |current: &mut Vec<WordStamp>, cues: &mut Vec<Cue>| {
        if current.is_empty() {
            return;
        }
        let start = current[0].start;
        let end = current[current.len() - 1].end.max(start);
        cues.push(Cue {
            start,
            end,
            words: std::mem::take(current),
        });
    };

    for word in words {
        let fits = if let (Some(first), Some(last)) = (current.first(), current.last()) {
            current.len() < settings.max_words
                && word.end - first.start <= settings.max_duration_secs
                && word.start - last.end <= settings.max_gap_secs
        } else {
            true
        };

        if !fits {
            flush(&mut current, &mut cues);
        }
        current.push(word.clone());
    }
    flush(&mut current, &mut cues);

    debug!("Grouped {} words into {} cues", words.len(), cues.len());
    cues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start: f64, end: f64) -> WordStamp {
        WordStamp {
            word: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_word_limit_closes_cue() {
        let words: Vec<WordStamp> = (0..7)
            .map(|i| word("w", i as f64 * 0.5, i as f64 * 0.5 + 0.4))
            .collect();
        let cues = group_into_cues(&words, &CueSettings::default());
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].words.len(), 3);
        assert_eq!(cues[2].words.len(), 1);
    }

    #[test]
    fn test_duration_limit_closes_cue() {
        let words = vec![
            word("slow", 0.0, 3.0),
            word("speech", 3.2, 6.0),
            word("here", 6.1, 6.5),
        ];
        let settings = CueSettings {
            max_words: 10,
            max_duration_secs: 5.0,
            max_gap_secs: 10.0,
        };
        let cues = group_into_cues(&words, &settings);
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text(), "slow");
        assert_eq!(cues[1].text(), "speech here");
    }

    #[test]
    fn test_silence_gap_closes_cue() {
        let words = vec![
            word("before", 0.0, 0.5),
            word("after", 5.0, 5.5),
        ];
        let cues = group_into_cues(&words, &CueSettings::default());
        assert_eq!(cues.len(), 2);
    }

    #[test]
    fn test_no_empty_cues() {
        let cues = group_into_cues(&[], &CueSettings::default());
        assert!(cues.is_empty());
    }

    #[test]
    fn test_cue_bounds_cover_words() {
        let words = vec![word("a", 1.0, 1.2), word("b", 1.3, 1.8)];
        let cues = group_into_cues(&words, &CueSettings::default());
        assert_eq!(cues.len(), 1);
        assert_eq!(cues[0].start, 1.0);
        assert_eq!(cues[0].end, 1.8);
        assert_eq!(cues[0].text(), "a b");
    }
}
