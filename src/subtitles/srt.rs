use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use super::Cue;

/// One SubRip cue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SrtEntry {
    pub index: u32,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl SrtEntry {
    pub fn new(index: u32, start: Duration, end: Duration, text: String) -> Self {
        Self {
            index,
            start,
            end,
            text: text.trim().to_string(),
        }
    }
}

impl fmt::Display for SrtEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n{} --> {}\n{}\n",
            self.index,
            format_timestamp(self.start),
            format_timestamp(self.end),
            self.text
        )
    }
}

/// An SRT document: build from cues, parse from text, write to disk.
#[derive(Debug, Clone, Default)]
pub struct SrtFile {
    entries: Vec<SrtEntry>,
}

impl SrtFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from grouped word cues, sorted and 1-indexed.
    pub fn from_cues(cues: &[Cue]) -> Self {
        let mut file = Self::new();
        for cue in cues {
            file.entries.push(SrtEntry::new(
                0,
                Duration::from_secs_f64(cue.start.max(0.0)),
                Duration::from_secs_f64(cue.end.max(0.0)),
                cue.text(),
            ));
        }
        file.sort_entries();
        file
    }

    pub fn push(&mut self, entry: SrtEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SrtEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort by start time and renumber from 1.
    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.start.cmp(&b.start));
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.index = (i + 1) as u32;
        }
    }

    pub fn generate(&self) -> String {
        let mut content = String::new();
        for entry in &self.entries {
            content.push_str(&entry.to_string());
            content.push('\n');
        }
        content
    }

    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        tokio::fs::write(path.as_ref(), self.generate()).await?;
        Ok(())
    }

    /// Parse SRT text. Tolerates blank-line variations and CRLF endings.
    pub fn parse(content: &str) -> Result<Self> {
        let mut file = Self::new();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            // Index line; tolerate files that omit it
            let (index, timing_line) = match line.parse::<u32>() {
                Ok(index) => {
                    let timing = lines
                        .next()
                        .ok_or_else(|| anyhow!("cue {} missing timing line", index))?;
                    (index, timing)
                }
                Err(_) => (0, line),
            };

            let (start, end) = parse_timing_line(timing_line.trim())?;

            let mut text_lines = Vec::new();
            for text_line in lines.by_ref() {
                let text_line = text_line.trim_end();
                if text_line.trim().is_empty() {
                    break;
                }
                text_lines.push(text_line.to_string());
            }

            file.push(SrtEntry::new(index, start, end, text_lines.join("\n")));
        }

        file.sort_entries();
        Ok(file)
    }

    /// Check for the classic authoring mistakes.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (i, entry) in self.entries.iter().enumerate() {
            if entry.end <= entry.start {
                issues.push(format!("Entry {}: end time is not after start time", i + 1));
            }
            if entry.text.trim().is_empty() {
                issues.push(format!("Entry {}: empty text", i + 1));
            }
        }

        for pair in self.entries.windows(2) {
            if pair[0].end > pair[1].start {
                issues.push(format!(
                    "Entries {} and {}: overlapping timestamps",
                    pair[0].index, pair[1].index
                ));
            }
        }

        issues
    }
}

/// Format a duration as an SRT timestamp (HH:MM:SS,mmm).
pub fn format_timestamp(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let milliseconds = duration.subsec_millis();

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, milliseconds)
}

/// Parse a single SRT timestamp (HH:MM:SS,mmm).
pub fn parse_timestamp(timestamp: &str) -> Result<Duration> {
    let (hms, millis) = timestamp
        .trim()
        .split_once(',')
        .ok_or_else(|| anyhow!("invalid timestamp: {}", timestamp))?;

    let parts: Vec<&str> = hms.split(':').collect();
    if parts.len() != 3 {
        return Err(anyhow!("invalid time format: {}", timestamp));
    }

    let hours: u64 = parts[0].parse()?;
    let minutes: u64 = parts[1].parse()?;
    let seconds: u64 = parts[2].parse()?;
    let milliseconds: u64 = millis.trim().parse()?;

    Ok(Duration::from_millis(
        ((hours * 3600 + minutes * 60 + seconds) * 1000) + milliseconds,
    ))
}

fn parse_timing_line(line: &str) -> Result<(Duration, Duration)> {
    let (start, end) = line
        .split_once("-->")
        .ok_or_else(|| anyhow!("invalid timing line: {}", line))?;
    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::WordStamp;

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(Duration::from_secs(3661)), "01:01:01,000");
        assert_eq!(format_timestamp(Duration::from_millis(1500)), "00:00:01,500");
        assert_eq!(format_timestamp(Duration::ZERO), "00:00:00,000");
    }

    #[test]
    fn test_timestamp_parse_round_trip() {
        for text in ["00:00:01,500", "01:01:01,000", "10:59:59,999"] {
            let parsed = parse_timestamp(text).unwrap();
            assert_eq!(format_timestamp(parsed), text);
        }
        assert!(parse_timestamp("1:2:3").is_err());
    }

    #[test]
    fn test_entry_display() {
        let entry = SrtEntry::new(
            1,
            Duration::from_secs(10),
            Duration::from_secs(15),
            "Test subtitle".to_string(),
        );
        let output = entry.to_string();
        assert!(output.contains("00:00:10,000 --> 00:00:15,000"));
        assert!(output.contains("Test subtitle"));
    }

    #[test]
    fn test_from_cues_sorts_and_indexes() {
        let cues = vec![
            Cue {
                start: 5.0,
                end: 6.0,
                words: vec![WordStamp {
                    word: "second".to_string(),
                    start: 5.0,
                    end: 6.0,
                }],
            },
            Cue {
                start: 0.0,
                end: 1.0,
                words: vec![WordStamp {
                    word: "first".to_string(),
                    start: 0.0,
                    end: 1.0,
                }],
            },
        ];
        let file = SrtFile::from_cues(&cues);
        assert_eq!(file.entries()[0].index, 1);
        assert_eq!(file.entries()[0].text, "first");
        assert_eq!(file.entries()[1].index, 2);
        assert_eq!(file.entries()[1].text, "second");
    }

    #[test]
    fn test_parse_generated_output() {
        let mut file = SrtFile::new();
        file.push(SrtEntry::new(
            1,
            Duration::from_secs(0),
            Duration::from_secs(2),
            "Hello there".to_string(),
        ));
        file.push(SrtEntry::new(
            2,
            Duration::from_millis(2500),
            Duration::from_millis(4750),
            "Two lines\nof text".to_string(),
        ));
        file.sort_entries();

        let parsed = SrtFile::parse(&file.generate()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.entries()[1].text, "Two lines\nof text");
        assert_eq!(parsed.entries()[1].start, Duration::from_millis(2500));
    }

    #[test]
    fn test_validate_flags_issues() {
        let mut file = SrtFile::new();
        file.push(SrtEntry::new(
            1,
            Duration::from_secs(10),
            Duration::from_secs(5),
            "Backwards".to_string(),
        ));
        file.push(SrtEntry::new(
            2,
            Duration::from_secs(15),
            Duration::from_secs(20),
            "".to_string(),
        ));

        let issues = file.validate();
        assert!(issues.iter().any(|i| i.contains("not after start")));
        assert!(issues.iter().any(|i| i.contains("empty text")));
    }
}
