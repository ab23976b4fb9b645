use anyhow::Result;
use std::fmt::Write as _;
use std::path::Path;

use super::Cue;

/// Style block for generated ASS files. Defaults match the animated-caption
/// look used for the channel's shorts.
#[derive(Debug, Clone)]
pub struct AssStyle {
    pub font_name: String,
    pub font_size: u32,
    /// Highlight colour for the word currently being spoken (&HBBGGRR)
    pub primary_colour: String,
    /// Colour the first word of each line starts in
    pub lead_colour: String,
    pub margin_vertical: u32,
}

impl Default for AssStyle {
    fn default() -> Self {
        Self {
            font_name: "Arial".to_string(),
            font_size: 18,
            primary_colour: "&H00FFFF".to_string(),
            lead_colour: "&HFFFFFF".to_string(),
            margin_vertical: 40,
        }
    }
}

/// Render cues as an ASS document with per-word karaoke timing.
pub fn generate(cues: &[Cue], style: &AssStyle) -> String {
    let mut out = String::new();

    out.push_str("[Script Info]\n");
    out.push_str("Title: Animated Subs\n");
    out.push_str("ScriptType: v4.00+\n");
    out.push_str("Timer: 100.0000\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, BackColour, Bold, Italic, \
         Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, \
         Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    let _ = writeln!(
        out,
        "Style: Default,{},{},{},&H40000000,-1,0,0,0,100,100,0,0,1,1,0,2,20,20,{},1",
        style.font_name, style.font_size, style.primary_colour, style.margin_vertical
    );
    out.push('\n');

    out.push_str("[Events]\n");
    out.push_str(
        "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n",
    );

    for cue in cues {
        let mut text = String::new();
        for (i, word) in cue.words.iter().enumerate() {
            // Karaoke duration is in centiseconds
            let k_duration = ((word.end - word.start).max(0.0) * 100.0).round() as u64;
            let colour = if i == 0 {
                &style.lead_colour
            } else {
                &style.primary_colour
            };
            let _ = write!(text, "{{\\k{}}}{{\\c{}&}}{} ", k_duration, colour, word.word);
        }
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},Default,,0,0,0,,{}",
            format_ass_time(cue.start),
            format_ass_time(cue.end),
            text.trim_end()
        );
    }

    out
}

pub async fn save(cues: &[Cue], style: &AssStyle, path: &Path) -> Result<()> {
    tokio::fs::write(path, generate(cues, style)).await?;
    Ok(())
}

/// ASS timestamp format: H:MM:SS.cc (centiseconds).
pub fn format_ass_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total_cs = (seconds * 100.0).round() as u64;
    let h = total_cs / 360_000;
    let m = (total_cs / 6_000) % 60;
    let s = (total_cs / 100) % 60;
    let cs = total_cs % 100;
    format!("{}:{:02}:{:02}.{:02}", h, m, s, cs)
}
