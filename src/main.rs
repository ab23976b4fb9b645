use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};

use audio_enhancer_rust::audio::io;
use audio_enhancer_rust::batch::BatchProcessor;
use audio_enhancer_rust::config::Config;
use audio_enhancer_rust::extract::AudioExtractor;
use audio_enhancer_rust::presets::PresetLibrary;
use audio_enhancer_rust::subtitles::ass::{self, AssStyle};
use audio_enhancer_rust::subtitles::srt::SrtFile;
use audio_enhancer_rust::subtitles::{group_into_cues, load_words, CueSettings};

#[derive(Parser)]
#[command(
    name = "audio-enhancer",
    version,
    about = "Batch voice enhancement and subtitle tooling for video production"
)]
struct Cli {
    /// Path to a configuration file (defaults to the usual search paths)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the enhancement chain over audio/video files or directories
    Enhance {
        /// Input files or directories
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory for enhanced files
        #[arg(short, long, default_value = "./enhanced")]
        output_dir: PathBuf,

        /// Preset name (see `presets`)
        #[arg(short, long)]
        preset: Option<String>,

        /// Room-tone recording to build the noise profile from
        #[arg(long)]
        noise_profile: Option<PathBuf>,

        /// Disable the noise-reduction stage
        #[arg(long)]
        no_noise_reduction: bool,

        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Extract the audio track of video files as mono WAV
    Extract {
        /// Input video files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "./audio")]
        output_dir: PathBuf,

        /// Resample rate (omit to keep the source rate)
        #[arg(long)]
        sample_rate: Option<u32>,
    },

    /// Build a subtitle file from a word-timestamp transcript JSON
    Subtitles {
        /// Transcript JSON ([{"word", "start", "end"}, ...])
        #[arg(long)]
        words: PathBuf,

        /// Output subtitle file (.srt or .ass)
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (inferred from the output extension by default)
        #[arg(long, value_enum)]
        format: Option<SubtitleFormat>,

        /// Maximum words per cue
        #[arg(long)]
        max_words: Option<usize>,
    },

    /// List available enhancement presets
    Presets,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SubtitleFormat {
    Srt,
    Ass,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "audio_enhancer_rust=debug,info"
    } else {
        "audio_enhancer_rust=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };
    config.validate()?;

    match cli.command {
        Commands::Enhance {
            inputs,
            output_dir,
            preset,
            noise_profile,
            no_noise_reduction,
            workers,
        } => {
            run_enhance(
                config,
                inputs,
                output_dir,
                preset,
                noise_profile,
                no_noise_reduction,
                workers,
            )
            .await
        }
        Commands::Extract {
            inputs,
            output_dir,
            sample_rate,
        } => run_extract(config, inputs, output_dir, sample_rate).await,
        Commands::Subtitles {
            words,
            output,
            format,
            max_words,
        } => run_subtitles(config, words, output, format, max_words).await,
        Commands::Presets => {
            let library = PresetLibrary::with_user_presets(&config.enhance.presets);
            for preset in library.presets() {
                println!(
                    "{:<16} band {:>5.0}-{:<5.0} Hz, threshold {:.2}, saturation {:.2}, target {:.0} LUFS",
                    preset.name,
                    preset.lowcut_hz,
                    preset.highcut_hz,
                    preset.compression_threshold,
                    preset.saturation_gain,
                    preset.target_lufs,
                );
            }
            Ok(())
        }
    }
}

async fn run_enhance(
    mut config: Config,
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    preset: Option<String>,
    noise_profile: Option<PathBuf>,
    no_noise_reduction: bool,
    workers: Option<usize>,
) -> Result<()> {
    if let Some(workers) = workers {
        config.batch.max_workers = workers.max(1);
    }
    if no_noise_reduction {
        config.enhance.noise_reduction = false;
    }
    let preset_name = preset.unwrap_or_else(|| config.enhance.preset.clone());

    // Inputs may include video containers, which need the external decoders
    io::ensure_ffmpeg().or_else(|e| {
        let all_wav = inputs.iter().all(|p| io::is_wav(p));
        if all_wav {
            warn!("ffmpeg not found, proceeding with WAV-only inputs");
            Ok(())
        } else {
            Err(e)
        }
    })?;

    info!("🚀 Audio Enhancer starting");
    info!("🎛️  Preset: {}", preset_name);
    info!("🔧 Workers: {}", config.batch.max_workers);

    let mut processor = BatchProcessor::new(config, &preset_name)?;
    if let Some(clip) = noise_profile {
        processor = processor.with_noise_profile(&clip).await?;
    }
    processor.install_ctrl_c_handler();

    let discovered = processor.discover_inputs(&inputs)?;
    let report = processor.run(discovered, &output_dir).await?;

    if report.total > 0 && report.failed == report.total {
        return Err(anyhow!("all {} files failed", report.total));
    }
    Ok(())
}

async fn run_extract(
    config: Config,
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    sample_rate: Option<u32>,
) -> Result<()> {
    io::ensure_ffmpeg()?;
    let rate = sample_rate.or(config.io.extract_sample_rate);
    let extractor = AudioExtractor::new(rate);

    let mut failures = 0usize;
    for input in &inputs {
        match extractor.extract_to_dir(input, &output_dir).await {
            Ok(path) => info!("✅ {}", path.display()),
            Err(e) => {
                warn!("❌ {}: {:#}", input.display(), e);
                failures += 1;
            }
        }
    }

    if failures == inputs.len() {
        return Err(anyhow!("all {} extractions failed", failures));
    }
    Ok(())
}

async fn run_subtitles(
    config: Config,
    words_path: PathBuf,
    output: PathBuf,
    format: Option<SubtitleFormat>,
    max_words: Option<usize>,
) -> Result<()> {
    let format = format.unwrap_or_else(|| {
        match output.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ass") => SubtitleFormat::Ass,
            _ => SubtitleFormat::Srt,
        }
    });

    let words = load_words(&words_path).await?;
    if words.is_empty() {
        return Err(anyhow!("transcript {} contains no words", words_path.display()));
    }

    let mut settings = CueSettings::from(&config.subtitles);
    if let Some(max_words) = max_words {
        settings.max_words = max_words.max(1);
    }
    let cues = group_into_cues(&words, &settings);

    match format {
        SubtitleFormat::Srt => {
            let file = SrtFile::from_cues(&cues);
            for issue in file.validate() {
                warn!("SRT issue: {}", issue);
            }
            file.save(&output).await?;
        }
        SubtitleFormat::Ass => {
            ass::save(&cues, &AssStyle::default(), &output).await?;
        }
    }

    info!("🎬 Wrote {} cues to {}", cues.len(), output.display());
    Ok(())
}
