use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::audio::io;
use crate::config::Config;
use crate::enhance::{EnhanceReport, Enhancer};
use crate::extract::{is_video, AudioExtractor};
use crate::presets::PresetLibrary;

/// Outcome for a single input file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileStatus {
    Completed,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub status: FileStatus,
    pub error_message: Option<String>,
    pub processing_secs: f64,
    pub report: Option<EnhanceReport>,
}

/// Whole-run summary, written as JSON next to the outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub preset: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total_secs: f64,
    pub results: Vec<FileResult>,
}

/// Cooperative cancellation flag, set from Ctrl-C. Checked between files:
/// the file currently being processed always finishes.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Parallel batch runner for the enhancement chain.
///
/// Files are processed under a semaphore-bounded worker pool; per-file
/// failures are recorded and the run keeps going.
pub struct BatchProcessor {
    config: Config,
    enhancer: Enhancer,
    worker_semaphore: Arc<Semaphore>,
    max_workers: usize,
    cancel: CancelFlag,
}

impl BatchProcessor {
    pub fn new(config: Config, preset_name: &str) -> Result<Self> {
        let library = PresetLibrary::with_user_presets(&config.enhance.presets);
        let preset = library
            .get(preset_name)
            .ok_or_else(|| {
                anyhow!(
                    "unknown preset '{}' (available: {})",
                    preset_name,
                    library.names().join(", ")
                )
            })?
            .clone();

        let mut enhancer = Enhancer::new(preset);
        if config.enhance.noise_reduction {
            enhancer = enhancer.with_noise_reduction(config.enhance.prop_decrease);
        }

        let max_workers = config.batch.max_workers.max(1);
        info!("🔧 Initializing batch processor with {} workers", max_workers);

        Ok(Self {
            config,
            enhancer,
            worker_semaphore: Arc::new(Semaphore::new(max_workers)),
            max_workers,
            cancel: CancelFlag::default(),
        })
    }

    /// Gate the run against a room-tone recording.
    pub async fn with_noise_profile(mut self, clip_path: &Path) -> Result<Self> {
        let clip = io::load(clip_path).await?;
        match self.enhancer.profile_noise(&clip) {
            Some(profile) => {
                info!("📤 Loaded noise profile: {}", clip_path.display());
                self.enhancer = self.enhancer.with_noise_profile(profile);
            }
            None => {
                warn!("Noise profile given but noise reduction is disabled, ignoring");
            }
        }
        Ok(self)
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Set the cancel flag on the first Ctrl-C.
    pub fn install_ctrl_c_handler(&self) {
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("🛑 Cancellation requested, finishing current files");
                cancel.cancel();
            }
        });
    }

    /// Expand files and directories into the list of supported inputs.
    pub fn discover_inputs(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut inputs = Vec::new();
        for path in paths {
            if path.is_dir() {
                for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
                    if entry.file_type().is_file() && self.is_supported(entry.path()) {
                        inputs.push(entry.path().to_path_buf());
                    }
                }
            } else if path.is_file() {
                inputs.push(path.clone());
            } else {
                return Err(anyhow!("input not found: {}", path.display()));
            }
        }
        inputs.sort();
        inputs.dedup();
        Ok(inputs)
    }

    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.config
                    .batch
                    .supported_extensions
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&ext))
            })
            .unwrap_or(false)
    }

    /// Process every input, writing enhanced WAVs and a JSON report into
    /// `output_dir`.
    pub async fn run(&self, inputs: Vec<PathBuf>, output_dir: &Path) -> Result<BatchReport> {
        let started_at = Utc::now();
        let start_time = Instant::now();

        if inputs.is_empty() {
            warn!("No supported input files found");
            return Ok(BatchReport {
                started_at,
                preset: self.enhancer.preset().name.clone(),
                total: 0,
                successful: 0,
                failed: 0,
                skipped: 0,
                total_secs: 0.0,
                results: Vec::new(),
            });
        }

        tokio::fs::create_dir_all(output_dir).await?;
        info!("🚀 Enhancing {} files -> {}", inputs.len(), output_dir.display());

        let progress = ProgressBar::new(inputs.len() as u64);
        progress.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );

        let (tx, mut rx) = mpsc::channel(self.max_workers);
        let total = inputs.len();

        for input in inputs {
            let tx = tx.clone();
            let semaphore = Arc::clone(&self.worker_semaphore);
            let cancel = self.cancel.clone();
            let enhancer = self.enhancer.clone();
            let output_dir = output_dir.to_path_buf();
            let suffix = self.config.io.output_suffix.clone();
            let skip_existing = self.config.batch.skip_existing;
            let extract_rate = self.config.io.extract_sample_rate;

            tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();

                let result = if cancel.is_cancelled() {
                    FileResult {
                        input: input.clone(),
                        output: None,
                        status: FileStatus::Skipped,
                        error_message: Some("cancelled".to_string()),
                        processing_secs: 0.0,
                        report: None,
                    }
                } else {
                    process_one(
                        &enhancer,
                        &input,
                        &output_dir,
                        &suffix,
                        skip_existing,
                        extract_rate,
                    )
                    .await
                };

                if let Err(e) = tx.send(result).await {
                    error!("Failed to send result: {}", e);
                }
            });
        }
        drop(tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = rx.recv().await {
            match result.status {
                FileStatus::Completed => {
                    progress.set_message(
                        result
                            .input
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default(),
                    );
                    debug!(
                        "Completed {} in {:.2}s",
                        result.input.display(),
                        result.processing_secs
                    );
                }
                FileStatus::Failed => {
                    warn!(
                        "❌ Failed: {} - {}",
                        result.input.display(),
                        result.error_message.as_deref().unwrap_or("unknown error")
                    );
                }
                FileStatus::Skipped => {
                    debug!("Skipped {}", result.input.display());
                }
            }
            progress.inc(1);
            results.push(result);
        }
        progress.finish_and_clear();

        results.sort_by(|a, b| a.input.cmp(&b.input));

        let successful = results
            .iter()
            .filter(|r| r.status == FileStatus::Completed)
            .count();
        let failed = results
            .iter()
            .filter(|r| r.status == FileStatus::Failed)
            .count();
        let skipped = results
            .iter()
            .filter(|r| r.status == FileStatus::Skipped)
            .count();

        let report = BatchReport {
            started_at,
            preset: self.enhancer.preset().name.clone(),
            total: results.len(),
            successful,
            failed,
            skipped,
            total_secs: start_time.elapsed().as_secs_f64(),
            results,
        };

        let report_path = output_dir.join(&self.config.batch.results_file);
        let json_data = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(&report_path, json_data).await?;
        info!("💾 Results saved to: {}", report_path.display());

        info!(
            "🎉 Done in {:.2}s: {} ok, {} failed, {} skipped",
            report.total_secs, report.successful, report.failed, report.skipped
        );

        Ok(report)
    }
}

/// Load (extracting from video if needed), enhance, save. Any error is
/// captured into the result record.
async fn process_one(
    enhancer: &Enhancer,
    input: &Path,
    output_dir: &Path,
    suffix: &str,
    skip_existing: bool,
    extract_rate: Option<u32>,
) -> FileResult {
    let start = Instant::now();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let output = output_dir.join(format!("{}{}.wav", stem, suffix));

    if skip_existing && output.exists() {
        debug!("Output exists, skipping {}", input.display());
        return FileResult {
            input: input.to_path_buf(),
            output: Some(output),
            status: FileStatus::Skipped,
            error_message: None,
            processing_secs: 0.0,
            report: None,
        };
    }

    match enhance_file(enhancer, input, &output, extract_rate).await {
        Ok(report) => FileResult {
            input: input.to_path_buf(),
            output: Some(output),
            status: FileStatus::Completed,
            error_message: None,
            processing_secs: start.elapsed().as_secs_f64(),
            report: Some(report),
        },
        Err(e) => FileResult {
            input: input.to_path_buf(),
            output: None,
            status: FileStatus::Failed,
            error_message: Some(format!("{:#}", e)),
            processing_secs: start.elapsed().as_secs_f64(),
            report: None,
        },
    }
}

async fn enhance_file(
    enhancer: &Enhancer,
    input: &Path,
    output: &Path,
    extract_rate: Option<u32>,
) -> Result<EnhanceReport> {
    info!("🎧 Processing: {}", input.display());

    let mut buffer = if is_video(input) {
        let temp = tempfile::Builder::new()
            .prefix("enhancer_extract_")
            .suffix(".wav")
            .tempfile()?;
        AudioExtractor::new(extract_rate)
            .extract(input, temp.path())
            .await?;
        io::load_wav(temp.path())?
    } else {
        io::load(input).await?
    };

    // DSP is pure CPU work, keep it off the async workers
    let enhancer = enhancer.clone();
    let (buffer, report) = tokio::task::spawn_blocking(move || {
        let report = enhancer.process(&mut buffer)?;
        Ok::<_, anyhow::Error>((buffer, report))
    })
    .await??;

    io::save_wav(&buffer, output)?;
    info!("💾 Saved: {}", output.display());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_unknown_preset_is_rejected() {
        let config = Config::default();
        let result = BatchProcessor::new(config, "no-such-preset");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_run() {
        let config = Config::default();
        let processor = BatchProcessor::new(config, "podcast-voice").unwrap();

        let temp_dir = TempDir::new().unwrap();
        let report = processor
            .run(Vec::new(), &temp_dir.path().join("out"))
            .await
            .unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(report.successful, 0);
    }

    #[tokio::test]
    async fn test_discovery_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("take1.wav"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("take2.mp3"), b"x").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"x").unwrap();

        let config = Config::default();
        let processor = BatchProcessor::new(config, "podcast-voice").unwrap();
        let inputs = processor
            .discover_inputs(&[temp_dir.path().to_path_buf()])
            .unwrap();

        assert_eq!(inputs.len(), 2);
        assert!(inputs.iter().all(|p| {
            let ext = p.extension().unwrap().to_str().unwrap();
            ext == "wav" || ext == "mp3"
        }));
    }

    #[tokio::test]
    async fn test_missing_input_errors() {
        let config = Config::default();
        let processor = BatchProcessor::new(config, "podcast-voice").unwrap();
        let result = processor.discover_inputs(&[PathBuf::from("/does/not/exist.wav")]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_flag() {
        let flag = CancelFlag::default();
        assert!(!flag.is_cancelled());
        flag.cancel();
        assert!(flag.is_cancelled());
    }
}
