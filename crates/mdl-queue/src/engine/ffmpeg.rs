//! FFmpeg conversion engine implementation.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::traits::{ConversionEngine, ConversionRequest, ProgressCallback};
use super::utils::{
    ProcessExit, StderrRecords, is_error_line, parse_progress, parse_total_duration,
    spawn_process_waiter,
};
use crate::error::ConversionError;
use crate::job::ConversionProgress;

/// Video encoder used when hardware encoding is enabled.
pub const GPU_VIDEO_CODEC: &str = "h264_nvenc";
/// Video encoder used otherwise.
pub const CPU_VIDEO_CODEC: &str = "libx264";

/// FFmpeg engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegEngineConfig {
    /// Path or name of the ffmpeg binary.
    pub binary_path: String,
    /// Encode video with the NVENC hardware encoder instead of libx264.
    pub use_gpu: bool,
    /// Extra arguments placed before `-i`.
    pub input_args: Vec<String>,
    /// Extra arguments placed before the output path.
    pub output_args: Vec<String>,
    /// Container extension of produced files.
    pub output_extension: String,
}

impl Default for FfmpegEngineConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            use_gpu: false,
            input_args: Vec::new(),
            output_args: Vec::new(),
            output_extension: "mp4".to_string(),
        }
    }
}

impl FfmpegEngineConfig {
    pub fn video_codec(&self) -> &'static str {
        if self.use_gpu {
            GPU_VIDEO_CODEC
        } else {
            CPU_VIDEO_CODEC
        }
    }
}

/// Converts HLS playlists into single media files by running ffmpeg.
pub struct FfmpegEngine {
    config: FfmpegEngineConfig,
    /// Cached `ffmpeg -version` banner.
    version: Option<String>,
}

impl FfmpegEngine {
    /// Create a new FFmpeg engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(FfmpegEngineConfig::default())
    }

    /// Create with a custom configuration.
    pub fn with_config(config: FfmpegEngineConfig) -> Self {
        let version = Self::detect_version(&config.binary_path);
        Self { config, version }
    }

    pub fn config(&self) -> &FfmpegEngineConfig {
        &self.config
    }

    fn detect_version(path: &str) -> Option<String> {
        std::process::Command::new(path)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()
            .filter(|output| output.status.success())
            .and_then(|output| {
                String::from_utf8(output.stdout)
                    .ok()
                    .and_then(|s| s.lines().next().map(str::to_string))
            })
    }

    fn build_args(&self, request: &ConversionRequest) -> Vec<String> {
        let mut args: Vec<String> = ["-y", "-hide_banner", "-nostdin"]
            .into_iter()
            .map(String::from)
            .collect();

        args.extend(self.config.input_args.iter().cloned());
        args.extend(["-i".to_string(), request.source.clone()]);
        args.extend(["-c:v".to_string(), self.config.video_codec().to_string()]);
        args.extend(self.config.output_args.iter().cloned());
        args.push(request.destination.to_string_lossy().to_string());

        args
    }
}

impl Default for FfmpegEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversionEngine for FfmpegEngine {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn output_extension(&self) -> &str {
        &self.config.output_extension
    }

    async fn convert(
        &self,
        request: ConversionRequest,
        cancellation_token: CancellationToken,
        on_progress: ProgressCallback,
    ) -> Result<(), ConversionError> {
        if cancellation_token.is_cancelled() {
            return Err(ConversionError::Cancelled);
        }

        if let Some(parent) = request.destination.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.build_args(&request);
        debug!(job_id = request.job_id, ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.config.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ConversionError::Spawn)?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ConversionError::failed("ffmpeg stderr was not captured"))?;
        let exit_rx = spawn_process_waiter(child, cancellation_token.clone());

        info!(
            job_id = request.job_id,
            destination = %request.destination.display(),
            "ffmpeg conversion started"
        );

        let mut records = StderrRecords::new(stderr);
        let mut monitor = StderrMonitor::default();
        loop {
            match records.next_record().await {
                Ok(Some(line)) => {
                    if let Some(progress) = monitor.observe(&line) {
                        on_progress(progress);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(job_id = request.job_id, error = %e, "Failed to read ffmpeg output");
                    break;
                }
            }
        }

        match exit_rx.await {
            Ok(ProcessExit::Exited(status)) if status.success() => Ok(()),
            Ok(ProcessExit::Killed) => Err(ConversionError::Cancelled),
            Ok(ProcessExit::Exited(_)) if cancellation_token.is_cancelled() => {
                Err(ConversionError::Cancelled)
            }
            Ok(ProcessExit::Exited(status)) => Err(ConversionError::ExitStatus {
                code: status.code(),
                detail: monitor.error_detail(),
            }),
            Ok(ProcessExit::WaitFailed(e)) => Err(ConversionError::Io(e)),
            Err(_) => Err(ConversionError::failed("ffmpeg process waiter stopped unexpectedly")),
        }
    }

    fn is_available(&self) -> bool {
        self.version.is_some()
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }
}

/// Turns ffmpeg stderr records into progress updates and keeps error context.
#[derive(Debug, Default)]
struct StderrMonitor {
    total: Duration,
    elapsed: Duration,
    last_error: Option<String>,
    last_line: Option<String>,
}

impl StderrMonitor {
    /// Feed one record; returns a progress update when converted time advanced.
    fn observe(&mut self, line: &str) -> Option<ConversionProgress> {
        if let Some(elapsed) = parse_progress(line) {
            if elapsed <= self.elapsed {
                return None;
            }
            self.elapsed = elapsed;
            return Some(ConversionProgress::from_times(self.elapsed, self.total));
        }

        // Only the first header counts; later ones describe outputs.
        if self.total.is_zero()
            && let Some(total) = parse_total_duration(line)
        {
            self.total = total;
            return None;
        }

        if is_error_line(line) {
            self.last_error = Some(line.to_string());
        }
        self.last_line = Some(line.to_string());
        None
    }

    fn error_detail(&self) -> String {
        self.last_error
            .clone()
            .or_else(|| self.last_line.clone())
            .unwrap_or_else(|| "no output from ffmpeg".to_string())
    }
}
