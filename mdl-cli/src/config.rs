//! Configuration file and command-line merging.

use std::path::{Path, PathBuf};

use mdl_queue::{FfmpegEngineConfig, QueueManagerConfig};
use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::error::{AppError, Result};

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub max_concurrency: Option<usize>,
    pub use_gpu: Option<bool>,
    pub ffmpeg_path: Option<String>,
    pub output_extension: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub naming_pattern: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl AppConfig {
    /// `<config dir>/mdl/config.toml`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mdl").join("config.toml"))
    }

    /// Load the explicit file, or the default file if it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Effective settings after applying command-line overrides.
#[derive(Debug, Clone)]
pub struct Settings {
    pub queue: QueueManagerConfig,
    pub engine: FfmpegEngineConfig,
    pub output_dir: Option<PathBuf>,
    pub naming_pattern: Option<String>,
    pub log_dir: PathBuf,
}

impl Settings {
    pub fn resolve(args: &Args, file: AppConfig) -> Self {
        let mut queue = QueueManagerConfig::default();
        if let Some(max) = args.max_concurrency.or(file.max_concurrency) {
            queue.max_concurrency = max;
        }

        let mut engine = FfmpegEngineConfig {
            use_gpu: args.gpu || file.use_gpu.unwrap_or(false),
            ..Default::default()
        };
        if let Some(binary) = args.ffmpeg.clone().or(file.ffmpeg_path) {
            engine.binary_path = binary;
        }
        if let Some(extension) = file.output_extension {
            engine.output_extension = extension.trim_start_matches('.').to_string();
        }

        Self {
            queue,
            engine,
            output_dir: args.output.clone().or(file.output_dir),
            naming_pattern: args.name.clone().or(file.naming_pattern),
            log_dir: args
                .log_dir
                .clone()
                .or(file.log_dir)
                .unwrap_or_else(default_log_dir),
        }
    }
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("mdl").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_file() {
        let config: AppConfig = toml::from_str(
            r#"
            max_concurrency = 2
            use_gpu = true
            ffmpeg_path = "/usr/local/bin/ffmpeg"
            output_extension = ".mkv"
            output_dir = "/srv/videos"
            naming_pattern = "lecture"
            log_dir = "/var/log/mdl"
            "#,
        )
        .unwrap();
        assert_eq!(config.max_concurrency, Some(2));
        assert_eq!(config.use_gpu, Some(true));
        assert_eq!(config.naming_pattern.as_deref(), Some("lecture"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(toml::from_str::<AppConfig>("threads = 3").is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(&dir.path().join("missing.toml")));
        assert!(matches!(result, Err(AppError::ConfigRead { .. })));
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_concurrency = \"four\"").unwrap();
        let err = AppConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, AppError::ConfigParse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = AppConfig {
            max_concurrency: Some(2),
            use_gpu: Some(false),
            ffmpeg_path: Some("/usr/bin/ffmpeg".into()),
            output_extension: Some(".mkv".into()),
            output_dir: Some("/srv/videos".into()),
            naming_pattern: Some("lecture".into()),
            log_dir: Some("/var/log/mdl".into()),
        };
        let args = Args {
            max_concurrency: Some(6),
            gpu: true,
            name: Some("talk".into()),
            ..Default::default()
        };

        let settings = Settings::resolve(&args, file);
        assert_eq!(settings.queue.max_concurrency, 6);
        assert!(settings.engine.use_gpu);
        assert_eq!(settings.engine.binary_path, "/usr/bin/ffmpeg");
        assert_eq!(settings.engine.output_extension, "mkv");
        assert_eq!(settings.output_dir, Some(PathBuf::from("/srv/videos")));
        assert_eq!(settings.naming_pattern.as_deref(), Some("talk"));
        assert_eq!(settings.log_dir, PathBuf::from("/var/log/mdl"));
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = Settings::resolve(&Args::default(), AppConfig::default());
        assert_eq!(settings.queue, QueueManagerConfig::default());
        assert_eq!(settings.engine, FfmpegEngineConfig::default());
        assert!(settings.output_dir.is_none());
        assert!(settings.naming_pattern.is_none());
    }
}
