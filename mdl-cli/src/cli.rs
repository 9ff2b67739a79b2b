use std::path::PathBuf;

use clap::Parser;

/// Queue M3U8 streams and convert them to local video files with ffmpeg.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "mdl", version, about, long_about = None)]
pub struct Args {
    /// Configuration file [default: <config dir>/mdl/config.toml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of simultaneous conversions
    #[arg(
        short = 'j',
        long,
        env = "MDL_MAX_CONCURRENCY",
        value_name = "N"
    )]
    pub max_concurrency: Option<usize>,

    /// Encode video with the NVENC hardware encoder
    #[arg(long)]
    pub gpu: bool,

    /// Path to the ffmpeg binary
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<String>,

    /// Initial output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Initial naming pattern for queued jobs
    #[arg(short, long, value_name = "PATTERN")]
    pub name: Option<String>,

    /// Directory for log files
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Also print info-level logs to the console
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "mdl", "-j", "3", "--gpu", "--ffmpeg", "/opt/ffmpeg", "-o", "/tmp/out", "-n", "clip",
            "-v",
        ])
        .unwrap();
        assert_eq!(args.max_concurrency, Some(3));
        assert!(args.gpu);
        assert_eq!(args.ffmpeg.as_deref(), Some("/opt/ffmpeg"));
        assert_eq!(args.output, Some(PathBuf::from("/tmp/out")));
        assert_eq!(args.name.as_deref(), Some("clip"));
        assert!(args.verbose);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_rejects_non_numeric_concurrency() {
        assert!(Args::try_parse_from(["mdl", "--max-concurrency", "many"]).is_err());
    }
}
