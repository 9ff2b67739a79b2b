//! Conversion engines.
//!
//! The queue manager hands each job to a [`ConversionEngine`]; [`FfmpegEngine`]
//! is the bundled implementation.

mod ffmpeg;
mod traits;
pub mod utils;

pub use ffmpeg::{CPU_VIDEO_CODEC, FfmpegEngine, FfmpegEngineConfig, GPU_VIDEO_CODEC};
pub use traits::{ConversionEngine, ConversionRequest, ProgressCallback};
