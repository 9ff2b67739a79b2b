//! Utility modules for conversion engines.

mod ffmpeg_parser;
mod output_record_reader;
mod process_runner;

pub use ffmpeg_parser::{
    is_error_line, is_progress_line, parse_progress, parse_time, parse_time_field,
    parse_total_duration,
};
pub use output_record_reader::StderrRecords;
pub use process_runner::{ProcessExit, spawn_process_waiter};
