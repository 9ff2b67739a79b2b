//! FFmpeg stderr parsing.
//!
//! FFmpeg reports the input length once in the stream header
//! (`Duration: 00:42:10.52, start: ...`) and then periodically prints
//! progress lines such as
//! `frame=  100 fps=25 q=28.0 size=  1024kB time=00:00:04.00 bitrate=2097.2kbits/s speed=1.00x`.

use std::time::Duration;

/// Parse time string in `HH:MM:SS.ms` format.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use mdl_queue::engine::utils::parse_time;
///
/// assert_eq!(parse_time("00:00:10.50"), Some(Duration::from_millis(10_500)));
/// assert_eq!(parse_time("01:30:00.00"), Some(Duration::from_secs(5400)));
/// assert_eq!(parse_time("invalid"), None);
/// ```
pub fn parse_time(time_str: &str) -> Option<Duration> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    // ffmpeg prints negative times (e.g. `time=-00:00:00.04`) before the first frame
    if total < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(total).ok()
}

/// Parse the input length from a stream header line (`Duration: HH:MM:SS.ms, ...`).
///
/// Live or unknown inputs print `Duration: N/A` and yield `None`.
pub fn parse_total_duration(line: &str) -> Option<Duration> {
    let start = line.find("Duration:")?;
    let rest = line[start + "Duration:".len()..].trim_start();
    let end = rest.find([',', ' ']).unwrap_or(rest.len());
    parse_time(&rest[..end])
}

/// Parse the `time=` field of a progress line.
pub fn parse_time_field(line: &str) -> Option<Duration> {
    let time_start = line.find("time=")?;
    let time_str = line[time_start + 5..].trim_start();
    let end = time_str.find(' ').unwrap_or(time_str.len());
    parse_time(&time_str[..end])
}

/// Whether a line is a periodic progress line.
///
/// Requires `time=` plus another progress marker so that unrelated lines
/// mentioning `time=` are not picked up.
pub fn is_progress_line(line: &str) -> bool {
    line.contains("time=") && (line.contains("frame=") || line.contains("size="))
}

/// Media time converted so far, if the line is a progress line.
pub fn parse_progress(line: &str) -> Option<Duration> {
    if !is_progress_line(line) {
        return None;
    }
    parse_time_field(line)
}

/// Whether a stderr line looks like an error worth surfacing to the user.
pub fn is_error_line(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("error")
        || lower.contains("invalid")
        || lower.contains("not found")
        || lower.contains("denied")
        || lower.contains("no such file")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_valid() {
        assert_eq!(parse_time("00:00:10.50"), Some(Duration::from_millis(10_500)));
        assert_eq!(parse_time("00:01:30.50"), Some(Duration::from_millis(90_500)));
        assert_eq!(parse_time("10:00:00.00"), Some(Duration::from_secs(36_000)));
    }

    #[test]
    fn test_parse_time_invalid() {
        assert_eq!(parse_time("invalid"), None);
        assert_eq!(parse_time("00:00"), None);
        assert_eq!(parse_time(""), None);
        assert_eq!(parse_time("00:00:00:00"), None);
        assert_eq!(parse_time("-00:00:00.04"), None);
    }

    #[test]
    fn test_parse_time_out_of_range() {
        assert_eq!(parse_time("1e20:00:00.00"), None);
        assert_eq!(parse_time("00:00:inf"), None);
        assert_eq!(parse_time("00:00:NaN"), None);
        assert_eq!(
            parse_progress("frame=1 size=1kB time=1e20:00:00.00 speed=1x"),
            None
        );
        assert_eq!(parse_total_duration("  Duration: 1e20:00:00.00, start: 0"), None);
    }

    #[test]
    fn test_parse_total_duration() {
        let line = "  Duration: 00:42:10.52, start: 1.400000, bitrate: 2811 kb/s";
        assert_eq!(
            parse_total_duration(line),
            Some(Duration::from_millis(2_530_520))
        );
        assert_eq!(
            parse_total_duration("  Duration: N/A, start: 0.000000, bitrate: N/A"),
            None
        );
        assert_eq!(parse_total_duration("Stream #0:0: Video: h264"), None);
    }

    #[test]
    fn test_parse_progress_complete_line() {
        let line = "frame=  100 fps=25 q=-1.0 size=    1024kB time=00:00:04.00 bitrate=2097.2kbits/s speed=1.00x";
        assert_eq!(parse_progress(line), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_parse_progress_without_size_field() {
        let line = "frame=  100 fps=25 q=-1.0 time=00:00:04.00 bitrate=2097.2kbits/s speed=1.00x";
        assert_eq!(parse_progress(line), Some(Duration::from_secs(4)));
    }

    #[test]
    fn test_parse_progress_rejects_non_progress_lines() {
        assert!(parse_progress("time=00:00:10.00").is_none());
        assert!(parse_progress("frame=100 fps=25 q=-1.0").is_none());
        assert!(parse_progress("Input #0, hls, from 'https://example.com/a.m3u8':").is_none());
    }

    #[test]
    fn test_is_error_line() {
        assert!(is_error_line(
            "https://example.com/a.m3u8: Server returned 404 Not Found"
        ));
        assert!(is_error_line("Error opening input files: Invalid data found"));
        assert!(!is_error_line("frame=  100 fps=25 time=00:00:04.00"));
    }
}
