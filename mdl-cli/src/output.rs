//! Terminal rendering of queue state and command results.

use std::fmt::Write;
use std::time::Duration;

use colored::{Color, Colorize};
use mdl_queue::{Job, JobStatus, QueueSnapshot};

use crate::commands::ExecutionResult;

/// `HH:MM:SS`, hours unbounded.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn format_wall_time(job: &Job) -> Option<String> {
    let wall = job.wall_time()?.to_std().ok()?;
    Some(format_duration(wall))
}

/// Colour of an in-progress line by completion.
pub fn progress_color(percent: u8) -> Color {
    match percent {
        0..25 => Color::Red,
        25..80 => Color::Yellow,
        _ => Color::Blue,
    }
}

fn render_job(job: &Job) -> String {
    let label = format!("[{}] {}", job.id, job.destination_name);
    match job.status {
        JobStatus::Pending => format!("  {}  {}", label.yellow(), job.source.dimmed()),
        JobStatus::InProgress => {
            let progress = &job.progress;
            let detail = format!(
                "{} of {} ({}%)",
                format_duration(progress.elapsed),
                format_duration(progress.total),
                progress.percent
            );
            format!(
                "  {}  {}",
                label,
                detail.color(progress_color(progress.percent))
            )
        }
        JobStatus::Completed => {
            let took = format_wall_time(job)
                .map(|t| format!(" in {t}"))
                .unwrap_or_default();
            format!("  {}", format!("{label}  Completed{took}").green())
        }
        JobStatus::Cancelled => format!("  {}", format!("{label}  Cancelled").magenta()),
        JobStatus::Failed => {
            let mut line = format!("  {}", format!("{label}  Failed").red());
            if let Some(error) = &job.error {
                let _ = write!(line, "\n      {}", error.red().dimmed());
            }
            line
        }
    }
}

fn render_section(out: &mut String, title: &str, jobs: &[Job]) {
    let _ = writeln!(out, "{} ({})", title.bold(), jobs.len());
    if jobs.is_empty() {
        let _ = writeln!(out, "  {}", "none".dimmed());
    }
    for job in jobs {
        let _ = writeln!(out, "{}", render_job(job));
    }
}

/// Multi-line status report of all partitions.
pub fn render_snapshot(snapshot: &QueueSnapshot) -> String {
    let mut out = String::new();

    let run = match snapshot.run {
        Some(run) => format!("running (run {run})").green().to_string(),
        None => "idle".to_string(),
    };
    let _ = writeln!(
        out,
        "State: {run}, up to {} at a time",
        snapshot.max_concurrency
    );
    let _ = writeln!(
        out,
        "Output: {}",
        snapshot
            .output_dir
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    );
    let _ = writeln!(
        out,
        "Pattern: {}",
        snapshot.naming_pattern.as_deref().unwrap_or("(not set)")
    );

    render_section(&mut out, "Pending", &snapshot.pending);
    render_section(&mut out, "In progress", &snapshot.in_progress);
    render_section(&mut out, "Finished", &snapshot.history);

    out.trim_end().to_string()
}

/// One-line notice printed when a job finishes in the background.
pub fn render_job_notice(job: &Job) -> String {
    let name = &job.destination_name;
    match job.status {
        JobStatus::Completed => format!("Finished '{name}'").green().to_string(),
        JobStatus::Cancelled => format!("Cancelled '{name}'").magenta().to_string(),
        JobStatus::Failed => format!(
            "Failed '{name}': {}",
            job.error.as_deref().unwrap_or("unknown error")
        )
        .red()
        .to_string(),
        JobStatus::Pending | JobStatus::InProgress => format!("'{name}' is {}", job.status),
    }
}

/// Text to print for a command result; empty for silent results.
pub fn render_result(result: &ExecutionResult) -> String {
    if result.message.is_empty() {
        String::new()
    } else if result.success {
        result.message.clone()
    } else {
        format!("{} {}", "Error:".red().bold(), result.message.red())
    }
}
