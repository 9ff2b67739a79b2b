//! Command parsing and dispatch to the queue manager.

use std::io::Write;

use colored::Colorize;
use mdl_queue::{QueueError, QueueManager, StopOutcome};
use tracing::{debug, info};

use crate::output::render_snapshot;

/// Commands understood by the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Help,
    Exit,
    Clear,
    Add,
    Remove,
    Output,
    Name,
    Status,
    Start,
    Stop,
}

impl CommandType {
    pub const ALL: [CommandType; 10] = [
        Self::Help,
        Self::Exit,
        Self::Clear,
        Self::Add,
        Self::Remove,
        Self::Output,
        Self::Name,
        Self::Status,
        Self::Start,
        Self::Stop,
    ];

    /// Case-insensitive lookup by name or alias.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Some(Self::Help),
            "exit" | "quit" => Some(Self::Exit),
            "clear" | "cls" => Some(Self::Clear),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "output" => Some(Self::Output),
            "name" => Some(Self::Name),
            "status" => Some(Self::Status),
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }

    pub fn usage(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Exit => "exit",
            Self::Clear => "clear",
            Self::Add => "add <url|path>",
            Self::Remove => "remove",
            Self::Output => "output [dir]",
            Self::Name => "name [pattern]",
            Self::Status => "status",
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Help => "Show this help",
            Self::Exit => "Stop any running conversions and quit",
            Self::Clear => "Clear the screen",
            Self::Add => "Queue an M3U8 playlist URL or local file",
            Self::Remove => "Remove the most recently queued job that has not started",
            Self::Output => "Show or set the output directory",
            Self::Name => "Show or set the naming pattern (files are named <pattern>_<n>)",
            Self::Status => "Show pending, running and finished jobs",
            Self::Start => "Start converting the queue",
            Self::Stop => "Stop converting; pending jobs are discarded",
        }
    }
}

/// Split a line into command name and argument (the trimmed rest of the line).
pub fn split_command(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match line.split_once(char::is_whitespace) {
        Some((name, rest)) => Some((name, rest.trim())),
        None => Some((line, "")),
    }
}

/// Result of one command, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    /// Message for the user; styled already when `success` is set.
    pub message: String,
    pub should_exit: bool,
}

impl ExecutionResult {
    /// Success with a confirmation line.
    pub fn ok(message: impl AsRef<str>) -> Self {
        Self::report(message.as_ref().green().to_string())
    }

    /// Success with pre-styled text.
    pub fn report(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            should_exit: false,
        }
    }

    /// Success with nothing to print.
    pub fn silent() -> Self {
        Self::report(String::new())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            should_exit: false,
        }
    }

    pub fn exit(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            should_exit: true,
        }
    }
}

impl From<QueueError> for ExecutionResult {
    fn from(error: QueueError) -> Self {
        Self::error(error.to_string())
    }
}

pub fn help_text() -> String {
    let width = CommandType::ALL
        .iter()
        .map(|c| c.usage().len())
        .max()
        .unwrap_or(0);
    let mut text = format!("{}\n", "Commands:".bold());
    for command in CommandType::ALL {
        text.push_str(&format!(
            "  {:<width$}  {}\n",
            command.usage().cyan(),
            command.description()
        ));
    }
    text.trim_end().to_string()
}

/// Translates prompt input into queue manager calls.
pub struct CommandExecutor {
    manager: QueueManager,
}

impl CommandExecutor {
    pub fn new(manager: QueueManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &QueueManager {
        &self.manager
    }

    /// Execute one input line. Blank lines yield `None`.
    pub async fn execute(&self, line: &str) -> Option<ExecutionResult> {
        let (name, arg) = split_command(line)?;
        let Some(command) = CommandType::parse(name) else {
            return Some(ExecutionResult::error(format!(
                "Unknown command '{name}'. Type 'help' for a list of commands."
            )));
        };

        debug!(?command, arg, "Executing command");
        Some(self.dispatch(command, arg).await)
    }

    async fn dispatch(&self, command: CommandType, arg: &str) -> ExecutionResult {
        match command {
            CommandType::Help => ExecutionResult::report(help_text()),
            CommandType::Exit => {
                let message = match self.shutdown().await {
                    Some(outcome) => format!(
                        "Stopped run {} ({} pending discarded, {} cancelled). Bye.",
                        outcome.run, outcome.discarded, outcome.in_flight
                    ),
                    None => "Bye.".to_string(),
                };
                ExecutionResult::exit(message)
            }
            CommandType::Clear => {
                print!("\x1B[2J\x1B[1;1H");
                let _ = std::io::stdout().flush();
                ExecutionResult::silent()
            }
            CommandType::Add => self.add(arg),
            CommandType::Remove => match self.manager.dequeue_last() {
                Ok(job) => ExecutionResult::ok(format!(
                    "Removed '{}' ({})",
                    job.destination_name, job.source
                )),
                Err(QueueError::EmptyQueue) => {
                    ExecutionResult::error("There are no pending jobs to remove")
                }
                Err(e) => e.into(),
            },
            CommandType::Output => self.output(arg),
            CommandType::Name => self.name(arg),
            CommandType::Status => ExecutionResult::report(render_snapshot(&self.manager.snapshot())),
            CommandType::Start => self.start(),
            CommandType::Stop => match self.manager.stop() {
                Ok(outcome) => ExecutionResult::ok(format!(
                    "Stopped run {}: {} pending job(s) discarded, {} in-flight job(s) cancelling",
                    outcome.run, outcome.discarded, outcome.in_flight
                )),
                Err(e) => e.into(),
            },
        }
    }

    fn add(&self, arg: &str) -> ExecutionResult {
        if arg.is_empty() {
            return ExecutionResult::error(format!("Usage: {}", CommandType::Add.usage()));
        }
        match self.manager.enqueue(arg) {
            Ok(job) => ExecutionResult::ok(format!(
                "Queued '{}' as '{}'",
                job.source, job.destination_name
            )),
            Err(e) => e.into(),
        }
    }

    fn output(&self, arg: &str) -> ExecutionResult {
        if arg.is_empty() {
            return match self.manager.output_dir() {
                Some(dir) => ExecutionResult::report(format!("Output directory: {}", dir.display())),
                None => ExecutionResult::error(format!(
                    "Output directory is not set. Usage: {}",
                    CommandType::Output.usage()
                )),
            };
        }
        match self.manager.set_output_directory(arg) {
            Ok(()) => ExecutionResult::ok(format!("Output directory set to {arg}")),
            Err(e) => e.into(),
        }
    }

    fn name(&self, arg: &str) -> ExecutionResult {
        if arg.is_empty() {
            return match self.manager.naming_pattern() {
                Some(pattern) => ExecutionResult::report(format!("Naming pattern: {pattern}")),
                None => ExecutionResult::error(format!(
                    "Naming pattern is not set. Usage: {}",
                    CommandType::Name.usage()
                )),
            };
        }
        match self.manager.set_naming_pattern(arg) {
            Ok(pattern) => ExecutionResult::ok(format!("Naming pattern set to '{pattern}'")),
            Err(e) => e.into(),
        }
    }

    fn start(&self) -> ExecutionResult {
        let engine = self.manager.engine();
        if !engine.is_available() {
            return ExecutionResult::error(format!(
                "The {} converter is not available; check that it is installed (see --ffmpeg)",
                engine.name()
            ));
        }

        let pending = self.manager.snapshot().pending.len();
        match self.manager.start() {
            Ok(run) => ExecutionResult::ok(format!(
                "Started run {run}: {pending} job(s) queued, up to {} at a time",
                self.manager.config().max_concurrency
            )),
            Err(e) => e.into(),
        }
    }

    /// Stop the active run, if any, and wait for in-flight jobs to unwind.
    pub async fn shutdown(&self) -> Option<StopOutcome> {
        let outcome = self.manager.stop().ok();
        if let Some(outcome) = &outcome {
            info!(
                run = outcome.run,
                in_flight = outcome.in_flight,
                "Waiting for in-flight jobs to finish"
            );
        }
        self.manager.wait_idle().await;
        outcome
    }
}
