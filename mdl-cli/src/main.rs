mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod output;
mod repl;

use std::process;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use mdl_queue::{ConversionEngine, FfmpegEngine, QueueManager};
use tracing::{error, info, warn};

use crate::{
    cli::Args,
    commands::CommandExecutor,
    config::{AppConfig, Settings},
    error::Result,
    logging::init_logging,
};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => {
            error!("Application error: {}", e);
            eprintln!("{} {}", "Error:".red().bold(), e);
            1
        }
    };

    // the stdin reader thread may still be blocked in a read; don't wait for it
    process::exit(code);
}

async fn run(args: Args) -> Result<()> {
    let file_config = AppConfig::load(args.config.as_deref())?;
    let settings = Settings::resolve(&args, file_config);
    let _log_guard = init_logging(&settings.log_dir, args.verbose)?;
    info!(?settings, "Starting mdl");

    let engine = FfmpegEngine::with_config(settings.engine.clone());
    match engine.version() {
        Some(version) => info!(%version, "ffmpeg detected"),
        None => warn!(
            binary = %settings.engine.binary_path,
            "ffmpeg not found, conversions cannot start until it is available"
        ),
    }

    let manager = QueueManager::new(settings.queue.clone(), Arc::new(engine))?;
    if let Some(dir) = &settings.output_dir {
        manager.set_output_directory(dir)?;
    }
    if let Some(pattern) = &settings.naming_pattern {
        manager.set_naming_pattern(pattern)?;
    }

    println!(
        "{} {} - type {} for a list of commands",
        "mdl".bold(),
        env!("CARGO_PKG_VERSION"),
        "help".cyan()
    );

    repl::run_repl(CommandExecutor::new(manager)).await?;
    info!("mdl exited");
    Ok(())
}
