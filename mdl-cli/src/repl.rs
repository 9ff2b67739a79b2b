//! Interactive prompt loop.

use std::io::Write;

use colored::Colorize;
use mdl_queue::QueueEvent;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use crate::commands::CommandExecutor;
use crate::error::Result;
use crate::output::{render_job_notice, render_result};

pub const PROMPT: &str = "mdl> ";

fn print_prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

/// Read commands from stdin until `exit`, end of input or Ctrl+C.
///
/// Job completions are announced between prompts.
pub async fn run_repl(executor: CommandExecutor) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut events = executor.manager().subscribe();

    print_prompt();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!();
                    info!("Input closed, shutting down");
                    executor.shutdown().await;
                    break;
                };
                if let Some(result) = executor.execute(&line).await {
                    let rendered = render_result(&result);
                    if !rendered.is_empty() {
                        println!("{rendered}");
                    }
                    if result.should_exit {
                        break;
                    }
                }
                print_prompt();
            }
            event = events.recv() => match event {
                Ok(QueueEvent::JobFinished { job, .. }) => {
                    println!("\n{}", render_job_notice(&job));
                    print_prompt();
                }
                Ok(QueueEvent::RunDrained { run }) => {
                    println!("\n{}", format!("Run {run} finished, the queue is empty").green());
                    print_prompt();
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Event listener lagged"),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("Interrupted, shutting down");
                if let Some(outcome) = executor.shutdown().await {
                    println!(
                        "Stopped run {} ({} pending discarded, {} cancelled)",
                        outcome.run, outcome.discarded, outcome.in_flight
                    );
                }
                break;
            }
        }
    }

    Ok(())
}
