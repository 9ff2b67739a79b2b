//! Child process supervision with cancellation.

use std::process::ExitStatus;

use tokio::process::Child;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How a supervised child process ended.
#[derive(Debug)]
pub enum ProcessExit {
    /// The process exited by itself.
    Exited(ExitStatus),
    /// The token fired and the process was killed.
    Killed,
    /// Waiting on the process failed.
    WaitFailed(std::io::Error),
}

/// Wait for `child` on a separate task, killing it if `cancellation_token` fires first.
///
/// The returned receiver yields exactly one [`ProcessExit`].
pub fn spawn_process_waiter(
    mut child: Child,
    cancellation_token: CancellationToken,
) -> oneshot::Receiver<ProcessExit> {
    let (tx, rx) = oneshot::channel();
    let pid = child.id();

    tokio::spawn(async move {
        let exit = tokio::select! {
            _ = cancellation_token.cancelled() => {
                debug!(?pid, "Cancellation requested, killing converter process");
                if let Err(e) = child.kill().await {
                    warn!(?pid, error = %e, "Failed to kill converter process");
                }
                ProcessExit::Killed
            }
            status = child.wait() => match status {
                Ok(status) => {
                    if !status.success() {
                        debug!(?pid, code = ?status.code(), "Converter process exited unsuccessfully");
                    }
                    ProcessExit::Exited(status)
                }
                Err(e) => ProcessExit::WaitFailed(e),
            },
        };
        let _ = tx.send(exit);
    });

    rx
}
