//! Dedicated OS threads for blocking transport work.
//!
//! Every connection attempt and every host's command list gets its own
//! thread instead of a slot in the runtime's bounded blocking pool, so a
//! long-running command on one host never delays another host's attempts.

use std::io;
use std::thread;
use thiserror::Error;
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("could not start worker thread")]
    Spawn(#[source] io::Error),

    /// The thread ended without a result, e.g. it panicked.
    #[error("worker thread exited without a result")]
    Lost,
}

/// Runs `job` on a fresh thread and waits for its result.
pub(crate) async fn run<F, R>(name: &str, job: F) -> Result<R, WorkerError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (sender, receiver) = oneshot::channel();

    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // Receiver gone means the caller stopped waiting.
            let _ = sender.send(job());
        })
        .map_err(WorkerError::Spawn)?;

    receiver.await.map_err(|_| WorkerError::Lost)
}
