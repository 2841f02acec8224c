use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;

/// Await a future or a shutdown signal.
///
/// - Returns `Ok(output)` when the future completes first
/// - Returns `Err(())` on shutdown; the future is dropped unfinished
///
/// Signal with `Notify::notify_one` so a shutdown raised before this is
/// polled is still observed.
pub(crate) async fn select_or_shutdown<F: Future>(
    fut: F,
    shutdown_notify: Arc<Notify>,
) -> Result<F::Output, ()> {
    tokio::select! {
        output = fut => Ok(output),
        _ = shutdown_notify.notified() => Err(()),
    }
}
