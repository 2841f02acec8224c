use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::shutdown::select_or_shutdown;
use crate::types::GenericBoxedStream;

/// Hand every item of `stream` to `handler` until the stream ends or
/// shutdown is signalled. Returns the number of items handled.
pub async fn serve_stream<T>(
    mut stream: GenericBoxedStream<T>,
    shutdown_notify: Arc<Notify>,
    handler: impl Fn(T) -> JoinHandle<()> + Send + Sync + 'static,
) -> usize {
    let mut handled = 0;
    let stopped_by = loop {
        match select_or_shutdown(stream.next(), shutdown_notify.clone()).await {
            Ok(Some(item)) => {
                handler(item);
                handled += 1;
            }
            Ok(None) => break "end of stream",
            Err(()) => break "shutdown",
        }
    };

    info!("Stopped serving on {} after {} connections", stopped_by, handled);
    handled
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_serves_until_stream_ends() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let items: GenericBoxedStream<u8> = Box::pin(stream::iter(vec![1u8, 2, 3]));

        let handled = serve_stream(items, Arc::new(Notify::new()), move |item| {
            counter.fetch_add(item as usize, Ordering::SeqCst);
            tokio::spawn(async {})
        })
        .await;

        assert_eq!(handled, 3);
        assert_eq!(seen.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_stream() {
        let notify = Arc::new(Notify::new());
        notify.notify_one();
        let items: GenericBoxedStream<u8> = Box::pin(stream::pending());

        let handled = serve_stream(items, notify, |_| tokio::spawn(async {})).await;
        assert_eq!(handled, 0);
    }
}
