use std::io;
use std::net::SocketAddr;

use async_stream::stream;
use futures_util::Stream;
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, trace};

/// Accepted connections as a stream; accept errors are logged and skipped.
pub fn tcp_accept_stream(
    listener: TcpListener,
) -> impl Stream<Item = Result<(TcpStream, SocketAddr), io::Error>> {
    stream! {
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    trace!("Accepted connection from {}", addr);
                    if let Err(e) = stream.set_nodelay(true) {
                        error!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                    }
                    yield Ok((stream, addr));
                }
                Err(e) => {
                    error!("TCP accept error: {}", e);
                    continue;
                }
            }
        }
    }
}
