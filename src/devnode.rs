//! Local stand-in for a node, serving the peer list endpoint.
//!
//! Useful for running the shell without a real node and as a loopback
//! target in tests.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio::task;
use tracing::{error, info};

use crate::accept_stream::tcp_accept_stream;
use crate::handlers::{handle_connection, PeerBook};
use crate::peers::PeerList;
use crate::server_loop::serve_stream;
use crate::types::GenericBoxedStream;

pub struct DevNode {
    listener: TcpListener,
    peers: PeerBook,
}

impl DevNode {
    pub async fn bind(addr: &str, peers: PeerList) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            peers: Arc::new(peers),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown_notify` is signalled with `notify_one`.
    pub async fn run(self, shutdown_notify: Arc<Notify>) -> io::Result<()> {
        let addr = self.local_addr()?;
        info!("Dev node listening on http://{} with {} peers", addr, self.peers.len());

        let stream: GenericBoxedStream<io::Result<(TcpStream, SocketAddr)>> =
            Box::pin(tcp_accept_stream(self.listener));
        let peers = self.peers;

        serve_stream(stream, shutdown_notify, move |accepted| {
            let peers = peers.clone();
            task::spawn(async move {
                match accepted {
                    Ok((stream, _addr)) => handle_connection(stream, peers).await,
                    Err(e) => error!("Stream error during connection: {}", e),
                }
            })
        })
        .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PeerDirectoryClient;
    use crate::config::ClientConfig;
    use crate::node_api::{HttpNodeApi, NodeApi};
    use crate::types::FetchState;
    use std::time::Duration;
    use tokio::sync::mpsc;

    async fn spawn_node(peers: &[&str]) -> (SocketAddr, Arc<Notify>, task::JoinHandle<io::Result<()>>) {
        let node = DevNode::bind("127.0.0.1:0", peers.iter().copied().collect())
            .await
            .unwrap();
        let addr = node.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(node.run(shutdown.clone()));
        (addr, shutdown, handle)
    }

    #[tokio::test]
    async fn test_http_api_against_dev_node() {
        let (addr, shutdown, handle) = spawn_node(&["1.2.3.4:9000", "5.6.7.8:9000"]).await;

        let api = HttpNodeApi::new(&ClientConfig::new(format!("http://{}/", addr))).unwrap();
        let peers = api.active_peers().await.unwrap();
        let ids: Vec<&str> = peers.iter().map(|p| p.as_str()).collect();
        assert_eq!(ids, vec!["1.2.3.4:9000", "5.6.7.8:9000"]);

        shutdown.notify_one();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_client_loads_from_dev_node() {
        let (addr, shutdown, _handle) = spawn_node(&["10.2.0.2:5000"]).await;

        let client = PeerDirectoryClient::http(ClientConfig::new(format!("http://{}", addr))).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = client.subscribe(move |state| {
            if state.is_settled() {
                let _ = tx.send(state.clone());
            }
        });
        client.mount();

        let state = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state, FetchState::Loaded(["10.2.0.2:5000"].into_iter().collect()));
        assert_eq!(client.requests_issued(), 1);

        client.teardown();
        shutdown.notify_one();
    }
}
