//! The node's read-only peer endpoint.
//!
//! `GET /getActivePeers` answers 200 with a JSON array of peer identifier
//! strings. Anything else (transport failure, non-2xx status, a body that is
//! not an array of strings) is a `FetchError`.

use futures_util::future::{BoxFuture, FutureExt};
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, Uri};
use tracing::{debug, trace};

use crate::config::ClientConfig;
use crate::error::{ClientError, FetchError};
use crate::peers::PeerList;

pub const ACTIVE_PEERS_PATH: &str = "/getActivePeers";

/// Source of peer lists. Each call issues exactly one request.
pub trait NodeApi: Send + Sync + 'static {
    fn active_peers(&self) -> BoxFuture<'static, Result<PeerList, FetchError>>;
}

/// `NodeApi` over plain HTTP/1.
#[derive(Clone, Debug)]
pub struct HttpNodeApi {
    client: Client<HttpConnector, Body>,
    uri: Uri,
}

impl HttpNodeApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            client: Client::new(),
            uri: config.peers_uri()?,
        })
    }
}

impl NodeApi for HttpNodeApi {
    fn active_peers(&self) -> BoxFuture<'static, Result<PeerList, FetchError>> {
        let client = self.client.clone();
        let uri = self.uri.clone();

        async move {
            let req = Request::get(uri.clone())
                .body(Body::empty())
                .map_err(|e| FetchError::Network(e.to_string()))?;

            let resp = client.request(req).await.map_err(|e| {
                debug!("GET {} failed: {}", uri, e);
                FetchError::Network(e.to_string())
            })?;

            let status = resp.status();
            if !status.is_success() {
                debug!("GET {} returned HTTP {}", uri, status);
                return Err(FetchError::Http(status.as_u16()));
            }

            let body = hyper::body::to_bytes(resp.into_body())
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?;
            trace!("GET {} returned {} bytes", uri, body.len());

            parse_peer_list(&body)
        }
        .boxed()
    }
}

/// Decode a response body into a peer list, keeping order and duplicates.
pub fn parse_peer_list(body: &[u8]) -> Result<PeerList, FetchError> {
    serde_json::from_slice::<PeerList>(body).map_err(|e| FetchError::MalformedPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::server::conn::Http;
    use hyper::service::service_fn;
    use hyper::{Response, StatusCode};
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Serve a fixed status and body on a loopback port.
    async fn canned_node(status: StatusCode, body: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let (stream, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => break,
                };
                tokio::spawn(async move {
                    let service = service_fn(move |_req: Request<Body>| async move {
                        let mut resp = Response::new(Body::from(body));
                        *resp.status_mut() = status;
                        Ok::<_, Infallible>(resp)
                    });
                    let _ = Http::new().serve_connection(stream, service).await;
                });
            }
        });
        addr
    }

    fn api_for(addr: SocketAddr) -> HttpNodeApi {
        HttpNodeApi::new(&ClientConfig::new(format!("http://{}", addr))).unwrap()
    }

    #[test]
    fn test_parse_valid_list() {
        let peers = parse_peer_list(br#"["1.2.3.4:9000","5.6.7.8:9000","1.2.3.4:9000"]"#).unwrap();
        let ids: Vec<&str> = peers.iter().map(|p| p.as_str()).collect();
        assert_eq!(ids, vec!["1.2.3.4:9000", "5.6.7.8:9000", "1.2.3.4:9000"]);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_peer_list(b"[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_arrays_and_non_strings() {
        let bodies: [&[u8]; 5] = [br#"{"peers":[]}"#, b"[1,2]", b"[\"a\", null]", b"not json", b""];
        for body in bodies {
            assert!(
                matches!(parse_peer_list(body), Err(FetchError::MalformedPayload(_))),
                "body {:?} should be rejected",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_ok() {
        let addr = canned_node(StatusCode::OK, r#"["1.2.3.4:9000","5.6.7.8:9000"]"#).await;
        let peers = api_for(addr).active_peers().await.unwrap();
        assert_eq!(peers.len(), 2);
        assert_eq!(peers[0].as_str(), "1.2.3.4:9000");
        assert_eq!(peers[1].as_str(), "5.6.7.8:9000");
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let addr = canned_node(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
        let result = api_for(addr).active_peers().await;
        assert_eq!(result, Err(FetchError::Http(500)));
    }

    #[tokio::test]
    async fn test_fetch_malformed_body() {
        let addr = canned_node(StatusCode::OK, r#"{"error": "nope"}"#).await;
        let result = api_for(addr).active_peers().await;
        assert!(matches!(result, Err(FetchError::MalformedPayload(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = api_for(addr).active_peers().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
