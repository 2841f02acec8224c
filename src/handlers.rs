//! Routes served by the dev node.

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpStream;
use tracing::{debug, error};

use crate::node_api::ACTIVE_PEERS_PATH;
use crate::peers::PeerList;

/// Peers the dev node reports, shared by every connection.
pub type PeerBook = Arc<PeerList>;

#[derive(Serialize)]
struct Health {
    version: &'static str,
    build: &'static str,
}

pub async fn handle_connection(stream: TcpStream, peers: PeerBook) {
    let service = service_fn(move |req| {
        let peers = peers.clone();
        async move { route_request(req, peers).await }
    });

    if let Err(e) = Http::new().serve_connection(stream, service).await {
        error!("HTTP connection error: {}", e);
    }
}

pub async fn route_request(
    req: Request<Body>,
    peers: PeerBook,
) -> Result<Response<Body>, hyper::Error> {
    debug!("{} {}", req.method(), req.uri().path());

    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, ACTIVE_PEERS_PATH) | (&Method::GET, "/nodes") => {
            match serde_json::to_string(&*peers) {
                Ok(json) => json_response(StatusCode::OK, json),
                Err(e) => {
                    error!("Failed to encode peer list: {}", e);
                    json_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        r#"{"error": "encoding failed"}"#.to_string(),
                    )
                }
            }
        }

        (&Method::GET, "/ping") => Response::new(Body::from("pong")),

        (&Method::GET, "/health") => {
            let health = Health {
                version: env!("CARGO_PKG_VERSION"),
                build: option_env!("GIT_COMMIT_HASH").unwrap_or("unknown"),
            };
            match serde_json::to_string(&health) {
                Ok(json) => json_response(StatusCode::OK, json),
                Err(_) => json_response(StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()),
            }
        }

        _ => json_response(StatusCode::NOT_FOUND, r#"{"error": "not found"}"#.to_string()),
    };

    Ok(response)
}

fn json_response(status: StatusCode, json: String) -> Response<Body> {
    let mut response = Response::new(Body::from(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(ids: &[&str]) -> PeerBook {
        Arc::new(ids.iter().copied().collect())
    }

    async fn get(path: &str, peers: PeerBook) -> (StatusCode, String) {
        let req = Request::get(path).body(Body::empty()).unwrap();
        let resp = route_request(req, peers).await.unwrap();
        let status = resp.status();
        let body = hyper::body::to_bytes(resp.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_active_peers_in_configured_order() {
        let (status, body) = get("/getActivePeers", book(&["b:2", "a:1", "b:2"])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"["b:2","a:1","b:2"]"#);
    }

    #[tokio::test]
    async fn test_nodes_alias_and_empty_book() {
        let (status, body) = get("/nodes", book(&[])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_ping() {
        assert_eq!(get("/ping", book(&[])).await, (StatusCode::OK, "pong".to_string()));
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let (status, body) = get("/health", book(&[])).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, _) = get("/mine", book(&[])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
