//! Peer directory for the maomao coin shell.
//!
//! [`PeerDirectoryClient`] fetches the node's active peer list and publishes
//! its fetch state; [`view`] turns that state into something drawable.

pub mod accept_stream;
pub mod client;
pub mod config;
pub mod devnode;
pub mod error;
pub mod handlers;
pub mod node_api;
pub mod peers;
pub mod server_loop;
mod shutdown;
pub mod theme;
pub mod types;
pub mod view;

pub use client::{PeerDirectoryClient, Subscription};
pub use config::{ClientConfig, StalePolicy};
pub use error::{ClientError, FetchError};
pub use node_api::{HttpNodeApi, NodeApi};
pub use peers::{PeerEntry, PeerList};
pub use types::FetchState;
