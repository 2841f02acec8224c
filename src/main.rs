//! MaomaoCoin terminal shell.
//!
//! Usage:
//!   maomao-gui                                  # interactive shell against http://127.0.0.1:5000
//!   maomao-gui --node http://10.2.0.2:5000 list # print the node's active peers once
//!   maomao-gui dev-node --peer 1.2.3.4:9000     # serve a fixed peer list locally

mod app;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maomao_gui::config::{DEFAULT_NODE_URL, DEFAULT_TIMEOUT};
use maomao_gui::devnode::DevNode;
use maomao_gui::{ClientConfig, PeerDirectoryClient, PeerList, StalePolicy};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::{signal, sync::mpsc, sync::Notify};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the node serving /getActivePeers
    #[arg(long, global = true, default_value = DEFAULT_NODE_URL)]
    node: String,

    /// Give up on a peer list request after this many seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Keep showing the last peer list when a refresh fails
    #[arg(long, global = true)]
    retain_on_failure: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Append logs to this file (the interactive shell logs nowhere otherwise)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive peer viewer (default)
    Tui,

    /// Fetch the active peers once and print one per line
    List,

    /// Serve a fixed peer list on /getActivePeers, /nodes, /ping and /health
    DevNode {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value = "5000")]
        port: u16,

        /// Peer identifier to report; repeat for more, order is kept
        #[arg(long = "peer")]
        peers: Vec<String>,
    },
}

impl Args {
    fn client_config(&self) -> ClientConfig {
        let stale_policy = if self.retain_on_failure {
            StalePolicy::Retain
        } else {
            StalePolicy::Discard
        };
        ClientConfig::new(self.node.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_stale_policy(stale_policy)
    }
}

fn init_tracing(args: &Args, interactive: bool) -> Result<()> {
    let default_filter = match (args.debug, interactive) {
        (true, _) => "debug",
        (false, true) => "warn",
        (false, false) => "info",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match &args.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        // stderr would draw over the alternate screen
        None if interactive => builder.with_writer(std::io::sink).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.clone().unwrap_or(Command::Tui);
    init_tracing(&args, matches!(command, Command::Tui))?;

    match command {
        Command::Tui => {
            let config = args.client_config();
            config.validate()?;
            info!("Starting shell against {}", config.base_url);
            app::run(config).await
        }
        Command::List => {
            if !list_peers(args.client_config()).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::DevNode { host, port, peers } => run_dev_node(&host, port, peers).await,
    }
}

/// One fetch cycle; prints the peers and reports whether it succeeded.
async fn list_peers(config: ClientConfig) -> Result<bool> {
    let client = PeerDirectoryClient::http(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = client.subscribe(move |state| {
        if state.is_settled() {
            let _ = tx.send(state.clone());
        }
    });

    client.mount();
    let state = rx
        .recv()
        .await
        .context("peer directory closed before the fetch completed")?;
    subscription.unsubscribe();
    client.teardown();

    if let Some(error) = state.error() {
        error!("Failed to fetch active peers: {}", error);
        eprintln!("error: {}", error);
        return Ok(false);
    }

    match state.peers() {
        Some(peers) if peers.is_empty() => {
            eprintln!("No peers online");
            Ok(true)
        }
        Some(peers) => {
            for peer in peers.iter() {
                println!("{}", peer);
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn run_dev_node(host: &str, port: u16, peers: Vec<String>) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let node = DevNode::bind(&addr, peers.into_iter().collect::<PeerList>())
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let shutdown_notify = Arc::new(Notify::new());
    tokio::spawn({
        let interrupt_handle = shutdown_notify.clone();
        async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            interrupt_handle.notify_one();
        }
    });

    node.run(shutdown_notify).await?;
    info!("Dev node stopped");
    Ok(())
}
