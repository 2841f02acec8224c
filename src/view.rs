//! Peer list view: a pure function of [`FetchState`].
//!
//! [`PeerListView::from_state`] decides what is shown; [`PeerListWidget`]
//! draws it inside the "Online Peers" container. Neither touches the client
//! or the network.

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::peers::PeerEntry;
use crate::theme::Theme;
use crate::types::FetchState;

pub const PEERS_TITLE: &str = "Online Peers";
pub const REFRESH_CONTROL: &str = "[r] Refresh";
pub const LOADING_TEXT: &str = "Loading...";
pub const NO_PEERS_TEXT: &str = "No peers online";

/// What the peer section shows for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerListView<'a> {
    /// `Idle` or `Loading`; no refresh control.
    Loading,
    /// Loaded, but the node knows no peers.
    NoPeers,
    /// One row per peer, in the order received.
    Peers(&'a [PeerEntry]),
    /// The last fetch failed. `stale` is the retained previous list, if any.
    Error {
        message: String,
        stale: Option<&'a [PeerEntry]>,
    },
}

impl<'a> PeerListView<'a> {
    pub fn from_state(state: &'a FetchState) -> Self {
        match state {
            FetchState::Idle | FetchState::Loading => PeerListView::Loading,
            FetchState::Loaded(peers) if peers.is_empty() => PeerListView::NoPeers,
            FetchState::Loaded(peers) => PeerListView::Peers(peers),
            FetchState::Failed { error, previous } => PeerListView::Error {
                message: error.to_string(),
                stale: previous.as_deref(),
            },
        }
    }

    pub fn refresh_enabled(&self) -> bool {
        !matches!(self, PeerListView::Loading)
    }

    /// Peer rows on screen, current or stale.
    pub fn rows(&self) -> &'a [PeerEntry] {
        match self {
            PeerListView::Peers(peers) => *peers,
            PeerListView::Error {
                stale: Some(peers), ..
            } => *peers,
            _ => &[],
        }
    }

    fn lines(&self, theme: &Theme) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        if self.refresh_enabled() {
            lines.push(Line::styled(REFRESH_CONTROL, theme.primary_style()));
            lines.push(Line::from(""));
        }

        match self {
            PeerListView::Loading => {
                lines.push(Line::styled(LOADING_TEXT, theme.muted_style()));
            }
            PeerListView::NoPeers => {
                lines.push(Line::styled(NO_PEERS_TEXT, theme.muted_style()));
            }
            PeerListView::Peers(peers) => {
                lines.extend(
                    peers
                        .iter()
                        .map(|peer| Line::styled(peer.as_str(), theme.text_style())),
                );
            }
            PeerListView::Error { message, stale } => {
                lines.push(Line::styled(format!("Error: {}", message), theme.error_style()));
                if let Some(peers) = stale {
                    lines.push(Line::from(""));
                    lines.push(Line::styled("Last known peers (stale):", theme.warning_style()));
                    lines.extend(
                        peers
                            .iter()
                            .map(|peer| Line::styled(peer.as_str(), theme.muted_style())),
                    );
                }
            }
        }

        lines
    }
}

/// Draws a [`PeerListView`] in a bordered, titled block.
pub struct PeerListWidget<'a> {
    view: PeerListView<'a>,
    theme: &'a Theme,
    updated_at: Option<DateTime<Utc>>,
}

impl<'a> PeerListWidget<'a> {
    pub fn new(state: &'a FetchState, theme: &'a Theme) -> Self {
        Self {
            view: PeerListView::from_state(state),
            theme,
            updated_at: None,
        }
    }

    /// Show when the list was last fetched successfully.
    pub fn updated_at(mut self, updated_at: Option<DateTime<Utc>>) -> Self {
        self.updated_at = updated_at;
        self
    }
}

impl Widget for PeerListWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match &self.view {
            PeerListView::Peers(peers) => format!(" {} ({}) ", PEERS_TITLE, peers.len()),
            _ => format!(" {} ", PEERS_TITLE),
        };

        let mut lines = self.view.lines(self.theme);
        if let Some(at) = self.updated_at {
            lines.push(Line::from(""));
            lines.push(Line::styled(
                format!("updated {}", at.format("%H:%M:%S UTC")),
                self.theme.muted_style(),
            ));
        }

        let block = Block::default()
            .title(Span::styled(title, self.theme.primary_style()))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style());

        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}
