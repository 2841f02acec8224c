//! Terminal shell around the peer directory.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use maomao_gui::theme::Theme;
use maomao_gui::view::{PeerListView, PeerListWidget};
use maomao_gui::{ClientConfig, FetchState, PeerDirectoryClient, Subscription};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

const HEADLINE: &str = "Hello, this is your MaomaoCoin GUI";

/// Application state.
pub struct App {
    theme: Theme,
    should_quit: bool,
    client: PeerDirectoryClient,
    subscription: Subscription,
    state_rx: mpsc::UnboundedReceiver<FetchState>,
    // Last state published by the client
    state: FetchState,
}

impl App {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = PeerDirectoryClient::http(config)?;
        let (tx, state_rx) = mpsc::unbounded_channel();
        let subscription = client.subscribe(move |state| {
            let _ = tx.send(state.clone());
        });
        let state = client.current_state();

        Ok(Self {
            theme: Theme::default(),
            should_quit: false,
            client,
            subscription,
            state_rx,
            state,
        })
    }

    fn process_events(&mut self) {
        while let Ok(state) = self.state_rx.try_recv() {
            self.state = state;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') | KeyCode::F(5) => {
                if PeerListView::from_state(&self.state).refresh_enabled() {
                    self.client.refresh();
                }
            }
            _ => {}
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Headline
                Constraint::Length(3), // Wallet
                Constraint::Min(6),    // Peers
                Constraint::Length(2), // Help
            ])
            .split(frame.area());

        let headline = Paragraph::new(Line::from(Span::styled(HEADLINE, self.theme.primary_style())));
        frame.render_widget(headline, chunks[0]);

        self.render_wallet(frame, chunks[1]);

        let peers = PeerListWidget::new(&self.state, &self.theme).updated_at(self.client.last_updated());
        frame.render_widget(peers, chunks[2]);

        self.render_help(frame, chunks[3]);
    }

    fn render_wallet(&self, frame: &mut Frame, area: Rect) {
        // Balance is a placeholder until the node exposes wallet routes
        let wallet = Paragraph::new(Span::styled("balance: 1", self.theme.text_style())).block(
            Block::default()
                .title(Span::styled(" Wallet ", self.theme.primary_style()))
                .borders(Borders::ALL)
                .border_style(self.theme.border_style()),
        );
        frame.render_widget(wallet, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let mut help_text = format!("q: Quit | r: Refresh | node: {}", self.client.config().base_url);
        if self.state.is_loading() {
            help_text.push_str(" | fetching...");
        }

        let help = Paragraph::new(help_text).style(self.theme.muted_style()).block(
            Block::default()
                .borders(Borders::TOP)
                .border_style(self.theme.border_style()),
        );

        frame.render_widget(help, area);
    }

    fn shutdown(&self) {
        self.subscription.unsubscribe();
        self.client.teardown();
    }
}

/// Run the shell until the user quits.
pub async fn run(config: ClientConfig) -> Result<()> {
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.client.mount();

    let result = event_loop(&mut terminal, &mut app);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.process_events();

        terminal.draw(|f| app.render(f))?;

        // Poll with a timeout so client transitions are picked up promptly
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
