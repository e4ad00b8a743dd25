//! Main application logic and TUI event loop.

use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    widgets::TableState,
    Terminal,
};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tokio::sync::oneshot::{self, error::TryRecvError};
use tracing::{debug, error, info};

use crate::cli::AppConfig;
use crate::clock::Clock;
use crate::data::{ClientConfig, GithubClient, LoadError, Repository};
use crate::rows::{render_rows, ListView, RowFormat};
use crate::sequencer::{Input, Sequencer};
use crate::ui::{
    widgets::{row_at, Header, PreviewPanel, ProjectTable, StatusBar},
    HelpOverlay, Theme,
};

/// Redraw cadence; animations are sampled at this rate
const FRAME: Duration = Duration::from_millis(33);

type LoadResult = Result<Vec<Repository>, LoadError>;

/// Application state
pub struct App {
    // Configuration
    config: AppConfig,
    theme: Theme,

    // Background work
    runtime: Runtime,
    client: GithubClient,
    load_task: Option<JoinHandle<()>>,
    pending_load: Option<oneshot::Receiver<LoadResult>>,
    pending_preview_check: Option<oneshot::Receiver<Vec<(String, bool)>>>,

    // Data
    row_format: RowFormat,
    view: ListView,
    previews: HashMap<String, bool>,

    // Animation
    sequencer: Option<Sequencer>,
    clock: Clock,

    // UI State
    table_state: TableState,
    table_area: Rect,
    /// Row currently under the pointer or keyboard cursor
    hovered: Option<usize>,
    pointer_in_list: bool,
    show_help: bool,

    // Exit flag
    should_quit: bool,

    // Error message to display (non-fatal)
    error_message: Option<String>,
}

impl App {
    /// Create a new App instance and start loading repositories
    pub fn new(config: AppConfig, clock: Clock) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;

        let client = GithubClient::new(ClientConfig {
            api_url: config.api_url.clone(),
            username: config.username.clone(),
            count: config.count,
            token: config.token.clone(),
        })
        .context("Failed to create GitHub client")?;

        let row_format = RowFormat {
            raw_url: config.raw_url.clone(),
            zone: clock.zone(),
        };

        let mut app = App {
            config,
            theme: Theme::default(),
            runtime,
            client,
            load_task: None,
            pending_load: None,
            pending_preview_check: None,
            row_format,
            view: ListView::Loading,
            previews: HashMap::new(),
            sequencer: None,
            clock,
            table_state: TableState::default(),
            table_area: Rect::default(),
            hovered: None,
            pointer_in_list: false,
            show_help: false,
            should_quit: false,
            error_message: None,
        };

        app.start_load();
        Ok(app)
    }

    /// Kick off a load in the background; the list shows a loading row meanwhile
    fn start_load(&mut self) {
        self.view = ListView::Loading;
        self.sequencer = None;
        self.previews.clear();
        self.pending_preview_check = None;
        self.hovered = None;
        self.table_state = TableState::default();

        if let Some(task) = self.load_task.take() {
            debug!("Aborting superseded load");
            task.abort();
        }

        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        let task = self.runtime.spawn(async move {
            // Receiver gone means the app quit
            let _ = tx.send(client.load().await);
        });
        self.load_task = Some(task);
        self.pending_load = Some(rx);
        info!(user = %self.config.username, count = self.config.count, "Loading repositories");
    }

    fn finish_load(&mut self, result: LoadResult, now: Instant) {
        match result {
            Ok(repos) => {
                self.view = render_rows(&repos, &self.row_format);
                self.sequencer = Sequencer::attach(self.view.rows(), now);
                info!(rows = self.view.rows().len(), "Rendering complete");

                if let Some(targets) = self.sequencer.as_ref().map(Sequencer::preview_targets) {
                    self.start_preview_check(targets);
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to load projects");
                self.view = ListView::failed(&e);
            }
        }
    }

    /// Warm up preview references so the first hover already knows them
    fn start_preview_check(&mut self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let _ = tx.send(client.check_previews(urls).await);
        });
        self.pending_preview_check = Some(rx);
    }

    /// Collect finished background work
    fn poll_background(&mut self, now: Instant) {
        let load = match self.pending_load.as_mut() {
            Some(rx) => rx.try_recv(),
            None => Err(TryRecvError::Empty),
        };
        match load {
            Ok(result) => {
                self.pending_load = None;
                self.load_task = None;
                self.finish_load(result, now);
            }
            Err(TryRecvError::Closed) => {
                self.pending_load = None;
                self.load_task = None;
                self.view = ListView::failed(&"loader stopped unexpectedly");
            }
            Err(TryRecvError::Empty) => {}
        }

        let checked = match self.pending_preview_check.as_mut() {
            Some(rx) => rx.try_recv(),
            None => Err(TryRecvError::Empty),
        };
        match checked {
            Ok(results) => {
                self.pending_preview_check = None;
                let resolved = results.iter().filter(|(_, ok)| *ok).count();
                debug!(resolved, total = results.len(), "Preview warm-up finished");
                self.previews.extend(results);
            }
            Err(TryRecvError::Closed) => self.pending_preview_check = None,
            Err(TryRecvError::Empty) => {}
        }
    }

    /// Advance timers, the clock and background work
    fn tick(&mut self, now: Instant) {
        self.clock.tick(now, Utc::now());
        if let Some(seq) = self.sequencer.as_mut() {
            seq.advance(now);
        }
        self.poll_background(now);
    }

    /// Forward an input to the sequencer, if one is attached
    fn send(&mut self, input: Input, now: Instant) {
        if let Some(seq) = self.sequencer.as_mut() {
            seq.handle(input, now);
        }
    }

    /// Move the hover to `target`, emitting leave/enter as needed
    fn hover(&mut self, target: Option<usize>, now: Instant) {
        if target == self.hovered {
            return;
        }
        if let Some(prev) = self.hovered {
            self.send(Input::HoverLeave(prev), now);
        }
        if let Some(next) = target {
            self.send(Input::HoverEnter(next), now);
        }
        self.hovered = target;
    }

    fn leave_list(&mut self, now: Instant) {
        self.hover(None, now);
        self.send(Input::LeaveContainer, now);
    }

    fn row_count(&self) -> usize {
        self.view.rows().len()
    }

    /// Open the hovered row's link in the browser
    fn open_hovered(&mut self) {
        let Some(row) = self.hovered.and_then(|idx| self.view.rows().get(idx)) else {
            return;
        };
        let link = row.link.clone();
        info!(%link, "Opening project link");
        if let Err(e) = open::that_detached(&link) {
            error!(%link, error = %e, "Failed to open link");
            self.set_error(format!("Could not open {link}: {e}"));
        }
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode, now: Instant) {
        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return;
            }
            KeyCode::Char('r') => {
                self.error_message = None;
                self.start_load();
                return;
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return;
        }

        let count = self.row_count();
        match key {
            KeyCode::Down | KeyCode::Char('j') if count > 0 => {
                let next = self.hovered.map_or(0, |idx| (idx + 1) % count);
                self.hover(Some(next), now);
            }
            KeyCode::Up | KeyCode::Char('k') if count > 0 => {
                let prev = self
                    .hovered
                    .map_or(count - 1, |idx| idx.checked_sub(1).unwrap_or(count - 1));
                self.hover(Some(prev), now);
            }
            KeyCode::Enter => self.open_hovered(),
            KeyCode::Esc => self.leave_list(now),
            _ => {}
        }
    }

    /// Handle mouse movement and clicks over the project table
    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if self.show_help {
            return;
        }

        let inside = self
            .table_area
            .contains(Position::new(mouse.column, mouse.row));
        let target = row_at(
            self.table_area,
            self.table_state.offset(),
            self.row_count(),
            mouse.column,
            mouse.row,
        );

        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                if inside {
                    self.hover(target, now);
                } else if self.pointer_in_list {
                    self.leave_list(now);
                }
                self.pointer_in_list = inside;
            }
            MouseEventKind::Down(MouseButton::Left) if target.is_some() => {
                self.hover(target, now);
                self.open_hovered();
            }
            _ => {}
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut ratatui::Frame, now: Instant) {
        let size = frame.area();

        // Main layout: header, body, footer
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header with clock
                Constraint::Min(5),    // Body
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        // Body layout: table (left) and preview (right)
        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(main_chunks[1]);

        let header = Header::new(&self.config.username, self.clock.reading(), &self.theme);
        header.render(frame, main_chunks[0]);

        self.table_area = body_chunks[0];
        let table = ProjectTable::new(&self.view, self.sequencer.as_ref(), now, &self.theme);
        table.render(frame, body_chunks[0], &mut self.table_state);

        let backdrop = self.sequencer.as_ref().map(Sequencer::backdrop);
        let link = self
            .sequencer
            .as_ref()
            .and_then(Sequencer::active)
            .and_then(|idx| self.view.rows().get(idx))
            .map(|row| row.link.as_str());
        let resolved = backdrop
            .and_then(|b| b.image.as_ref())
            .and_then(|image| self.previews.get(image).copied());
        let preview = PreviewPanel::new(backdrop, link, resolved, now, &self.theme);
        preview.render(frame, body_chunks[1]);

        let summary = match &self.view {
            ListView::Rows(rows) => Some(format!(
                "{} | {} repositories",
                self.config.username,
                rows.len()
            )),
            ListView::Loading => Some(format!("{} | loading", self.config.username)),
            _ => Some(self.config.username.clone()),
        };
        let status_bar = StatusBar::new(summary, self.error_message.as_deref(), &self.theme);
        status_bar.render(frame, main_chunks[2]);

        // Render help overlay if active
        if self.show_help {
            let help = HelpOverlay::new(&self.theme);
            help.render(frame, size);
        }
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    // Fail before touching the terminal if the clock cannot be built
    let clock = Clock::new(&config.time_zone, config.clock_interval)
        .with_context(|| format!("Invalid --time-zone '{}'", config.time_zone))?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    // Create app - if this fails, restore terminal first
    let mut app = match App::new(config, clock) {
        Ok(a) => a,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to initialize application");
        }
    };

    // Main loop - wrap in a closure to ensure cleanup
    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    // A hung request must not hold up exit
    let App { runtime, .. } = app;
    runtime.shutdown_background();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        let now = Instant::now();
        app.tick(now);

        // Render - if this fails, we should exit
        terminal.draw(|f| app.render(f, now))?;

        // Handle input with timeout
        if event::poll(FRAME)? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.handle_input(key.code, now);
                }
                Event::Mouse(mouse) => app.handle_mouse(mouse, now),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::Row;

    fn test_config(api_url: &str) -> AppConfig {
        AppConfig {
            username: "likahang".to_string(),
            count: 20,
            time_zone: "Asia/Taipei".to_string(),
            clock_interval: Duration::from_secs(1),
            token: None,
            api_url: api_url.to_string(),
            raw_url: "http://127.0.0.1:9".to_string(),
            log_file: std::env::temp_dir().join("folio-tui-test.log"),
        }
    }

    fn test_app(rows: usize) -> App {
        // Nothing listens here; the background load fails fast and is ignored
        let config = test_config("http://127.0.0.1:9");
        let clock = Clock::new(&config.time_zone, config.clock_interval).unwrap();
        let mut app = App::new(config, clock).unwrap();
        // Drop the in-flight load and install rows directly
        app.pending_load = None;

        let rows: Vec<Row> = (0..rows)
            .map(|i| Row {
                cells: [
                    format!("{:02}", i + 1),
                    format!("Project {i}"),
                    "Rust".to_string(),
                    "Public".to_string(),
                    "N/A".to_string(),
                    "2024/03/07".to_string(),
                ],
                link: format!("https://github.com/likahang/p{i}"),
                preview: None,
            })
            .collect();
        let now = Instant::now();
        app.sequencer = Sequencer::attach(&rows, now);
        app.view = if rows.is_empty() {
            ListView::Empty
        } else {
            ListView::Rows(rows)
        };
        app
    }

    #[test]
    fn test_keyboard_hover_wraps() {
        let mut app = test_app(3);
        let now = Instant::now();

        app.handle_input(KeyCode::Char('k'), now);
        assert_eq!(app.hovered, Some(2));
        app.handle_input(KeyCode::Char('j'), now);
        assert_eq!(app.hovered, Some(0));
        assert_eq!(app.sequencer.as_ref().and_then(Sequencer::active), Some(0));
    }

    #[test]
    fn test_escape_leaves_list() {
        let mut app = test_app(3);
        let now = Instant::now();

        app.handle_input(KeyCode::Down, now);
        app.handle_input(KeyCode::Esc, now);
        assert_eq!(app.hovered, None);
        assert_eq!(app.sequencer.as_ref().and_then(Sequencer::active), None);
    }

    #[test]
    fn test_navigation_on_empty_list_is_noop() {
        let mut app = test_app(0);
        let now = Instant::now();

        assert!(app.sequencer.is_none());
        app.handle_input(KeyCode::Down, now);
        assert_eq!(app.hovered, None);
    }

    #[test]
    fn test_failed_load_shows_single_error() {
        let mut app = test_app(0);
        app.finish_load(
            Err(LoadError::Status {
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                body: String::new(),
            }),
            Instant::now(),
        );
        assert!(app.view.rows().is_empty());
        assert!(app.sequencer.is_none());
        assert_eq!(
            app.view.message(),
            Some("Failed to load projects: GitHub API request failed: 500 Internal Server Error")
        );
    }

    #[test]
    fn test_reload_aborts_previous_load() {
        // Accepts connections but never answers, so a load stays in flight
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let api_url = format!("http://{}", listener.local_addr().unwrap());
        let config = test_config(&api_url);
        let clock = Clock::new(&config.time_zone, config.clock_interval).unwrap();
        let mut app = App::new(config, clock).unwrap();

        let first = app.load_task.as_ref().unwrap().abort_handle();
        app.handle_input(KeyCode::Char('r'), Instant::now());

        let deadline = Instant::now() + Duration::from_secs(2);
        while !first.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(first.is_finished());
        assert!(!app.load_task.as_ref().unwrap().is_finished());
        assert_eq!(app.view, ListView::Loading);
    }

    #[test]
    fn test_quit_key() {
        let mut app = test_app(1);
        app.handle_input(KeyCode::Char('q'), Instant::now());
        assert!(app.should_quit);
    }
}
