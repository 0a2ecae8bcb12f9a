use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use blog_shared::PostId;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod comments;
mod config;
mod content;
mod editor;
mod format;
mod ui;

use api::{ApiClient, TokenStore};
use app::{App, AppEvent};
use config::Config;

fn print_usage() {
    println!("Usage: blog-tui [OPTIONS] [POST_ID]");
    println!();
    println!("Arguments:");
    println!("  [POST_ID]   Post to open (defaults to $BLOG_POST_ID)");
    println!();
    println!("Options:");
    println!("  --help, -h  Show this help message");
    println!();
    println!("Environment:");
    println!("  BLOG_SERVER_URL   API base URL");
    println!("  BLOG_AUTH_TOKEN   auth_token cookie value to sign in with");
    println!("  BLOG_LOG_FILE     Where to write logs");
}

/// stdout belongs to the terminal UI, so logs go to a file.
fn init_tracing(log_file: &Path) -> Result<()> {
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir).context("Could not create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Could not open log file {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "blog_tui=info,blog_shared=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let mut config = Config::from_env()?;

    // Parse CLI arguments
    let args: Vec<String> = std::env::args().collect();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            flag if flag.starts_with('-') => {
                eprintln!("Unknown argument: {}", flag);
                std::process::exit(1);
            }
            post_id => config.post_id = Some(PostId::new(post_id)),
        }
    }

    let Some(post_id) = config.post_id.clone() else {
        eprintln!("Error: no post given. Pass a POST_ID or set BLOG_POST_ID.");
        std::process::exit(1);
    };

    init_tracing(&config.log_file)?;
    tracing::info!(server = %config.server_url, post_id = %post_id, "starting");

    // Create API client
    let mut api = ApiClient::new(&config.server_url);
    match TokenStore::user_default() {
        Ok(store) => api = api.with_store(store),
        Err(e) => tracing::warn!(error = %e, "sign-in will not be remembered"),
    }
    match &config.auth_token {
        Some(token) => api.set_token(token)?,
        None => {
            if let Err(e) = api.load_token() {
                tracing::warn!(error = %e, "ignoring unreadable saved token");
            }
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let app = App::new(api, post_id);
    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "exited with error");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
) -> Result<()> {
    // Create event channel
    let (tx, mut rx) = mpsc::channel::<AppEvent>(100);

    // Spawn input handler
    let tx_input = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = tx_input.send(AppEvent::Key(key)).await;
                    }
                }
            }
            // Send tick events for UI refresh
            let _ = tx_input.send(AppEvent::Tick).await;
        }
    });

    // First draw shows the loading overlay, then the post is fetched
    let tx_load = tx.clone();
    tokio::spawn(async move {
        let _ = tx_load.send(AppEvent::LoadPost).await;
    });

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        if let Some(event) = rx.recv().await {
            match event {
                AppEvent::Key(key) => {
                    if app.handle_key(key).await? {
                        return Ok(());
                    }
                    // Check if terminal needs clearing after external editor
                    if app.needs_terminal_clear {
                        terminal.clear()?;
                        app.needs_terminal_clear = false;
                    }
                }
                AppEvent::Tick => {
                    // Just refresh UI
                }
                AppEvent::LoadPost => {
                    app.load_post().await;
                }
            }
        }
    }
}
