//! Neurotype TUI - a terminal client for the Neurotype mood journal.
//!
//! Write notes, see the emotions detected in them, and chat with the
//! assistant from a keyboard-driven interface.

mod app;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use neurotype_core::api::{login_error_message, user_message};
use neurotype_core::config::{Config, APP_NAME};
use neurotype_core::export::export_notes;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "neurotype.log";

/// Command line options. Anything not given here comes from the config file
/// and `NEUROTYPE_*` environment variables.
#[derive(Parser, Debug)]
#[command(name = "neurotype", version, about = "Terminal client for the Neurotype mood journal")]
struct Cli {
    /// Log in before starting (prompts for the password)
    #[arg(long, value_name = "EMAIL")]
    login: Option<String>,

    /// Sign in with a Google ID token
    #[arg(
        long,
        value_name = "TOKEN",
        env = "NEUROTYPE_GOOGLE_ID_TOKEN",
        hide_env_values = true
    )]
    google_id_token: Option<String>,

    /// Download notes as CSV to PATH and exit
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Forget the stored session and exit
    #[arg(long)]
    logout: bool,
}

/// Initialize the tracing subscriber, logging to a file in the cache directory.
/// The returned guard must live until exit so buffered lines get flushed.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = match Config::cache_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            return None;
        }
    };
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Logging disabled: cannot create {}: {}", log_dir.display(), e);
        return None;
    }

    let file = tracing_appender::rolling::never(&log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let _log_guard = init_tracing();
    info!("{} starting", APP_NAME);

    let mut app = App::new()?;

    if cli.logout {
        app.session.logout();
        println!("Logged out.");
        return Ok(());
    }

    if let Some(target) = cli.export {
        return export_once(&app, &target).await;
    }

    if let Some(ref email) = cli.login {
        login_with_password(&app, email).await?;
    }
    app.start();

    let google_id_token = cli.google_id_token.filter(|t| !t.is_empty());
    if let (None, Some(id_token)) = (cli.login, google_id_token) {
        app.login_with_google(id_token);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("{} shutting down", APP_NAME);
    Ok(())
}

/// `--login`: prompt for the password and log in before the TUI starts
async fn login_with_password(app: &App, email: &str) -> Result<()> {
    let password = rpassword::prompt_password(format!("Password for {}: ", email))
        .context("Failed to read password")?;

    let token = match app.api.login(email, &password).await {
        Ok(token) => token,
        Err(e) => {
            warn!(error = %e, "Login failed");
            bail!(login_error_message(&e));
        }
    };
    app.session.login(token).await;
    if !app.session.is_authenticated() {
        bail!("Login failed: the server did not return a profile for this account.");
    }
    println!("Logged in as {}.", email);
    Ok(())
}

/// `--export`: restore the saved session, download the CSV and exit
async fn export_once(app: &App, target: &Path) -> Result<()> {
    if !app.session.restore().await {
        bail!("Not logged in. Run `{} --login <email>` first.", APP_NAME);
    }
    let token = app.session.token().context("Session has no token")?;
    let api = app.api.with_token(token);

    match export_notes(&api, target).await {
        Ok(path) => {
            println!("Saved to {}", path.display());
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Export failed");
            bail!(user_message(&e, "Failed to export data. Please try again."))
        }
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("neurotype").chain(args.iter().copied()))
    }

    #[test]
    fn test_no_args() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.login, None);
        assert_eq!(cli.export, None);
        assert!(!cli.logout);
    }

    #[test]
    fn test_flags_with_values() {
        let cli = parse(&["--login", "ada@example.com", "--export", "/tmp/out/"]).unwrap();
        assert_eq!(cli.login.as_deref(), Some("ada@example.com"));
        assert_eq!(cli.export, Some(PathBuf::from("/tmp/out/")));
        assert!(!cli.logout);

        let cli = parse(&["--google-id-token", "eyJ"]).unwrap();
        assert_eq!(cli.google_id_token.as_deref(), Some("eyJ"));
    }

    #[test]
    fn test_missing_value_and_unknown_flag() {
        assert!(parse(&["--login"]).is_err());
        assert!(parse(&["--frobnicate"]).is_err());

        let help = parse(&["--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
