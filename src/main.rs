mod app;
mod theme;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use veneer::{admin, markup, public, EnhancerConfig, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Enhancer {
    Admin,
    Public,
    All,
}

#[derive(Parser, Debug)]
#[command(name = "veneer")]
#[command(version)]
#[command(about = "Preview cosmetic enhancements on admin and story pages")]
struct Args {
    /// Page markup as JSON
    page: PathBuf,

    /// Which page-load enhancer to run
    #[arg(short, long, value_enum, default_value_t = Enhancer::All)]
    enhancer: Enhancer,

    /// Path the page is served at (for nav highlighting)
    #[arg(long, default_value = "/")]
    path: String,

    /// Config file (defaults to ~/.config/veneer/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Settle all timers and print the enhanced page as JSON
    #[arg(short, long)]
    dump: bool,

    /// With --dump, let timers fire at wall-clock pace
    #[arg(long, requires = "dump")]
    realtime: bool,

    /// Longest stretch of page time to settle in --dump mode, in ms
    #[arg(long, default_value_t = 10_000)]
    settle_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so --dump output stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EnhancerConfig::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EnhancerConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Falling back to default config: {}", e);
            EnhancerConfig::default()
        }),
    };

    let doc = markup::load(&args.page)
        .with_context(|| format!("loading page {}", args.page.display()))?;
    let mut page = Page::new(doc, config);

    if matches!(args.enhancer, Enhancer::Admin | Enhancer::All) {
        admin::init_admin(&mut page);
    }
    if matches!(args.enhancer, Enhancer::Public | Enhancer::All) {
        public::init_public(&mut page, &args.path);
    }

    if args.dump {
        return dump(page, &args).await;
    }

    run_tui(App::new(page)).await
}

async fn dump(mut page: Page, args: &Args) -> Result<()> {
    let cap = Duration::from_millis(args.settle_ms);

    let idle = if args.realtime {
        let start = tokio::time::Instant::now();
        loop {
            let Some(due) = page.next_due() else {
                break true;
            };
            if due > cap {
                page.advance(cap.saturating_sub(page.now()));
                break false;
            }
            tokio::time::sleep_until(start + due).await;
            page.advance(due.saturating_sub(page.now()));
        }
    } else {
        page.run_until_idle(cap)
    };

    if !idle {
        tracing::warn!(
            "{} timers still pending after {}ms",
            page.pending_tasks(),
            cap.as_millis()
        );
    }

    let snapshot = markup::snapshot(page.document());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        // Short poll keeps animations smooth
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            if let Err(e) = app.handle_key(key) {
                                app.status_message = Some(format!("Error: {}", e));
                            }
                        }
                    }
                }
            }
        }

        app.tick();
    }
}
