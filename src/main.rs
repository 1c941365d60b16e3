mod api;
mod cache;
mod clock;
mod colors;
mod config;
mod error;
mod models;
mod store;
mod time;
mod tui;
mod view;

use anyhow::{Context, Result};
use crossterm::{
    event::{Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn, Level};

use api::AssetClient;
use cache::AssetCache;
use clock::{Clock, FixedClock, SystemClock};
use colors::CourseColors;
use config::Config;
use store::ScheduleStore;
use tui::{App, SyncPlan};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // These never touch the config file, so a broken one cannot block them.
    match early_action(&args) {
        Some(EarlyAction::Init) => {
            let path = Config::generate_default()?;
            println!("Generated config file at: {}", path.display());
            println!("Add schedule_urls to merge published schedules, then run class-schedule.");
            return Ok(());
        }
        Some(EarlyAction::Help) => {
            print_help();
            return Ok(());
        }
        Some(EarlyAction::List) => {
            let store = ScheduleStore::builtin().context("Built-in schedules are invalid")?;
            for schedule in store.list() {
                println!("{:<32} {:<12} {}", schedule.id, schedule.short_id, schedule.display_name);
            }
            return Ok(());
        }
        None => {}
    }

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `class-schedule --init` to generate a fresh config file."
    })?;
    init_logging(config.log_level()?);

    let store = ScheduleStore::builtin().context("Built-in schedules are invalid")?;

    let clock: Box<dyn Clock> = match flag_value(&args, "--at") {
        Some(at) => Box::new(
            FixedClock::parse(at).with_context(|| format!("Invalid --at value {at:?}"))?,
        ),
        None => Box::new(SystemClock),
    };

    let mut app = App::new(
        store,
        clock,
        CourseColors::new(config.palette_colors()?),
        config.boundary_policy,
        config.default_schedule.as_deref(),
    );
    if !config.schedule_urls.is_empty() {
        let plan = SyncPlan {
            cache: AssetCache::open(&config.cache_generation)?,
            client: AssetClient::new()?,
            urls: config.schedule_urls.clone(),
        };
        app = app.with_sync(plan);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
    }

    Ok(())
}

fn print_help() {
    println!("class-schedule — A terminal UI for weekly class schedules");
    println!();
    println!("USAGE:");
    println!("  class-schedule                      Start the TUI");
    println!("  class-schedule --init               Generate a default config file");
    println!("  class-schedule --list               Print the available schedules");
    println!("  class-schedule --at \"Monday 09:30 AM\"");
    println!("                                      Pretend it is always this day and time");
    println!();
    println!("CONFIG:");
    println!("  File: ~/.config/class-schedule/config.toml");
    println!("  Log:  ~/.cache/class-schedule/class-schedule.log");
    println!();
    println!("KEYBINDINGS:");
    println!("  m / Tab           Switch simple / table mode");
    println!("  h / l / Left / Right  Previous / next day");
    println!("  1-7               Jump to day");
    println!("  t                 Jump to today");
    println!("  / or s            Pick a schedule");
    println!("  r                 Re-download remote schedules");
    println!("  q / Ctrl+C        Quit");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EarlyAction {
    Init,
    Help,
    List,
}

/// Flags that run and exit before the config is loaded.
fn early_action(args: &[String]) -> Option<EarlyAction> {
    if args.iter().any(|a| a == "--init") {
        Some(EarlyAction::Init)
    } else if args.iter().any(|a| a == "--help" || a == "-h") {
        Some(EarlyAction::Help)
    } else if args.iter().any(|a| a == "--list") {
        Some(EarlyAction::List)
    } else {
        None
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let i = args.iter().position(|a| a == flag)?;
    args.get(i + 1).map(String::as_str)
}

/// Logs go to a file; the terminal belongs to the TUI.
fn init_logging(level: Level) {
    let Some(dir) = cache::app_cache_dir() else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("class-schedule.log"))
    else {
        return;
    };
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<()> {
    info!(schedules = app.store.list().len(), "starting");

    // Built-in schedules render immediately; remote ones merge in when ready.
    app.start_sync(false);

    loop {
        app.frame_count = app.frame_count.wrapping_add(1);
        terminal.draw(|f| tui::ui::render(f, &mut app))?;

        if let Some(event) = tui::event::poll_event(Duration::from_millis(100))? {
            if let Event::Key(KeyEvent {
                code,
                modifiers,
                kind: KeyEventKind::Press,
                ..
            }) = event
            {
                tui::event::handle_key(&mut app, code, modifiers);
            }
        }

        if !app.running {
            break;
        }

        // Apply a completed sync without blocking.
        if app.poll_sync_result() && app.store.is_empty() {
            warn!("no schedules after sync");
        }
    }

    Ok(())
}
