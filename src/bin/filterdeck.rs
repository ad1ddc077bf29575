use clap::{Parser, ValueEnum};
use color_eyre::Result;
use crossterm::event::{Event as CEvent, EventStream};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use filterdeck::config::{self, Config};
use filterdeck::services::FetchEvent;
use filterdeck::tui::App;
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

/// Keyboard-first condition builder over a JSON endpoint
#[derive(Parser, Debug)]
#[command(author, version = config::version(), about, long_about = None)]
struct Args {
    /// URL of a JSON array of records to load on startup
    #[arg(long = "url", value_name = "URL")]
    url: Option<String>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Default log level; RUST_LOG directives still take precedence
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Log file path (defaults to filterdeck.log in the working directory)
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Directory exports are written to (defaults to the working directory)
    #[arg(long = "export-dir", value_name = "DIR")]
    export_dir: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_hooks()?;
    let args = Args::parse();

    filterdeck::logging::init_with(args.log_file.clone(), args.logging.map(Into::into))?;
    let config = Config::from_path(args.config.as_ref())?;
    let export_dir = match args.export_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let (mut app, fetch_rx) = App::new(&config, export_dir, args.url.as_deref())?;

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, fetch_rx).await;

    restore_terminal()?;
    if let Err(e) = &res {
        error!("Error: {e}");
    }
    res
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut fetch_rx: UnboundedReceiver<FetchEvent>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    app.start();
    info!("filterdeck started");

    while !app.should_quit() {
        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(CEvent::Key(key))) => app.handle_key_event(key)?,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => error!("terminal event error: {e}"),
                    None => break,
                }
            }
            Some(event) = fetch_rx.recv() => app.handle_fetch_event(event),
            // Redraw so the loading indicator stays current
            _ = tick.tick() => {}
        }
    }

    info!("filterdeck exiting");
    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Panic and error reports that leave the terminal usable
fn install_hooks() -> Result<()> {
    let (panic_hook, eyre_hook) = color_eyre::config::HookBuilder::default()
        .display_location_section(cfg!(debug_assertions))
        .into_hooks();
    eyre_hook.install()?;

    std::panic::set_hook(Box::new(move |panic_info| {
        if let Err(e) = restore_terminal() {
            error!("unable to restore terminal: {e}");
        }

        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, metadata, print_msg};
            let meta = metadata!();
            let file_path = handle_dump(&meta, panic_info);
            print_msg(file_path, &meta).ok();
        }

        let msg = format!("{}", panic_hook.panic_report(panic_info));
        error!("{msg}");

        #[cfg(debug_assertions)]
        better_panic::Settings::auto()
            .most_recent_first(false)
            .lineno_suffix(true)
            .verbosity(better_panic::Verbosity::Full)
            .create_panic_handler()(panic_info);

        std::process::exit(1);
    }));
    Ok(())
}
