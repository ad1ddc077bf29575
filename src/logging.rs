use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

lazy_static::lazy_static! {
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// Initialize file logging, by default at WARN into `filterdeck.log` in cwd
///
/// `level` replaces WARN as the default directive; `RUST_LOG` directives are
/// applied on top of it. The terminal belongs to the UI, so output only ever
/// goes to the file.
pub fn init_with(custom_log_path: Option<PathBuf>, level: Option<Level>) -> Result<()> {
    let log_path = match custom_log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => std::env::current_dir()?.join(LOG_FILE.as_str()),
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.unwrap_or(Level::WARN).into())
        .from_env_lossy();

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(Mutex::new(log_file))
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    tracing::debug!(path = %log_path.display(), "logging initialized");
    Ok(())
}
