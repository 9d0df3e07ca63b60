// src/logging.rs

use color_eyre::eyre::Result;
use directories::ProjectDirs;
use lazy_static::lazy_static;
use std::collections::VecDeque;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use time::macros::format_description;
use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

lazy_static! {
    pub static ref PROJECT_NAME: String = env!("CARGO_CRATE_NAME").to_uppercase().to_string();
    pub static ref LOG_ENV: String = format!("{}_LOGLEVEL", PROJECT_NAME.clone());
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "subscan-rs", env!("CARGO_PKG_NAME"))
}

pub fn get_data_dir() -> PathBuf {
    if let Some(proj_dirs) = project_directory() {
        proj_dirs.data_local_dir().to_path_buf()
    } else {
        PathBuf::from(".").join(".data")
    }
}

pub fn log_path() -> PathBuf {
    get_data_dir().join(LOG_FILE.as_str())
}

/// Initializes file-based logging using the tracing subscriber.
///
/// The terminal belongs to the UI, so nothing is ever written to stdout or
/// stderr; the log panel tails the file instead.
pub fn initialize_logging() -> Result<()> {
    let directory = get_data_dir();
    std::fs::create_dir_all(&directory)?;
    let log_file = std::fs::File::create(log_path())?;

    let file_log_level = std::env::var("RUST_LOG")
        .or_else(|_| std::env::var(LOG_ENV.clone()))
        .unwrap_or_else(|_| format!("{}=info", env!("CARGO_CRATE_NAME")));

    // "DATE TIME LEVEL message": the log panel relies on the first two fields.
    let timer = UtcTime::new(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"));

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(log_file)
        .with_timer(timer)
        .with_target(false)
        .with_ansi(false)
        .with_filter(EnvFilter::new(file_log_level));

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();

    Ok(())
}

/// Returns the last `max_lines` lines of the log file, oldest first.
///
/// A missing or unreadable file simply yields no lines.
pub fn read_log_tail(max_lines: usize) -> Vec<String> {
    let Ok(file) = std::fs::File::open(log_path()) else {
        return Vec::new();
    };
    tail_lines(BufReader::new(file), max_lines)
}

fn tail_lines<R: BufRead>(reader: R, max_lines: usize) -> Vec<String> {
    let mut tail = VecDeque::with_capacity(max_lines);
    for line in reader.lines().map_while(|l| l.ok()) {
        if tail.len() == max_lines {
            tail.pop_front();
        }
        if max_lines > 0 {
            tail.push_back(line);
        }
    }
    tail.into()
}
