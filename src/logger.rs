//! Session logger — a `log` backend that writes to a single file in the OS
//! data directory.
//!
//! The file is **truncated (overwritten) at each launch**, so it only ever
//! contains output from the most-recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\Nonomaker\nonomaker.log`
//!   Linux:    `~/.local/share/Nonomaker/nonomaker.log`
//!   macOS:    `~/Library/Application Support/Nonomaker/nonomaker.log`
//!
//! Use the regular `log::info!` / `log::warn!` / `log::debug!` macros
//! anywhere in the crate. With `echo` enabled, records are mirrored to
//! stderr as well.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use log::{LevelFilter, Log, Metadata, Record};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();
static ECHO: OnceLock<bool> = OnceLock::new();
static LOGGER: SessionLogger = SessionLogger;

struct SessionLogger;

impl Log for SessionLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&timestamp(), record.level().as_str(), &record.args().to_string());
        write_line(&line);
        if ECHO.get().copied().unwrap_or(false) {
            eprintln!("{}", line);
        }
    }

    fn flush(&self) {
        if let Some(mutex) = LOG_FILE.get()
            && let Ok(mut file) = mutex.lock()
        {
            let _ = file.flush();
        }
    }
}

/// Path of the session log, once [`init`] has opened it.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Write a raw line to the session log.  Silently ignores I/O errors so that
/// logging never crashes the application.
pub fn write_line(line: &str) {
    if let Some(mutex) = LOG_FILE.get()
        && let Ok(mut file) = mutex.lock()
    {
        let _ = writeln!(file, "{}", line);
    }
}

fn format_line(ts: &str, level: &str, msg: &str) -> String {
    format!("[{}] [{}] {}", ts, level, msg)
}

/// Initialise the session logger.  Only the first call has any effect.
///
/// The log file is truncated; if it cannot be opened, records only reach
/// stderr (and only when `echo` is set). A panic hook copies the panic
/// message into the log before the default handler runs.
pub fn init(level: LevelFilter, echo: bool) {
    if ECHO.set(echo).is_err() {
        return;
    }

    let path = log_dir().join("nonomaker.log");
    match open_truncated(&path) {
        Ok(file) => {
            let _ = LOG_FILE.set(Mutex::new(file));
            let _ = LOG_PATH.set(path);
        }
        Err(e) => eprintln!("[logger] cannot write {}: {}", path.display(), e),
    }

    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
    write_line(&format!("=== Nonomaker session {} ===\n", human_timestamp()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write_line(&format_line(&timestamp(), "PANIC", &info.to_string()));
        prev(info);
    }));
}

fn open_truncated(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).write(true).truncate(true).open(path)
}

/// Parse a level name as used in settings files and `--log-level`.
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.trim().to_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

/// `Nonomaker` folder under the platform data directory, or under the
/// working directory when no data directory is known.
fn log_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    let base = env_dir("APPDATA", &[]);
    #[cfg(target_os = "macos")]
    let base = env_dir("HOME", &["Library", "Application Support"]);
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let base = env_dir("XDG_DATA_HOME", &[]).or_else(|| env_dir("HOME", &[".local", "share"]));

    base.unwrap_or_else(|| PathBuf::from(".")).join("Nonomaker")
}

fn env_dir(var: &str, parts: &[&str]) -> Option<PathBuf> {
    let base = PathBuf::from(std::env::var_os(var)?);
    Some(parts.iter().fold(base, |dir, part| dir.join(part)))
}

/// `HH:MM:SS` (UTC).
fn timestamp() -> String {
    let clock = format_description!("[hour]:[minute]:[second]");
    OffsetDateTime::now_utc()
        .format(&clock)
        .unwrap_or_else(|_| "??:??:??".to_string())
}

/// RFC 3339 date-time for the session header.
fn human_timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "(unknown time)".to_string())
}
