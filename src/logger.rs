//! Session logger — one log file per launch in the OS data directory,
//! truncated at init so it never grows across sessions.
//!
//! Locations:
//!   Windows:  `%APPDATA%\rasterpad\rasterpad.log`
//!   macOS:    `~/Library/Application Support/rasterpad/rasterpad.log`
//!   Linux:    `$XDG_DATA_HOME` or `~/.local/share/rasterpad/rasterpad.log`
//!
//! Use the `log_info!` / `log_warn!` / `log_err!` macros anywhere in the
//! crate. Logging failures are swallowed — a broken log file must never take
//! the editor down with it.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

static LOG_FILE: OnceLock<Mutex<File>> = OnceLock::new();

/// Write one timestamped, level-tagged line. No-op before [`init`] or after
/// a failed init.
pub fn write(level: &str, msg: &str) {
    let Some(mutex) = LOG_FILE.get() else {
        return;
    };
    if let Ok(mut file) = mutex.lock() {
        let _ = writeln!(file, "[{}] [{}] {}", clock(), level, msg);
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::logger::write("INFO", &format!($($arg)*)) };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => { $crate::logger::write("WARN", &format!($($arg)*)) };
}

#[macro_export]
macro_rules! log_err {
    ($($arg:tt)*) => { $crate::logger::write("ERROR", &format!($($arg)*)) };
}

/// Open (truncating) the session log and install a panic hook that mirrors
/// panic messages into it before the default handler runs. Call once at
/// startup; failures leave logging disabled but are otherwise harmless.
pub fn init() {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path);
    let Ok(file) = file else {
        return;
    };
    if LOG_FILE.set(Mutex::new(file)).is_err() {
        return;
    }

    write("INFO", &format!("session log opened at {}", path.display()));

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        write("PANIC", &info.to_string());
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    data_dir().join("rasterpad").join("rasterpad.log")
}

/// Platform data directory, without the app sub-folder.
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(appdata) = std::env::var("APPDATA") {
        return PathBuf::from(appdata);
    }
    #[cfg(target_os = "macos")]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join("Library").join("Application Support");
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// HH:MM:SS within the current UTC day — enough for a per-session log.
fn clock() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => {
            let secs = d.as_secs();
            format!(
                "{:02}:{:02}:{:02}",
                (secs % 86400) / 3600,
                (secs % 3600) / 60,
                secs % 60
            )
        }
        Err(_) => "??:??:??".to_string(),
    }
}
