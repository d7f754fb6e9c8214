use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

const MAX_ENTRIES: usize = 500;
pub const LOG_PATH: &str = "/tmp/ccdash.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

struct LogBuffer {
    entries: Vec<LogEntry>,
    dirty: bool,
}

static ECHO: AtomicBool = AtomicBool::new(false);

fn global() -> MutexGuard<'static, LogBuffer> {
    static INSTANCE: OnceLock<Mutex<LogBuffer>> = OnceLock::new();
    INSTANCE
        .get_or_init(|| {
            Mutex::new(LogBuffer {
                entries: Vec::new(),
                dirty: false,
            })
        })
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn log_file() -> &'static Mutex<Option<std::fs::File>> {
    static FILE: OnceLock<Mutex<Option<std::fs::File>>> = OnceLock::new();
    FILE.get_or_init(|| {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(LOG_PATH)
            .ok();
        Mutex::new(file)
    })
}

/// Mirror every entry to stderr. Used by the headless subcommands, where
/// there is no log panel to look at.
pub fn set_echo(enabled: bool) {
    ECHO.store(enabled, Ordering::Relaxed);
}

pub fn push(level: LogLevel, msg: String) {
    let now = Utc::now();
    let line = format!(
        "[{}] {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level.label(),
        msg
    );

    if let Ok(mut guard) = log_file().lock() {
        if let Some(ref mut file) = *guard {
            let _ = writeln!(file, "{}", line);
        }
    }

    if ECHO.load(Ordering::Relaxed) {
        eprintln!("{}", line);
    }

    let mut buf = global();
    buf.entries.push(LogEntry {
        timestamp: now,
        level,
        message: msg,
    });
    if buf.entries.len() > MAX_ENTRIES {
        let excess = buf.entries.len() - MAX_ENTRIES;
        buf.entries.drain(..excess);
    }
    buf.dirty = true;
}

pub fn take_dirty() -> bool {
    let mut buf = global();
    let was = buf.dirty;
    buf.dirty = false;
    was
}

pub fn entries() -> Vec<LogEntry> {
    global().entries.clone()
}

pub fn clear() {
    let mut buf = global();
    buf.entries.clear();
    buf.dirty = true;
}

pub fn entry_count() -> usize {
    global().entries.len()
}

/// Shortens an identifier for logging: first six and last four characters.
pub fn redact(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 10 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[macro_export]
macro_rules! tlog {
    (info, $($arg:tt)*) => {
        $crate::log::push($crate::log::LogLevel::Info, format!($($arg)*))
    };
    (warn, $($arg:tt)*) => {
        $crate::log::push($crate::log::LogLevel::Warn, format!($($arg)*))
    };
    (error, $($arg:tt)*) => {
        $crate::log::push($crate::log::LogLevel::Error, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_keeps_edges() {
        assert_eq!(redact("abcdef-1234-wxyz"), "abcdef...wxyz");
    }

    #[test]
    fn test_redact_masks_short_values() {
        assert_eq!(redact("short"), "*****");
        assert_eq!(redact(""), "");
    }

    #[test]
    fn test_push_records_entry() {
        tlog!(warn, "log test entry {}", 7);
        let found = entries()
            .iter()
            .any(|e| e.level == LogLevel::Warn && e.message == "log test entry 7");
        assert!(found);
    }
}
