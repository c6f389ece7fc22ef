use chrono::Local;
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};

static LOGGER: OnceLock<Logger> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogMessage {
    pub level: String,
    pub message: String,
    pub timestamp: String,
}

/// Console logger that also remembers the most recent records.
pub struct Logger {
    recent_logs: Mutex<VecDeque<LogMessage>>,
    max_recent_logs: usize,
    console_logging_enabled: AtomicBool,
    level: LevelFilter,
}

impl Logger {
    pub fn new(max_recent_logs: usize, level: LevelFilter) -> Self {
        Logger {
            recent_logs: Mutex::new(VecDeque::with_capacity(max_recent_logs)),
            max_recent_logs,
            console_logging_enabled: AtomicBool::new(true),
            level,
        }
    }

    /// Installs the process-wide logger. Fails if a logger is already set.
    pub fn init(max_recent_logs: usize, level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = LOGGER.get_or_init(|| Logger::new(max_recent_logs, level));
        log::set_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    fn recent(&self) -> MutexGuard<'_, VecDeque<LogMessage>> {
        self.recent_logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get_recent_logs(&self) -> Vec<LogMessage> {
        self.recent().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.recent().clear();
    }

    pub fn set_console_logging(&self, enabled: bool) {
        self.console_logging_enabled.store(enabled, Ordering::Relaxed);
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        // stdout carries the CLI's JSON output.
        if self.console_logging_enabled.load(Ordering::Relaxed) {
            eprintln!(
                "[{}] {} - {}: {}",
                timestamp,
                record.level(),
                record.target(),
                record.args()
            );
        }

        if self.max_recent_logs == 0 {
            return;
        }
        let mut recent_logs = self.recent();
        while recent_logs.len() >= self.max_recent_logs {
            recent_logs.pop_front();
        }
        recent_logs.push_back(LogMessage {
            level: record.level().to_string(),
            message: record.args().to_string(),
            timestamp,
        });
    }

    fn flush(&self) {}
}

pub fn get_recent_logs() -> Vec<LogMessage> {
    LOGGER.get().map(Logger::get_recent_logs).unwrap_or_default()
}

pub fn set_console_logging(enabled: bool) {
    if let Some(logger) = LOGGER.get() {
        logger.set_console_logging(enabled);
    }
}

pub fn clear_logs() {
    if let Some(logger) = LOGGER.get() {
        logger.clear();
    }
}
