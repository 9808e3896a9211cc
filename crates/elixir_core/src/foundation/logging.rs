//! Engine logging service
//!
//! A thread-safe sink for leveled, timestamped messages. Every message is
//! optionally echoed to the terminal and kept in a bounded history so an
//! in-engine console can display the most recent output.
//!
//! The logger is an explicitly constructed service shared as `Arc<Logger>`.
//! [`Logger::install`] additionally routes the `log` facade into it, so
//! `log::info!` calls from anywhere in the process land in the same history.

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Local};
use env_logger::filter::{Builder as FilterBuilder, Filter};

use crate::config::LoggingConfig;

/// Default number of messages retained in the history
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// RGB colour triple in the 0.0 - 1.0 range
pub type Rgb = [f32; 3];

/// Severity of a log message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Informational output
    Info,
    /// Something unexpected that the engine recovered from
    Warning,
    /// An operation failed
    Error,
}

impl LogLevel {
    /// Label printed between brackets in the formatted line
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARN",
            Self::Error => "ERROR",
        }
    }

    /// Display colour used by the terminal echo and stored with each message
    pub const fn color(self) -> Rgb {
        match self {
            Self::Info => [0.8, 0.8, 0.8],
            Self::Warning => [1.0, 0.8, 0.0],
            Self::Error => [1.0, 0.3, 0.3],
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warning,
            log::Level::Info | log::Level::Debug | log::Level::Trace => Self::Info,
        }
    }
}

/// Where a message was emitted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Source file path as reported by `file!()`
    pub file: &'static str,
    /// Line number
    pub line: u32,
    /// Enclosing function or module path
    pub function: &'static str,
}

impl SourceLocation {
    /// Create a source location
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }

    /// File name without its directories
    pub fn file_name(&self) -> &'static str {
        self.file
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(self.file)
    }
}

/// One entry of the message history
#[derive(Debug, Clone)]
pub struct LogMessage {
    /// Severity
    pub level: LogLevel,
    /// Fully formatted line, without terminal escape codes
    pub message: String,
    /// Display colour for non-terminal consumers
    pub color: Rgb,
    /// Wall-clock time the message was logged
    pub timestamp: DateTime<Local>,
}

/// Format a message as `[HH:MM:SS.mmm] [LEVEL][file:line][function] message`
pub fn format_message(
    level: LogLevel,
    message: &str,
    location: Option<SourceLocation>,
    timestamp: &DateTime<Local>,
) -> String {
    let mut line = format!("[{}] [{}]", timestamp.format("%H:%M:%S%.3f"), level.label());

    match location {
        Some(location) => {
            let _ = write!(
                line,
                "[{}:{}][{}] ",
                location.file_name(),
                location.line,
                location.function
            );
        }
        None => line.push(' '),
    }

    line.push_str(message);
    line
}

/// Thread-safe leveled logger with bounded history
pub struct Logger {
    history: Mutex<VecDeque<LogMessage>>,
    capacity: usize,
    echo_to_console: bool,
    filter: Filter,
}

impl Logger {
    /// Create a logger from its configuration
    ///
    /// `RUST_LOG`, when set, overrides the configured facade filter.
    pub fn new(config: &LoggingConfig) -> Self {
        let mut builder = FilterBuilder::new();
        match std::env::var("RUST_LOG") {
            Ok(directives) => {
                builder.parse(&directives);
            }
            Err(_) => {
                builder.parse(&config.filter);
            }
        }

        let capacity = config.history_capacity.max(1);

        Self {
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            echo_to_console: config.echo_to_console,
            filter: builder.build(),
        }
    }

    /// Route the `log` facade into this logger
    ///
    /// Can only succeed once per process.
    pub fn install(logger: &Arc<Self>) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(LogBridge(Arc::clone(logger))))?;
        log::set_max_level(logger.filter.filter());
        Ok(())
    }

    /// Log a message at the given level
    pub fn log(&self, level: LogLevel, message: &str, location: Option<SourceLocation>) {
        let timestamp = Local::now();
        let formatted = format_message(level, message, location, &timestamp);

        // Console output and history are separate critical sections on the
        // same lock: two threads may interleave between them, so terminal
        // order and history order can differ.
        if self.echo_to_console {
            let _guard = self.lock_history();
            write_console(level, &formatted);
        }

        let mut history = self.lock_history();
        history.push_back(LogMessage {
            level,
            message: formatted,
            color: level.color(),
            timestamp,
        });
        while history.len() > self.capacity {
            history.pop_front();
        }
    }

    /// Log an informational message
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    /// Log a warning
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warning, message, None);
    }

    /// Log an error
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    /// Snapshot of the retained history, oldest first
    pub fn messages(&self) -> Vec<LogMessage> {
        self.lock_history().iter().cloned().collect()
    }

    /// Number of retained messages
    pub fn len(&self) -> usize {
        self.lock_history().len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.lock_history().is_empty()
    }

    /// Maximum number of retained messages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every retained message
    pub fn clear(&self) {
        self.lock_history().clear();
    }

    /// Flush the terminal streams
    pub fn flush(&self) {
        let _ = io::stdout().flush();
        let _ = io::stderr().flush();
    }

    fn lock_history(&self) -> std::sync::MutexGuard<'_, VecDeque<LogMessage>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("capacity", &self.capacity)
            .field("echo_to_console", &self.echo_to_console)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn write_console(level: LogLevel, formatted: &str) {
    let [r, g, b] = level.color().map(|channel| (channel * 255.0).round() as u8);
    let line = format!("\x1b[38;2;{r};{g};{b}m{formatted}\x1b[0m");

    match level {
        LogLevel::Info => {
            let _ = writeln!(io::stdout().lock(), "{line}");
        }
        LogLevel::Warning | LogLevel::Error => {
            let _ = writeln!(io::stderr().lock(), "{line}");
        }
    }
}

/// Adapter installing a shared [`Logger`] behind the `log` facade
struct LogBridge(Arc<Logger>);

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.0.filter.enabled(metadata)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.0.filter.matches(record) {
            return;
        }

        let location = match (record.file_static(), record.line(), record.module_path_static()) {
            (Some(file), Some(line), Some(module)) => Some(SourceLocation::new(file, line, module)),
            _ => None,
        };

        self.0
            .log(record.level().into(), &record.args().to_string(), location);
    }

    fn flush(&self) {
        self.0.flush();
    }
}

/// Log an informational message through a [`Logger`], capturing the call site
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(
            $crate::foundation::logging::LogLevel::Info,
            &::std::format!($($arg)+),
            ::std::option::Option::Some($crate::foundation::logging::SourceLocation::new(
                ::std::file!(),
                ::std::line!(),
                ::std::module_path!(),
            )),
        )
    };
}

/// Log a warning through a [`Logger`], capturing the call site
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(
            $crate::foundation::logging::LogLevel::Warning,
            &::std::format!($($arg)+),
            ::std::option::Option::Some($crate::foundation::logging::SourceLocation::new(
                ::std::file!(),
                ::std::line!(),
                ::std::module_path!(),
            )),
        )
    };
}

/// Log an error through a [`Logger`], capturing the call site
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.log(
            $crate::foundation::logging::LogLevel::Error,
            &::std::format!($($arg)+),
            ::std::option::Option::Some($crate::foundation::logging::SourceLocation::new(
                ::std::file!(),
                ::std::line!(),
                ::std::module_path!(),
            )),
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn quiet_logger(capacity: usize) -> Logger {
        Logger::new(&LoggingConfig {
            history_capacity: capacity,
            echo_to_console: false,
            ..LoggingConfig::default()
        })
    }

    fn fixed_timestamp() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 1, 9, 5, 7)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_format_with_location_strips_directories() {
        let location = SourceLocation::new("src/physics/controller.rs", 42, "elixir_core::physics");
        let line = format_message(LogLevel::Error, "boom", Some(location), &fixed_timestamp());

        assert_eq!(line, "[09:05:07.000] [ERROR][controller.rs:42][elixir_core::physics] boom");
    }

    #[test]
    fn test_format_handles_windows_paths() {
        let location = SourceLocation::new("C:\\engine\\src\\scene.rs", 7, "scene");
        assert_eq!(location.file_name(), "scene.rs");
    }

    #[test]
    fn test_format_without_location() {
        let line = format_message(LogLevel::Warning, "careful", None, &fixed_timestamp());
        assert_eq!(line, "[09:05:07.000] [WARN] careful");
    }

    #[test]
    fn test_history_evicts_oldest_past_capacity() {
        let logger = quiet_logger(DEFAULT_HISTORY_CAPACITY);

        for index in 0..=DEFAULT_HISTORY_CAPACITY {
            logger.info(&format!("message {index}"));
        }

        let messages = logger.messages();
        assert_eq!(messages.len(), DEFAULT_HISTORY_CAPACITY);
        assert!(messages[0].message.ends_with("message 1"));
        assert!(messages[DEFAULT_HISTORY_CAPACITY - 1].message.ends_with("message 1000"));
    }

    #[test]
    fn test_messages_carry_level_colour() {
        let logger = quiet_logger(8);
        logger.info("a");
        logger.warn("b");
        logger.error("c");

        let colors: Vec<Rgb> = logger.messages().iter().map(|m| m.color).collect();
        assert_eq!(colors, vec![[0.8, 0.8, 0.8], [1.0, 0.8, 0.0], [1.0, 0.3, 0.3]]);
    }

    #[test]
    fn test_macro_captures_call_site() {
        let logger = quiet_logger(8);
        crate::log_error!(logger, "failed after {} tries", 3);

        let message = &logger.messages()[0];
        assert_eq!(message.level, LogLevel::Error);
        assert!(message.message.contains("[ERROR][logging.rs:"));
        assert!(message.message.ends_with("failed after 3 tries"));
    }

    #[test]
    fn test_concurrent_logging_stays_bounded() {
        let logger = Arc::new(quiet_logger(100));

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for index in 0..250 {
                        logger.info(&format!("worker {worker} message {index}"));
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().expect("logging thread panicked");
        }

        assert_eq!(logger.len(), 100);
    }
}
