use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::time::SystemTime;

const RESET: &str = "\x1b[0m";
const BLUE: &str = "\x1b[34m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

#[macro_export]
macro_rules! log_info {
    ($msg:expr) => {
        ::log::info!("{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::info!($fmt, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($msg:expr) => {
        ::log::debug!("{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::debug!($fmt, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($msg:expr) => {
        ::log::warn!("{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::warn!($fmt, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_error {
    ($msg:expr) => {
        ::log::error!("{}", $msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        ::log::error!($fmt, $($arg)*)
    };
}

static LOGGER: Logger = Logger {};

/// Terminal logger used by the binary. The library only talks to the `log` facade.
pub struct Logger {}

impl Logger {
    /// Installs the logger globally with the given maximum level.
    pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_logger(&LOGGER)?;
        log::set_max_level(level);

        Ok(())
    }

    fn get_timestamp() -> String {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();

        let secs = now.as_secs();
        let millis = now.subsec_millis();

        let hours = (secs / 3600) % 24;
        let minutes = (secs / 60) % 60;
        let seconds = secs % 60;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }

    fn format_line(level: Level, message: &str) -> String {
        let (level_str, color) = match level {
            Level::Trace | Level::Debug => ("DEBUG", BLUE),
            Level::Info => ("INFO", GREEN),
            Level::Warn => ("WARN", YELLOW),
            Level::Error => ("ERROR", RED),
        };

        format!(
            "{} [{}{}{}] {}",
            Self::get_timestamp(),
            color,
            level_str,
            RESET,
            message
        )
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = Self::format_line(record.level(), &record.args().to_string());

        match record.level() {
            Level::Error | Level::Warn => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn flush(&self) {}
}
