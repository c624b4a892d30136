//! # logwriter
//!
//! Логгер с ротацией по пулу пронумерованных файлов и оповещениями об
//! исключениях через системный журнал и почту. Ошибки самого логгера
//! никогда не доходят до вызывающего кода.

pub mod alert;
pub mod backup;
pub mod config;
pub mod error;
pub mod filter;
mod logger;
pub mod paths;
pub mod record;
pub mod rotation;

use once_cell::sync::OnceCell;

pub use alert::event_log::{EventLevel, EventSink, SystemEventLog};
pub use alert::mail::{AlertMail, MailTransport, SmtpMailer};
pub use alert::{AlertEvent, AlertSinks};
pub use config::{Config, EnvSettings, MailSettings, SettingsSource, TomlSettings};
pub use error::{DiagnosticsSnapshot, LogError};
pub use filter::{LogLevel, ALWAYS};
pub use logger::Logger;

// ===== Макросы =====

#[macro_export]
macro_rules! log {
    ($logger:expr, $priority:expr, $($arg:tt)*) => {{
        $logger.write_default(&format!($($arg)*), $priority)
    }};
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)*) => {{
        $logger.write_debug(std::format_args!($($arg)*))
    }};
}
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)*) => {{
        $logger.write_info(std::format_args!($($arg)*))
    }};
}
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)*) => {{
        $logger.write_warning(std::format_args!($($arg)*))
    }};
}
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)*) => {{
        $logger.write_error(std::format_args!($($arg)*))
    }};
}

// ===== Глобальные макросы =====

#[macro_export]
macro_rules! gdebug {
    ($($arg:tt)*) => {{
        if let Some(logger) = $crate::global_logger() {
            logger.write_debug(std::format_args!($($arg)*));
        }
    }};
}
#[macro_export]
macro_rules! ginfo {
    ($($arg:tt)*) => {{
        if let Some(logger) = $crate::global_logger() {
            logger.write_info(std::format_args!($($arg)*));
        }
    }};
}
#[macro_export]
macro_rules! gwarning {
    ($($arg:tt)*) => {{
        if let Some(logger) = $crate::global_logger() {
            logger.write_warning(std::format_args!($($arg)*));
        }
    }};
}
#[macro_export]
macro_rules! gerror {
    ($($arg:tt)*) => {{
        if let Some(logger) = $crate::global_logger() {
            logger.write_error(std::format_args!($($arg)*));
        }
    }};
}

// ===== Глобальный логгер =====

static GLOBAL_LOGGER: OnceCell<Logger> = OnceCell::new();

/// Создаёт глобальный логгер из настроек. Повторный вызов возвращает
/// уже созданный логгер, настройки второго вызова игнорируются.
pub fn init_global_logger<S: SettingsSource + ?Sized>(source: &S) -> &'static Logger {
    GLOBAL_LOGGER.get_or_init(|| Logger::from_settings(source))
}

/// Устанавливает готовый логгер глобальным. Если глобальный уже есть,
/// переданный логгер возвращается обратно.
pub fn set_global_logger(logger: Logger) -> Result<(), Logger> {
    GLOBAL_LOGGER.set(logger)
}

pub fn global_logger() -> Option<&'static Logger> {
    GLOBAL_LOGGER.get()
}
