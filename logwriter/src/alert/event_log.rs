// ===== Системный журнал событий (платформозависимо) =====

use crate::error::LogError;

/// Код события для оповещений об исключениях.
pub const ALERT_EVENT_ID: u32 = 1000;
pub const ALERT_CATEGORY: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Warning,
    Error,
}

/// Куда уходят записи системного журнала. Реализации должны быть
/// потокобезопасны: ими пользуются и вызывающие потоки, и воркеры оповещений.
pub trait EventSink: Send + Sync {
    fn report(&self, source: &str, level: EventLevel, message: &str) -> Result<(), LogError>;
}

/// syslog на Linux, Windows Event Log на Windows.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEventLog;

#[cfg(target_os = "linux")]
impl EventSink for SystemEventLog {
    fn report(&self, source: &str, level: EventLevel, message: &str) -> Result<(), LogError> {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_USER,
            hostname: None,
            process: source.to_owned(),
            pid: std::process::id(),
        };
        let mut writer =
            syslog::unix(formatter).map_err(|e| LogError::EventLog(e.to_string()))?;
        let written = match level {
            EventLevel::Warning => writer.warning(message),
            EventLevel::Error => writer.err(message),
        };
        written.map_err(|e| LogError::EventLog(e.to_string()))
    }
}

#[cfg(target_os = "windows")]
impl EventSink for SystemEventLog {
    fn report(&self, source: &str, level: EventLevel, message: &str) -> Result<(), LogError> {
        use logwriter_winlog::{EventEntry, EventType, WinEventLogger};

        let event_type = match level {
            EventLevel::Warning => EventType::Warning,
            EventLevel::Error => EventType::Error,
        };
        let logger = WinEventLogger::new(source, "Application");
        let entry = EventEntry {
            event_type,
            event_id: ALERT_EVENT_ID,
            category: ALERT_CATEGORY,
            message,
        };
        if logger.report(entry) {
            Ok(())
        } else {
            Err(LogError::EventLog(format!(
                "cannot write to Application log as '{}'",
                source
            )))
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
impl EventSink for SystemEventLog {
    fn report(&self, _source: &str, _level: EventLevel, _message: &str) -> Result<(), LogError> {
        Err(LogError::Unsupported("system event log"))
    }
}
