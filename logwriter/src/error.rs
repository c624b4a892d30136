use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Внутренние ошибки. Наружу не выходят никогда — см. [`FailurePolicy`].
#[derive(Debug, Error)]
pub enum LogError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("mail error: {0}")]
    Mail(String),

    #[error("invalid mail address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("event log error: {0}")]
    EventLog(String),

    #[error("{0} panicked")]
    Panicked(&'static str),

    #[error("not supported on this platform: {0}")]
    Unsupported(&'static str),
}

// ===== Политика проглатывания ошибок =====

/// Счётчики того, что логгер молча пережил.
#[derive(Debug, Default)]
pub struct Diagnostics {
    swallowed_failures: AtomicU64,
    dropped_alerts: AtomicU64,
    dispatched_alerts: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiagnosticsSnapshot {
    pub swallowed_failures: u64,
    pub dropped_alerts: u64,
    /// События, которые дошли хотя бы до журнала событий или почты.
    pub dispatched_alerts: u64,
}

impl Diagnostics {
    pub(crate) fn record_failure(&self) {
        self.swallowed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped_alert(&self) {
        self.dropped_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched_alert(&self) {
        self.dispatched_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            swallowed_failures: self.swallowed_failures.load(Ordering::Relaxed),
            dropped_alerts: self.dropped_alerts.load(Ordering::Relaxed),
            dispatched_alerts: self.dispatched_alerts.load(Ordering::Relaxed),
        }
    }
}

/// Ни одна ошибка логгера не должна дойти до прикладного кода.
/// Каждый внешний эффект (файл, почта, журнал событий) проходит через
/// `swallow`: ошибка считается, передаётся в `report` и дальше не идёт.
pub(crate) struct FailurePolicy;

impl FailurePolicy {
    pub(crate) fn swallow<T>(
        diagnostics: &Diagnostics,
        context: &str,
        result: Result<T, LogError>,
        report: impl FnOnce(&str),
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                diagnostics.record_failure();
                report(&format!("{}: {}", context, e));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swallow_counts_and_reports_failures() {
        let diagnostics = Diagnostics::default();
        let mut reported = Vec::new();

        let ok: Option<u32> = FailurePolicy::swallow(&diagnostics, "open", Ok(5), |m| {
            reported.push(m.to_owned())
        });
        assert_eq!(ok, Some(5));

        let failed: Option<u32> = FailurePolicy::swallow(
            &diagnostics,
            "open",
            Err(LogError::Mail("connection refused".into())),
            |m| reported.push(m.to_owned()),
        );
        assert_eq!(failed, None);
        assert_eq!(reported, vec!["open: mail error: connection refused".to_owned()]);
        assert_eq!(diagnostics.snapshot().swallowed_failures, 1);
    }
}
