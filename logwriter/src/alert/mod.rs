//! Оповещения об исключениях.
//!
//! Каждое звено цепочки ошибок превращается в [`AlertEvent`] и уходит в
//! небольшой пул воркеров. Вызывающий поток никогда не ждёт: очередь
//! ограничена, при переполнении событие отбрасывается. Воркер делает две
//! независимые попытки — запись в системный журнал и письмо; сбой одной
//! не мешает другой, оба сбоя только считаются. Событие засчитывается как
//! доставленное, если удалась хотя бы одна попытка.

pub mod event_log;
pub mod mail;

use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Local};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::config::MailSettings;
use crate::error::{Diagnostics, FailurePolicy, LogError};
use crate::record::TIMESTAMP_FORMAT;

use event_log::{EventLevel, EventSink, SystemEventLog};
use mail::{MailTransport, SmtpMailer};

#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub logger_name: String,
    pub error_message: String,
    pub stack_trace: String,
    pub log_path: String,
    pub event_time: DateTime<Local>,
    pub mail: Arc<MailSettings>,
}

impl AlertEvent {
    fn event_log_message(&self) -> String {
        format!(
            "Exception : \n\nMessage: {} \n\nStack Trace: {} \n\nLogPath: {} \n\nTime: {}",
            self.error_message,
            self.stack_trace,
            self.log_path,
            self.event_time.format(TIMESTAMP_FORMAT)
        )
    }
}

// ===== Цепочка ошибок =====

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord {
    pub message: String,
    pub stack_trace: String,
}

/// Проходит цепочку `source()` от внешней ошибки к самой внутренней.
/// Внешнему звену достаётся снятый backtrace, если он реально захвачен,
/// остальным — их `Debug`-представление.
pub fn exception_chain(
    error: &(dyn Error + 'static),
    backtrace: Option<&Backtrace>,
) -> Vec<ExceptionRecord> {
    let mut records = Vec::new();
    let mut current = Some(error);
    while let Some(e) = current {
        let stack_trace = match backtrace {
            Some(bt) if records.is_empty() && bt.status() == BacktraceStatus::Captured => {
                bt.to_string()
            }
            _ => format!("{:?}", e),
        };
        records.push(ExceptionRecord {
            message: e.to_string(),
            stack_trace,
        });
        current = e.source();
    }
    records
}

// ===== Получатели оповещений =====

#[derive(Clone)]
pub struct AlertSinks {
    pub event_log: Arc<dyn EventSink>,
    pub mail: Arc<dyn MailTransport>,
}

impl AlertSinks {
    pub fn new(event_log: Arc<dyn EventSink>, mail: Arc<dyn MailTransport>) -> Self {
        Self { event_log, mail }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemEventLog), Arc::new(SmtpMailer))
    }
}

impl Default for AlertSinks {
    fn default() -> Self {
        Self::system()
    }
}

// ===== Пул воркеров =====

struct Delivery {
    sinks: AlertSinks,
    event_source: String,
    machine_name: String,
    diagnostics: Arc<Diagnostics>,
}

impl Delivery {
    fn deliver(&self, event: &AlertEvent) {
        let message = event.event_log_message();
        let logged = isolate("event log sink", || {
            self.sinks
                .event_log
                .report(&self.event_source, EventLevel::Error, &message)
        });
        let logged =
            FailurePolicy::swallow(&self.diagnostics, "write alert to event log", logged, |_| {});

        let composed = mail::compose(event, &self.machine_name);
        let sent = isolate("mail transport", || self.sinks.mail.send(&event.mail, &composed));
        let sent = FailurePolicy::swallow(&self.diagnostics, "send alert mail", sent, |msg| {
            let _ = self
                .sinks
                .event_log
                .report(&self.event_source, EventLevel::Warning, msg);
        });

        // Доставленным считается событие, дошедшее хотя бы до одного получателя.
        if logged.is_some() || sent.is_some() {
            self.diagnostics.record_dispatched_alert();
        }
    }

    fn run(self, receiver: Receiver<AlertEvent>) {
        for event in receiver.iter() {
            self.deliver(&event);
        }
    }
}

/// Паника чужой реализации не должна убить воркер.
fn isolate(
    what: &'static str,
    call: impl FnOnce() -> Result<(), LogError>,
) -> Result<(), LogError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|_| Err(LogError::Panicked(what)))
}

pub struct AlertDispatcher {
    sender: Option<Sender<AlertEvent>>,
    diagnostics: Arc<Diagnostics>,
}

impl AlertDispatcher {
    /// Диспетчер, который ничего не отправляет (оповещения выключены).
    pub fn disabled(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            sender: None,
            diagnostics,
        }
    }

    /// Запускает `workers` потоков над очередью на `queue_limit` событий.
    /// Потоки не присоединяются: они завершатся сами, когда диспетчер
    /// будет уничтожен и очередь опустеет.
    pub fn start(
        workers: usize,
        queue_limit: usize,
        sinks: AlertSinks,
        event_source: String,
        machine_name: String,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let (sender, receiver) = bounded(queue_limit.max(1));

        for i in 0..workers.max(1) {
            let delivery = Delivery {
                sinks: sinks.clone(),
                event_source: event_source.clone(),
                machine_name: machine_name.clone(),
                diagnostics: Arc::clone(&diagnostics),
            };
            let receiver = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("logwriter-alert-{}", i))
                .spawn(move || delivery.run(receiver))
                .map(|_| ())
                .map_err(LogError::from);
            FailurePolicy::swallow(&diagnostics, "spawn alert worker", spawned, |_| {});
        }

        Self {
            sender: Some(sender),
            diagnostics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Ставит событие в очередь, не блокируясь. `false` — событие отброшено.
    pub fn submit(&self, event: AlertEvent) -> bool {
        let sender = match self.sender {
            Some(ref s) => s,
            None => return false,
        };
        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.diagnostics.record_dropped_alert();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::time::Duration;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl Error for Layer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            self.source.as_deref().map(|s| s as &(dyn Error + 'static))
        }
    }

    #[test]
    fn chain_is_walked_outermost_first() {
        let error = Layer {
            message: "request failed",
            source: Some(Box::new(Layer {
                message: "connection reset",
                source: None,
            })),
        };
        let records = exception_chain(&error, None);
        let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["request failed", "connection reset"]);
        assert!(records[1].stack_trace.contains("connection reset"));
    }

    #[test]
    fn captured_backtrace_goes_to_outermost_entry() {
        let error = Layer {
            message: "outer",
            source: Some(Box::new(Layer {
                message: "inner",
                source: None,
            })),
        };
        let backtrace = Backtrace::force_capture();
        let records = exception_chain(&error, Some(&backtrace));
        assert_eq!(records[0].stack_trace, backtrace.to_string());
        assert!(records[1].stack_trace.contains("inner"));
    }

    struct BlockingSink {
        gate: Receiver<()>,
    }

    impl EventSink for BlockingSink {
        fn report(&self, _: &str, _: EventLevel, _: &str) -> Result<(), LogError> {
            let _ = self.gate.recv_timeout(Duration::from_secs(5));
            Ok(())
        }
    }

    struct NoMail;

    impl MailTransport for NoMail {
        fn send(&self, _: &MailSettings, _: &mail::AlertMail) -> Result<(), LogError> {
            Err(LogError::Mail("offline".into()))
        }
    }

    fn event() -> AlertEvent {
        AlertEvent {
            logger_name: "test".into(),
            error_message: "boom".into(),
            stack_trace: String::new(),
            log_path: "/tmp/app_0.log".into(),
            event_time: Local::now(),
            mail: Arc::new(MailSettings::default()),
        }
    }

    #[test]
    fn full_queue_drops_instead_of_blocking() {
        let (release, gate) = bounded(16);
        let sink = Arc::new(BlockingSink { gate });
        let diagnostics = Arc::new(Diagnostics::default());
        let dispatcher = AlertDispatcher::start(
            1,
            1,
            AlertSinks::new(sink.clone(), Arc::new(NoMail)),
            "LogWriter test".into(),
            "host".into(),
            Arc::clone(&diagnostics),
        );

        // Один в работе у воркера, один в очереди, остальные не влезают.
        let accepted = (0..10).filter(|_| dispatcher.submit(event())).count();
        assert!(accepted <= 2);
        assert!(diagnostics.snapshot().dropped_alerts >= 8);

        for _ in 0..16 {
            let _ = release.send(());
        }
    }

    #[test]
    fn disabled_dispatcher_accepts_nothing() {
        let dispatcher = AlertDispatcher::disabled(Arc::new(Diagnostics::default()));
        assert!(!dispatcher.is_enabled());
        assert!(!dispatcher.submit(event()));
    }
}
