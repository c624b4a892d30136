#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use logwriter::{AlertMail, AlertSinks, Config, EventLevel, EventSink, LogError, MailSettings, MailTransport};

pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Reported {
    pub source: String,
    pub level: EventLevel,
    pub message: String,
}

pub struct RecordingEventLog {
    tx: Sender<Reported>,
    fail: bool,
}

impl EventSink for RecordingEventLog {
    fn report(&self, source: &str, level: EventLevel, message: &str) -> Result<(), LogError> {
        let _ = self.tx.send(Reported {
            source: source.to_owned(),
            level,
            message: message.to_owned(),
        });
        if self.fail {
            Err(LogError::EventLog("access denied".into()))
        } else {
            Ok(())
        }
    }
}

pub enum MailBehaviour {
    Accept,
    Refuse,
    Panic,
}

pub struct RecordingMail {
    tx: Sender<AlertMail>,
    behaviour: MailBehaviour,
}

impl MailTransport for RecordingMail {
    fn send(&self, _settings: &MailSettings, mail: &AlertMail) -> Result<(), LogError> {
        let _ = self.tx.send(mail.clone());
        match self.behaviour {
            MailBehaviour::Accept => Ok(()),
            MailBehaviour::Refuse => Err(LogError::Mail("connection refused".into())),
            MailBehaviour::Panic => panic!("transport exploded"),
        }
    }
}

pub struct Sinks {
    pub sinks: AlertSinks,
    pub events: Receiver<Reported>,
    pub mails: Receiver<AlertMail>,
}

pub fn sinks(event_log_fails: bool, mail: MailBehaviour) -> Sinks {
    let (event_tx, events) = unbounded();
    let (mail_tx, mails) = unbounded();
    let sinks = AlertSinks::new(
        Arc::new(RecordingEventLog {
            tx: event_tx,
            fail: event_log_fails,
        }),
        Arc::new(RecordingMail {
            tx: mail_tx,
            behaviour: mail,
        }),
    );
    Sinks { sinks, events, mails }
}

/// Включённая конфигурация с логом `<root>/logs/app.log`.
pub fn config(root: &Path) -> Config {
    let mut config = Config::enabled_at(root.join("logs").join("app.log"));
    config.min_priority = 1;
    config.max_priority = 4;
    config
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

pub fn log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default();
    files.sort();
    files
}

/// Ждёт `count` записей уровня Error в журнале событий.
pub fn wait_for_errors(events: &Receiver<Reported>, count: usize) -> Vec<Reported> {
    let mut errors = Vec::new();
    while errors.len() < count {
        match events.recv_timeout(WAIT) {
            Ok(r) if r.level == EventLevel::Error => errors.push(r),
            Ok(_) => {}
            Err(_) => break,
        }
    }
    errors
}
