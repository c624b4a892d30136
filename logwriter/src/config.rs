//! Снимок настроек логгера.
//!
//! Настройки читаются один раз из любого источника "ключ → строка"
//! ([`SettingsSource`]) и дальше не меняются. Отсутствующие и кривые
//! числовые значения читаются как 0, отсутствие `EnableLog` или `"0"`
//! выключает логгирование целиком.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

pub const DEFAULT_MAX_FILE_COUNT: u64 = 10;
pub const DEFAULT_EVENT_SOURCE_PREFIX: &str = "LogWriter";
pub const DEFAULT_ALERT_WORKERS: usize = 2;
pub const DEFAULT_ALERT_QUEUE_LIMIT: usize = 64;

/// Имя секции в TOML-файле настроек.
pub const SETTINGS_SECTION: &str = "LoggingConfiguration";

// ===== Источники настроек =====

pub trait SettingsSource {
    fn get(&self, key: &str) -> Option<String>;
}

impl SettingsSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl SettingsSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).cloned()
    }
}

impl<S: SettingsSource + ?Sized> SettingsSource for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Переменные окружения с префиксом: `LOGWRITER_EnableLog`, `LOGWRITER_LogPath`, ...
#[derive(Debug, Clone)]
pub struct EnvSettings {
    prefix: String,
}

impl EnvSettings {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
        }
    }
}

impl Default for EnvSettings {
    fn default() -> Self {
        Self::new("LOGWRITER_")
    }
}

impl SettingsSource for EnvSettings {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{}", self.prefix, key)).ok()
    }
}

/// Секция `[LoggingConfiguration]` TOML-файла.
/// Значения любых скалярных типов приводятся к строке.
#[derive(Debug, Clone, Default)]
pub struct TomlSettings {
    values: HashMap<String, String>,
}

impl TomlSettings {
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = text.parse()?;
        let mut values = HashMap::new();
        if let Some(toml::Value::Table(section)) = table.get(SETTINGS_SECTION) {
            for (key, value) in section {
                let text = match value {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Boolean(b) => (if *b { "1" } else { "0" }).to_owned(),
                    toml::Value::Float(f) => f.to_string(),
                    _ => continue,
                };
                values.insert(key.clone(), text);
            }
        }
        Ok(Self { values })
    }

    /// Файл, который не читается или не парсится, даёт пустые настройки,
    /// то есть выключенный логгер.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|text| Self::parse(&text).ok())
            .unwrap_or_default()
    }
}

impl SettingsSource for TomlSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

// ===== Снимок =====

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailSettings {
    pub smtp_server: String,
    /// `None` — порт транспорта по умолчанию.
    pub smtp_port: Option<u16>,
    /// Адреса через `;`, пустые элементы пропускаются.
    pub recipients: String,
    pub sender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub enabled: bool,
    pub initial_log_path: PathBuf,
    /// 0 — без ограничения размера.
    pub rotation_size_kb: u64,
    pub max_file_count: u64,
    pub min_priority: i64,
    pub max_priority: i64,
    pub alert_threshold: i64,
    pub mail: MailSettings,
    pub event_source_prefix: String,
    pub alert_workers: usize,
    pub alert_queue_limit: usize,
    pub backup_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enabled: false,
            initial_log_path: PathBuf::new(),
            rotation_size_kb: 0,
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            min_priority: 0,
            max_priority: 0,
            alert_threshold: 0,
            mail: MailSettings::default(),
            event_source_prefix: DEFAULT_EVENT_SOURCE_PREFIX.to_owned(),
            alert_workers: DEFAULT_ALERT_WORKERS,
            alert_queue_limit: DEFAULT_ALERT_QUEUE_LIMIT,
            backup_on_startup: true,
        }
    }
}

impl Config {
    /// Включённая конфигурация для заданного файла, остальное по умолчанию.
    pub fn enabled_at<P: Into<PathBuf>>(log_path: P) -> Self {
        Config {
            enabled: true,
            initial_log_path: log_path.into(),
            ..Config::default()
        }
    }

    pub fn from_settings<S: SettingsSource + ?Sized>(source: &S) -> Self {
        let mut config = Config::default();

        match source.get("EnableLog") {
            Some(flag) if flag.trim() != "0" => {}
            _ => return config,
        }
        let log_path = match source.get("LogPath") {
            Some(p) if !p.trim().is_empty() => paths::resolve_path(p.trim()),
            _ => return config,
        };

        config.enabled = true;
        config.initial_log_path = log_path;
        config.rotation_size_kb = read_number(source, "LogSizeInKB").max(0) as u64;

        let max_files = read_number(source, "MaxLogFiles");
        if max_files > 0 {
            config.max_file_count = max_files as u64;
        }

        config.min_priority = read_number(source, "MinPriority");
        config.max_priority = read_number(source, "MaxPriority");

        let alert_level = read_number(source, "AlertLevel");
        if alert_level > 0 {
            config.alert_threshold = alert_level;
            let port = read_number(source, "MailPort");
            config.mail = MailSettings {
                smtp_server: source.get("MailServer").unwrap_or_default(),
                smtp_port: u16::try_from(port).ok().filter(|p| *p > 0),
                recipients: source.get("Recipients").unwrap_or_default(),
                sender: source.get("Sender").filter(|s| !s.trim().is_empty()),
            };
        }

        if let Some(prefix) = source.get("EventSourcePrefix").filter(|s| !s.trim().is_empty()) {
            config.event_source_prefix = prefix;
        }
        let workers = read_number(source, "AlertWorkers");
        if workers > 0 {
            config.alert_workers = workers as usize;
        }
        let queue = read_number(source, "AlertQueueLimit");
        if queue > 0 {
            config.alert_queue_limit = queue as usize;
        }
        if let Some(flag) = source.get("BackupOnStartup") {
            config.backup_on_startup = flag.trim() != "0";
        }

        config
    }
}

fn read_number<S: SettingsSource + ?Sized>(source: &S, key: &str) -> i64 {
    source
        .get(key)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_or_zero_enable_flag_disables_logging() {
        assert!(!Config::from_settings(&settings(&[])).enabled);
        let disabled = settings(&[("EnableLog", "0"), ("LogPath", "/var/log/app/app.log")]);
        assert!(!Config::from_settings(&disabled).enabled);
    }

    #[test]
    fn enabled_without_path_stays_disabled() {
        assert!(!Config::from_settings(&settings(&[("EnableLog", "1")])).enabled);
    }

    #[test]
    fn numeric_keys_default_to_zero_or_documented_defaults() {
        let config = Config::from_settings(&settings(&[
            ("EnableLog", "1"),
            ("LogPath", "/var/log/app/app.log"),
            ("LogSizeInKB", "not a number"),
            ("MinPriority", "1"),
            ("MaxPriority", "3"),
        ]));
        assert!(config.enabled);
        assert_eq!(config.rotation_size_kb, 0);
        assert_eq!(config.max_file_count, DEFAULT_MAX_FILE_COUNT);
        assert_eq!((config.min_priority, config.max_priority), (1, 3));
        assert_eq!(config.alert_threshold, 0);
        assert_eq!(config.mail, MailSettings::default());
    }

    #[test]
    fn mail_settings_are_read_only_when_alerts_enabled() {
        let config = Config::from_settings(&settings(&[
            ("EnableLog", "1"),
            ("LogPath", "/var/log/app/app.log"),
            ("AlertLevel", "1"),
            ("MailServer", "smtp.example.com"),
            ("MailPort", "2525"),
            ("Recipients", "ops@example.com;dev@example.com"),
            ("Sender", ""),
        ]));
        assert_eq!(config.alert_threshold, 1);
        assert_eq!(config.mail.smtp_server, "smtp.example.com");
        assert_eq!(config.mail.smtp_port, Some(2525));
        assert_eq!(config.mail.recipients, "ops@example.com;dev@example.com");
        assert_eq!(config.mail.sender, None);
    }

    #[test]
    fn toml_section_is_read_as_strings() {
        let text = r#"
            [LoggingConfiguration]
            EnableLog = 1
            LogPath = "/tmp/logs/app_3.log"
            LogSizeInKB = 512
            MaxLogFiles = 4
            BackupOnStartup = false
        "#;
        let config = Config::from_settings(&TomlSettings::parse(text).unwrap());
        assert!(config.enabled);
        assert_eq!(config.rotation_size_kb, 512);
        assert_eq!(config.max_file_count, 4);
        assert!(!config.backup_on_startup);
    }

    #[test]
    fn env_settings_read_prefixed_variables() {
        let prefix = format!("LOGWRITER_CFG_TEST_{}_", std::process::id());
        let log_path = std::env::temp_dir().join("logs").join("env.log");
        std::env::set_var(format!("{}EnableLog", prefix), "1");
        std::env::set_var(format!("{}LogPath", prefix), log_path.to_str().unwrap());
        std::env::set_var(format!("{}LogSizeInKB", prefix), "64");

        let config = Config::from_settings(&EnvSettings::new(&prefix));
        assert!(config.enabled);
        assert_eq!(config.initial_log_path, log_path);
        assert_eq!(config.rotation_size_kb, 64);
        assert_eq!((config.min_priority, config.max_priority), (0, 0));
        assert_eq!(config.max_file_count, DEFAULT_MAX_FILE_COUNT);

        // Без префикса те же ключи не видны.
        assert!(!Config::from_settings(&EnvSettings::new("LOGWRITER_CFG_TEST_OTHER_")).enabled);

        for key in ["EnableLog", "LogPath", "LogSizeInKB"] {
            std::env::remove_var(format!("{}{}", prefix, key));
        }
    }

    #[test]
    fn unreadable_toml_file_disables_logging() {
        let source = TomlSettings::load("/definitely/not/here.toml");
        assert!(!Config::from_settings(&source).enabled);
    }
}
