// ===== Основной логгер =====

use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Local;

use crate::alert::event_log::{EventLevel, EventSink};
use crate::alert::{exception_chain, AlertDispatcher, AlertEvent, AlertSinks};
use crate::backup;
use crate::config::{Config, MailSettings, SettingsSource};
use crate::error::{Diagnostics, DiagnosticsSnapshot, FailurePolicy, LogError};
use crate::filter::{LogLevel, PriorityFilter, ALWAYS};
use crate::paths;
use crate::record::{append_record, format_record};
use crate::rotation::{LogTarget, Registry, RotationLimits};

struct Shared {
    config: Config,
    filter: PriorityFilter,
    limits: RotationLimits,
    registry: Registry,
    default_tag: RwLock<String>,
    mail: Arc<MailSettings>,
    dispatcher: AlertDispatcher,
    event_log: Arc<dyn EventSink>,
    event_source: String,
    process_name: String,
    diagnostics: Arc<Diagnostics>,
}

impl Shared {
    /// Единственная точка, через которую проходят ошибки файловых операций.
    fn swallow<T>(&self, context: &str, result: Result<T, LogError>) -> Option<T> {
        FailurePolicy::swallow(&self.diagnostics, context, result, |msg| {
            let _ = self
                .event_log
                .report(&self.event_source, EventLevel::Warning, msg);
        })
    }
}

/// Логгер: реестр ротируемых файлов, фильтр приоритетов и оповещения.
///
/// Клонирование дешёвое — клоны делят реестр, настройки и пул оповещений.
/// Клон, полученный через [`Logger::with_log_key`], пишет в другой поток файлов.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    log_key: Option<String>,
}

impl Logger {
    pub fn from_settings<S: SettingsSource + ?Sized>(source: &S) -> Self {
        Self::new(Config::from_settings(source))
    }

    pub fn new(config: Config) -> Self {
        Self::with_sinks(config, AlertSinks::system())
    }

    pub fn with_sinks(config: Config, sinks: AlertSinks) -> Self {
        let diagnostics = Arc::new(Diagnostics::default());
        let process_name = paths::process_name();
        let event_source = format!("{} {}", config.event_source_prefix, process_name);

        let dispatcher = if config.enabled && config.alert_threshold > 0 {
            AlertDispatcher::start(
                config.alert_workers,
                config.alert_queue_limit,
                sinks.clone(),
                event_source.clone(),
                paths::machine_name(),
                Arc::clone(&diagnostics),
            )
        } else {
            AlertDispatcher::disabled(Arc::clone(&diagnostics))
        };

        let shared = Shared {
            filter: PriorityFilter::new(config.enabled, config.min_priority, config.max_priority),
            limits: RotationLimits {
                size_kb: config.rotation_size_kb,
                max_file_count: config.max_file_count,
            },
            registry: Registry::new(),
            default_tag: RwLock::new(String::new()),
            mail: Arc::new(config.mail.clone()),
            dispatcher,
            event_log: sinks.event_log,
            event_source,
            process_name,
            diagnostics,
            config,
        };

        if shared.config.enabled {
            prepare_log_directory(&shared);
        }

        Logger {
            shared: Arc::new(shared),
            log_key: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Клон логгера, пишущий в поток файлов с другим ключом.
    /// Ключ регистрируется сразу (если логгирование включено).
    pub fn with_log_key<P: AsRef<Path>>(&self, path: P) -> Logger {
        let key = path.as_ref().to_string_lossy().into_owned();
        if self.shared.config.enabled && !key.is_empty() {
            self.register(&key);
        }
        Logger {
            shared: Arc::clone(&self.shared),
            log_key: Some(key),
        }
    }

    pub fn set_default_tag(&self, tag: &str) {
        *self
            .shared
            .default_tag
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tag.to_owned();
    }

    pub fn default_tag(&self) -> String {
        self.shared
            .default_tag
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Текущий файл для ключа этого логгера, с учётом ротации.
    pub fn file_path(&self) -> Option<PathBuf> {
        let key = self.key()?;
        let target = self.register(&key);
        let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);
        let shared = &self.shared;
        let path = target
            .resolve(shared.limits, |e| {
                shared.swallow::<()>("rotate log", Err(e));
            })
            .to_path_buf();
        Some(path)
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.shared.diagnostics.snapshot()
    }

    // ----- запись -----

    /// Пишет текст с тегом и приоритетом. Всегда возвращает `true`:
    /// ошибки записи не видны вызывающему.
    pub fn write(&self, text: &str, tag: &str, priority: i64) -> bool {
        if let Some(key) = self.key() {
            if self.shared.filter.should_log(priority, true) {
                self.append(&key, &[(tag, vec![text])]);
            }
        }
        true
    }

    /// То же, что [`Logger::write`], с тегом по умолчанию.
    pub fn write_default(&self, text: &str, priority: i64) -> bool {
        let tag = self.default_tag();
        self.write(text, &tag, priority)
    }

    pub fn write_level(&self, level: LogLevel, args: fmt::Arguments<'_>) -> bool {
        if !self.shared.filter.should_log(level.priority(), self.key().is_some()) {
            return true;
        }
        self.write_default(&args.to_string(), level.priority())
    }

    pub fn write_debug(&self, args: fmt::Arguments<'_>) -> bool {
        self.write_level(LogLevel::Debug, args)
    }

    pub fn write_info(&self, args: fmt::Arguments<'_>) -> bool {
        self.write_level(LogLevel::Info, args)
    }

    pub fn write_warning(&self, args: fmt::Arguments<'_>) -> bool {
        self.write_level(LogLevel::Warning, args)
    }

    pub fn write_error(&self, args: fmt::Arguments<'_>) -> bool {
        self.write_level(LogLevel::Error, args)
    }

    /// Пишет каждое звено цепочки ошибок (тег — сообщение, тело — стек)
    /// и, если оповещения включены, ставит по оповещению на звено.
    /// Все звенья попадают в один и тот же файл подряд.
    pub fn write_exception(&self, error: &(dyn Error + 'static)) -> bool {
        let key = match self.key() {
            Some(key) if self.shared.filter.should_log(ALWAYS, true) => key,
            _ => return true,
        };

        let backtrace = Backtrace::capture();
        let chain = exception_chain(error, Some(&backtrace));
        let entries: Vec<(&str, Vec<&str>)> = chain
            .iter()
            .map(|r| (r.message.as_str(), r.stack_trace.lines().collect()))
            .collect();
        let path = self.append(&key, &entries);

        if self.shared.config.alert_threshold > 0 {
            let log_path = path.display().to_string();
            for record in chain {
                self.shared.dispatcher.submit(AlertEvent {
                    logger_name: self.shared.process_name.clone(),
                    error_message: record.message,
                    stack_trace: record.stack_trace,
                    log_path: log_path.clone(),
                    event_time: Local::now(),
                    mail: Arc::clone(&self.shared.mail),
                });
            }
        }
        true
    }

    // ----- внутреннее -----

    fn key(&self) -> Option<String> {
        if !self.shared.config.enabled {
            return None;
        }
        let key = match self.log_key {
            Some(ref key) => key.clone(),
            None => self
                .shared
                .config
                .initial_log_path
                .to_string_lossy()
                .into_owned(),
        };
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    fn register(&self, key: &str) -> Arc<Mutex<LogTarget>> {
        let (target, created) = self.shared.registry.get_or_register(key);
        if created {
            let dir = target
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .directory()
                .to_path_buf();
            self.shared
                .swallow("create log directory", fs::create_dir_all(&dir).map_err(LogError::from));
        }
        target
    }

    /// Выбор файла и дозапись выполняются под замком ключа: чужая ротация
    /// не может вклиниться между ними.
    fn append(&self, key: &str, entries: &[(&str, Vec<&str>)]) -> PathBuf {
        let target = self.register(key);
        let mut target = target.lock().unwrap_or_else(PoisonError::into_inner);
        let shared = &self.shared;
        let path = target
            .resolve(shared.limits, |e| {
                shared.swallow::<()>("rotate log", Err(e));
            })
            .to_path_buf();

        let now = Local::now();
        let records: String = entries
            .iter()
            .map(|(tag, lines)| format_record(now, tag, lines))
            .collect();
        shared.swallow("write log record", append_record(&path, &records));
        path
    }
}

/// Резервная копия старого каталога и создание нового. Ошибки не мешают старту.
fn prepare_log_directory(shared: &Shared) {
    let dir = match shared.config.initial_log_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => return,
    };
    if shared.config.backup_on_startup {
        shared.swallow("back up log directory", backup::backup_directory(&dir, Local::now()));
    }
    shared.swallow(
        "create log directory",
        fs::create_dir_all(&dir).map_err(LogError::from),
    );
}
