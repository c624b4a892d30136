//! Выбор текущего файла лога и ротация по размеру.
//!
//! Поток лога — это пул файлов `<dir>/<name>_<N>.<ext>`, `N` от 0 до
//! `max_file_count - 1`. Когда текущий файл превышает лимит, индекс
//! увеличивается; после последнего индекса пул начинается заново с 0,
//! а старое содержимое файла 0 удаляется.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::LogError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationLimits {
    /// 0 — без ограничения.
    pub size_kb: u64,
    pub max_file_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    directory: PathBuf,
    base_name: String,
    extension: String,
    current_index: u64,
    current_path: PathBuf,
}

impl LogTarget {
    /// Разбирает путь-ключ. Хвост `_<цифры>` у имени файла задаёт начальный
    /// индекс и из имени убирается.
    pub fn parse<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let (base_name, current_index) = match stem.rsplit_once('_') {
            Some((name, digits))
                if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
            {
                match digits.parse::<u64>() {
                    Ok(index) => (name.to_owned(), index),
                    Err(_) => (stem.clone(), 0),
                }
            }
            _ => (stem.clone(), 0),
        };

        let mut target = LogTarget {
            directory,
            base_name,
            extension,
            current_index,
            current_path: PathBuf::new(),
        };
        target.current_path = target.compose_path();
        target
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    fn compose_path(&self) -> PathBuf {
        let file_name = if self.extension.is_empty() {
            format!("{}_{}", self.base_name, self.current_index)
        } else {
            format!("{}_{}.{}", self.base_name, self.current_index, self.extension)
        };
        self.directory.join(file_name)
    }

    /// Переходит к следующему файлу пула. Возвращает `true`, если пул
    /// начался заново (индекс снова 0).
    pub fn advance(&mut self, max_file_count: u64) -> bool {
        let next = self.current_index.saturating_add(1);
        let wrapped = next >= max_file_count.max(1);
        self.current_index = if wrapped { 0 } else { next };
        self.current_path = self.compose_path();
        wrapped
    }

    /// Возвращает путь, куда писать следующую запись, при необходимости
    /// продвигаясь по пулу. Ошибки удаления отдаются в `on_error`.
    pub fn resolve(
        &mut self,
        limits: RotationLimits,
        mut on_error: impl FnMut(LogError),
    ) -> &Path {
        if limits.size_kb == 0 {
            return &self.current_path;
        }

        // Каждый круг либо находит файл в пределах лимита, либо удаляет файл 0,
        // так что хватает max_file_count + 1 шагов.
        let max_steps = limits.max_file_count.max(1).saturating_add(1);
        for _ in 0..max_steps {
            if !exceeds_limit(&self.current_path, limits.size_kb) {
                break;
            }
            if self.advance(limits.max_file_count) {
                match fs::remove_file(&self.current_path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => on_error(LogError::Io(e)),
                }
            }
        }
        &self.current_path
    }
}

fn exceeds_limit(path: &Path, size_kb: u64) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.len() / 1024 > size_kb,
        Err(_) => false,
    }
}

// ===== Реестр потоков =====

/// Ключ лога → его состояние ротации. Общий замок реестра держится только
/// на время поиска/вставки; дальше каждый поток сериализуется своим замком.
#[derive(Debug, Default)]
pub struct Registry {
    targets: Mutex<HashMap<String, Arc<Mutex<LogTarget>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Возвращает состояние ключа и признак того, что оно только что создано.
    pub fn get_or_register(&self, key: &str) -> (Arc<Mutex<LogTarget>>, bool) {
        let mut targets = self.targets.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(target) = targets.get(key) {
            return (Arc::clone(target), false);
        }
        let target = Arc::new(Mutex::new(LogTarget::parse(key)));
        targets.insert(key.to_owned(), Arc::clone(&target));
        (target, true)
    }

    pub fn len(&self) -> usize {
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
