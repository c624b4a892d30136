//! Вспомогательные функции: пути, имя процесса, имя машины.

use std::env;
use std::path::{PathBuf, MAIN_SEPARATOR};

/// Превращает путь из настроек в путь ОС.
/// Префикс `~/` (корень приложения) отбрасывается, разделители приводятся
/// к системным, относительный путь считается от каталога исполняемого файла.
pub fn resolve_path(virtual_path: &str) -> PathBuf {
    let stripped = virtual_path.strip_prefix("~/").unwrap_or(virtual_path);
    let normalized: String = stripped
        .chars()
        .map(|c| if c == '/' || c == '\\' { MAIN_SEPARATOR } else { c })
        .collect();
    let path = PathBuf::from(normalized);

    if path.is_absolute() {
        path
    } else {
        base_directory().join(path)
    }
}

fn base_directory() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_default()
}

pub fn process_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "unknown".to_owned())
}

pub fn machine_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_owned())
}
