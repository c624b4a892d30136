//! Резервная копия каталога логов при старте.
//!
//! Если каталог начального лога уже существует, он переименовывается в
//! `<имя>_<дд>_<Мес>_<гггг>_<тики>` рядом с собой, а на его месте создаётся
//! пустой. Тики — интервалы по 100 нс от 0001-01-01 по местному времени.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::LogError;

/// Число 100-наносекундных тиков от 0001-01-01 до 1970-01-01.
const TICKS_AT_UNIX_EPOCH: i64 = 621_355_968_000_000_000;

pub fn backup_name(dir_name: &str, now: DateTime<Local>) -> String {
    format!("{}_{}_{}", dir_name, now.format("%d_%b_%Y"), ticks(now))
}

fn ticks(now: DateTime<Local>) -> i64 {
    let local = now.naive_local().and_utc();
    let nanos = local.timestamp_nanos_opt().unwrap_or(0);
    TICKS_AT_UNIX_EPOCH + nanos / 100
}

/// Переносит существующий каталог в резервный. `Ok(None)` — переносить нечего.
pub fn backup_directory(dir: &Path, now: DateTime<Local>) -> Result<Option<PathBuf>, LogError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let name = match dir.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return Ok(None),
    };
    let target = dir
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(backup_name(&name, now));
    fs::rename(dir, &target)?;
    Ok(Some(target))
}
