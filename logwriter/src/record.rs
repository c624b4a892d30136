// ===== Формат записи и дозапись в файл =====

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};

use crate::error::LogError;

pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S%.3f %p";
pub const FIELD_SEPARATOR: &str = "\t";
/// Продолжение многострочной записи: строки остаются под одной меткой времени.
pub const LINE_CONTINUATION: &str = "\n\t\t\t\t\t";

/// `<время>\t<тег>\t<строка>[\n\t\t\t\t\t<строка>...]\n`
///
/// Переводы строк внутри текста становятся строками продолжения, а в теге
/// заменяются пробелом: запись всегда начинается с метки времени.
pub fn format_record(time: DateTime<Local>, tag: &str, lines: &[&str]) -> String {
    let mut record = String::with_capacity(64 + lines.iter().map(|l| l.len()).sum::<usize>());
    record.push_str(&time.format(TIMESTAMP_FORMAT).to_string());
    record.push_str(FIELD_SEPARATOR);
    record.extend(tag.chars().filter(|&c| c != '\r').map(|c| {
        if c == '\n' || c == '\t' {
            ' '
        } else {
            c
        }
    }));
    record.push_str(FIELD_SEPARATOR);
    let body: Vec<&str> = lines
        .iter()
        .flat_map(|line| line.split('\n'))
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    record.push_str(&body.join(LINE_CONTINUATION));
    record.push('\n');
    record
}

/// Открывает файл на дозапись и пишет запись одним вызовом.
pub fn append_record(path: &Path, record: &str) -> Result<(), LogError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(record.as_bytes())?;
    file.flush()?;
    Ok(())
}
