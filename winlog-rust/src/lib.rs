//! # logwriter-winlog
//!
//! Запись в Windows Event Log для logwriter.
//! Источник регистрируется в журнале "Application" при первом обращении,
//! если его ещё нет в реестре. Если зарегистрировать не удалось (нет прав) —
//! пишем от имени "Application" с префиксом источника.

#![cfg(windows)]

use std::ffi::CString;
use windows_sys::core::PCSTR;
use windows_sys::Win32::Foundation::{ERROR_SUCCESS, PSID};
use windows_sys::Win32::System::EventLog::{
    DeregisterEventSource, RegisterEventSourceA, ReportEventA, EVENTLOG_ERROR_TYPE,
    EVENTLOG_INFORMATION_TYPE, EVENTLOG_WARNING_TYPE,
};
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegCreateKeyA, RegOpenKeyExA, RegSetValueExA, HKEY, HKEY_LOCAL_MACHINE,
    KEY_READ, REG_DWORD, REG_EXPAND_SZ,
};

const EVENTLOG_KEY: &str = r"SYSTEM\CurrentControlSet\Services\EventLog";
const MESSAGE_FILE: &str = r"%SystemRoot%\System32\EventCreate.exe";
const FALLBACK_SOURCE: &str = "Application";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Information,
    Warning,
    Error,
}

impl EventType {
    fn to_event_type(self) -> u16 {
        match self {
            EventType::Information => EVENTLOG_INFORMATION_TYPE,
            EventType::Warning => EVENTLOG_WARNING_TYPE,
            EventType::Error => EVENTLOG_ERROR_TYPE,
        }
    }
}

/// Одна запись журнала: тип, код события и категория.
#[derive(Debug, Clone, Copy)]
pub struct EventEntry<'a> {
    pub event_type: EventType,
    pub event_id: u32,
    pub category: u16,
    pub message: &'a str,
}

#[derive(Debug, Clone)]
pub struct WinEventLogger {
    source: String,
    log_name: String,
}

impl WinEventLogger {
    pub fn new(source: &str, log_name: &str) -> Self {
        Self {
            source: source.to_owned(),
            log_name: log_name.to_owned(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Проверяет наличие источника в реестре.
    pub fn source_exists(&self) -> bool {
        let path = format!(r"{}\{}\{}", EVENTLOG_KEY, self.log_name, self.source);
        let c_path = match to_cstring(&path) {
            Some(s) => s,
            None => return false,
        };
        let mut key: HKEY = 0;
        let status = unsafe {
            RegOpenKeyExA(HKEY_LOCAL_MACHINE, c_path.as_ptr() as PCSTR, 0, KEY_READ, &mut key)
        };
        if status != ERROR_SUCCESS {
            return false;
        }
        let _ = unsafe { RegCloseKey(key) };
        true
    }

    /// Регистрирует источник в журнале. Требует прав администратора.
    pub fn create_source(&self) -> bool {
        let path = format!(r"{}\{}\{}", EVENTLOG_KEY, self.log_name, self.source);
        let c_path = match to_cstring(&path) {
            Some(s) => s,
            None => return false,
        };
        let mut key: HKEY = 0;
        let status =
            unsafe { RegCreateKeyA(HKEY_LOCAL_MACHINE, c_path.as_ptr() as PCSTR, &mut key) };
        if status != ERROR_SUCCESS {
            return false;
        }

        let message_file = format!("{}\0", MESSAGE_FILE);
        let types_supported: u32 = 7;
        let ok_file = unsafe {
            RegSetValueExA(
                key,
                b"EventMessageFile\0".as_ptr(),
                0,
                REG_EXPAND_SZ,
                message_file.as_ptr(),
                message_file.len() as u32,
            )
        } == ERROR_SUCCESS;
        let ok_types = unsafe {
            RegSetValueExA(
                key,
                b"TypesSupported\0".as_ptr(),
                0,
                REG_DWORD,
                &types_supported as *const u32 as *const u8,
                std::mem::size_of::<u32>() as u32,
            )
        } == ERROR_SUCCESS;

        let _ = unsafe { RegCloseKey(key) };
        ok_file && ok_types
    }

    /// Пишет запись; при необходимости сначала регистрирует источник.
    /// Возвращает `false`, если не получилось ни от своего имени, ни через "Application".
    pub fn report(&self, entry: EventEntry<'_>) -> bool {
        if !self.source_exists() {
            let _ = self.create_source();
        }

        if try_report(&self.source, entry, entry.message) {
            return true;
        }

        let prefixed = format!("[{}] {}", self.source, entry.message);
        try_report(FALLBACK_SOURCE, entry, &prefixed)
    }
}

fn try_report(source: &str, entry: EventEntry<'_>, message: &str) -> bool {
    let c_source = match to_cstring(source) {
        Some(s) => s,
        None => return false,
    };
    let c_message = match to_cstring(message) {
        Some(s) => s,
        None => return false,
    };

    let source_ptr: PCSTR = c_source.as_ptr() as _;
    let msg_ptr: PCSTR = c_message.as_ptr() as _;

    let h_source = unsafe { RegisterEventSourceA(std::ptr::null(), source_ptr) };
    if h_source == 0 {
        return false;
    }

    let success: i32 = unsafe {
        ReportEventA(
            h_source,
            entry.event_type.to_event_type(),
            entry.category,
            entry.event_id,
            0 as PSID,
            1,
            0,
            &msg_ptr,
            std::ptr::null_mut(),
        )
    };

    let _ = unsafe { DeregisterEventSource(h_source) };

    success != 0
}

fn to_cstring(s: &str) -> Option<CString> {
    CString::new(s).ok()
}
