//! 時系列トレースログ
//!
//! UI操作をコンソールへ出力しつつ、直近分をメモリ上のリングに保持する。
//! 永続化はしない（リロードで消える）

use serde::Serialize;
use std::collections::VecDeque;

const MAX_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: String, // "info", "warn", "error"
    pub category: String, // "ui-action", "invite", etc.
    pub message: String,
    pub data: Option<serde_json::Value>,
}

pub struct LogTrace {
    logs: VecDeque<LogEntry>,
}

impl LogTrace {
    pub fn new() -> Self {
        LogTrace {
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        }
    }

    /// リングに記録する（コンソール出力は呼び出し側）
    pub fn record(&mut self, entry: LogEntry) {
        if self.logs.len() >= MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.logs.push_back(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.logs.iter()
    }

    pub fn to_json(&self) -> String {
        let logs: Vec<&LogEntry> = self.logs.iter().collect();
        serde_json::to_string_pretty(&logs).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn clear(&mut self) {
        self.logs.clear();
    }
}

impl Default for LogTrace {
    fn default() -> Self {
        Self::new()
    }
}

// グローバルなログトレースインスタンス
thread_local! {
    static LOG_TRACE: std::cell::RefCell<LogTrace> = std::cell::RefCell::new(LogTrace::new());
}

fn log(level: &str, category: &str, message: &str, data: Option<serde_json::Value>) {
    let line = format!("[{}] {}", category, message);
    match level {
        "error" => web_sys::console::error_1(&line.into()),
        "warn" => web_sys::console::warn_1(&line.into()),
        _ => web_sys::console::log_1(&line.into()),
    }

    let timestamp = js_sys::Date::new_0()
        .to_iso_string()
        .as_string()
        .unwrap_or_default();
    LOG_TRACE.with(|trace| {
        trace.borrow_mut().record(LogEntry {
            timestamp,
            level: level.to_string(),
            category: category.to_string(),
            message: message.to_string(),
            data,
        });
    });
}

pub fn log_info(category: &str, message: &str) {
    log("info", category, message, None);
}

pub fn log_info_with_data(category: &str, message: &str, data: serde_json::Value) {
    log("info", category, message, Some(data));
}

pub fn log_warn(category: &str, message: &str) {
    log("warn", category, message, None);
}

pub fn log_error(category: &str, message: &str) {
    log("error", category, message, None);
}

pub fn get_logs_json() -> String {
    LOG_TRACE.with(|trace| trace.borrow().to_json())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> LogEntry {
        LogEntry {
            timestamp: String::new(),
            level: "info".to_string(),
            category: "test".to_string(),
            message: format!("entry {}", n),
            data: None,
        }
    }

    #[test]
    fn test_ring_drops_oldest_entry() {
        let mut trace = LogTrace::new();
        for n in 0..MAX_LOG_ENTRIES + 10 {
            trace.record(entry(n));
        }
        assert_eq!(trace.entries().count(), MAX_LOG_ENTRIES);
        assert_eq!(trace.entries().next().unwrap().message, "entry 10");
    }

    #[test]
    fn test_to_json_is_always_valid() {
        let mut trace = LogTrace::new();
        trace.record(entry(0));
        let json = trace.to_json();
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }
}
