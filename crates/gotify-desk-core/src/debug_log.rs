//! Bounded, user-visible debug log shown in the shell's debug panel.

use std::collections::VecDeque;

use chrono::Local;
use serde::Serialize;

pub const DEFAULT_LOG_CAPACITY: usize = 100;
pub const EMPTY_LOG_PLACEHOLDER: &str = "Waiting for logs...";
const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogSeverity {
    Info,
    Warn,
    Error,
}

impl LogSeverity {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Tag prepended to the console mirror of an entry.
    #[must_use]
    pub fn console_tag(self) -> &'static str {
        match self {
            Self::Info => "[Gotify Debug]",
            Self::Warn => "[Gotify Warn]",
            Self::Error => "[Gotify Error]",
        }
    }

    fn panel_marker(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Warn => "⚠️ ",
            Self::Error => "❌ ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugLogEntry {
    pub timestamp: String,
    pub message: String,
    pub severity: LogSeverity,
}

impl DebugLogEntry {
    pub fn new(severity: LogSeverity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            message: message.into(),
            severity,
        }
    }

    #[must_use]
    pub fn line(&self) -> String {
        format!("[{}] {}", self.timestamp, self.message)
    }
}

/// Where each entry is mirrored besides the panel.
pub trait ConsoleSink {
    fn emit(&self, severity: LogSeverity, message: &str);
}

/// Mirrors entries as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl ConsoleSink for TracingConsole {
    fn emit(&self, severity: LogSeverity, message: &str) {
        let tag = severity.console_tag();
        match severity {
            LogSeverity::Info => tracing::info!(target: "gotify_desk::debug", "{tag} {message}"),
            LogSeverity::Warn => tracing::warn!(target: "gotify_desk::debug", "{tag} {message}"),
            LogSeverity::Error => {
                tracing::error!(target: "gotify_desk::debug", "{tag} {message}");
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedLogLine {
    pub severity: LogSeverity,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugLogRender {
    Placeholder,
    /// Newest entry first.
    Lines(Vec<RenderedLogLine>),
}

#[derive(Debug, Clone)]
pub struct DebugLog {
    entries: VecDeque<DebugLogEntry>,
    capacity: usize,
    debug_enabled: bool,
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

impl DebugLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::new(),
            capacity,
            debug_enabled: true,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    /// Records a message; info entries are dropped while debug output is off.
    /// Returns whether an entry was appended.
    pub fn record(&mut self, severity: LogSeverity, message: &str) -> bool {
        if severity == LogSeverity::Info && !self.debug_enabled {
            return false;
        }
        let text = format!("{}{message}", severity.panel_marker());
        self.push(DebugLogEntry::new(severity, text));
        true
    }

    pub fn push(&mut self, entry: DebugLogEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest entry first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &DebugLogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn render(&self) -> DebugLogRender {
        if self.entries.is_empty() {
            return DebugLogRender::Placeholder;
        }
        DebugLogRender::Lines(
            self.entries
                .iter()
                .rev()
                .map(|entry| RenderedLogLine {
                    severity: entry.severity,
                    text: entry.line(),
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        let entries = self.entries.iter().collect::<Vec<_>>();
        serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())
    }
}
