//! Mapping of formatted `tracing` output onto browser console calls.

use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleMethod {
    Debug,
    Info,
    Warn,
    Error,
}

impl ConsoleMethod {
    pub(crate) fn for_level(level: Level) -> Self {
        if level == Level::ERROR {
            Self::Error
        } else if level == Level::WARN {
            Self::Warn
        } else if level == Level::INFO {
            Self::Info
        } else {
            Self::Debug
        }
    }
}

/// One formatted event, without the fmt layer's trailing newline. `None` when
/// nothing but whitespace was written.
pub(crate) fn console_text(buffer: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(buffer);
    let text = text.trim_end();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
