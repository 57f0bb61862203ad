//! Verbose developer console for the plugin.
//!
//! Operational events go through `tracing`. This logger is the human-facing
//! console enabled by the plugin's `verbose` flag: one line per event with a
//! timestamp, level tag and source tag, plus an optional tree-prefixed dump of
//! attached data. Output is colorized only when the sink is a terminal.
//!
//! ```text
//! [2024-05-01T12:00:00.000Z] INFO [discord-webhook] reply started
//!   ├─ {
//!   ├─   "interaction_id": "123"
//!   └─ }
//! ```

use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, PoisonError};

/// Source tag printed on every line.
pub const SOURCE_TAG: &str = "discord-webhook";

/// Serialized payloads longer than this many characters are truncated.
pub const MAX_PAYLOAD_CHARS: usize = 5000;

/// Appended to a truncated payload.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Maximum number of `source()` entries printed by [`ConsoleLogger::error_report`].
pub const MAX_ERROR_CHAIN: usize = 3;

const DIVIDER_WIDTH: usize = 60;
const BRANCH: &str = "├─";
const LAST_BRANCH: &str = "└─";

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
    Debug,
}

impl LogLevel {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "SUCCESS",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Debug => "DEBUG",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Info => "\x1b[36m",
            Self::Success => "\x1b[32m",
            Self::Warn => "\x1b[33m",
            Self::Error => "\x1b[31m",
            Self::Debug => "\x1b[35m",
        }
    }
}

/// Leveled console logger. Every operation is a no-op when disabled.
pub struct ConsoleLogger {
    enabled: bool,
    colored: bool,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleLogger {
    /// Logger writing to stdout, colorized when stdout is a terminal.
    pub fn new(enabled: bool) -> Self {
        let colored = io::stdout().is_terminal();
        Self::with_writer(enabled, colored, Box::new(io::stdout()))
    }

    pub fn disabled() -> Self {
        Self::with_writer(false, false, Box::new(io::sink()))
    }

    /// Logger writing to an arbitrary sink.
    pub fn with_writer(enabled: bool, colored: bool, writer: Box<dyn Write + Send>) -> Self {
        Self {
            enabled,
            colored,
            sink: Mutex::new(writer),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn info_with<T: Serialize + ?Sized>(&self, message: &str, data: &T) {
        self.log_data(LogLevel::Info, message, data);
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Success, message, None);
    }

    pub fn success_with<T: Serialize + ?Sized>(&self, message: &str, data: &T) {
        self.log_data(LogLevel::Success, message, data);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn warn_with<T: Serialize + ?Sized>(&self, message: &str, data: &T) {
        self.log_data(LogLevel::Warn, message, data);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }

    pub fn error_with<T: Serialize + ?Sized>(&self, message: &str, data: &T) {
        self.log_data(LogLevel::Error, message, data);
    }

    /// Log an error value: its message followed by up to
    /// [`MAX_ERROR_CHAIN`] entries of its source chain.
    pub fn error_report(&self, message: &str, error: &(dyn std::error::Error + 'static)) {
        if !self.enabled {
            return;
        }
        let mut detail = vec![error.to_string()];
        let mut source = error.source();
        while let Some(cause) = source {
            if detail.len() > MAX_ERROR_CHAIN {
                break;
            }
            detail.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        self.log(LogLevel::Error, message, Some(detail));
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn debug_with<T: Serialize + ?Sized>(&self, message: &str, data: &T) {
        self.log_data(LogLevel::Debug, message, data);
    }

    /// Print a horizontal rule.
    pub fn divider(&self) {
        if !self.enabled {
            return;
        }
        let rule = "─".repeat(DIVIDER_WIDTH);
        let line = if self.colored {
            format!("{}{}{}", DIM, rule, RESET)
        } else {
            rule
        };
        self.write_lines(&[line]);
    }

    /// Print a titled banner framed by rules.
    pub fn section(&self, title: &str) {
        if !self.enabled {
            return;
        }
        let rule = "═".repeat(DIVIDER_WIDTH);
        let title = format!("  {}", title);
        let lines = if self.colored {
            vec![
                format!("{}{}{}", DIM, rule, RESET),
                format!("{}{}{}", BOLD, title, RESET),
                format!("{}{}{}", DIM, rule, RESET),
            ]
        } else {
            vec![rule.clone(), title, rule]
        };
        self.write_lines(&lines);
    }

    fn log_data<T: Serialize + ?Sized>(&self, level: LogLevel, message: &str, data: &T) {
        if !self.enabled {
            return;
        }
        let rendered = format_payload(data);
        let detail = rendered.lines().map(str::to_string).collect();
        self.log(level, message, Some(detail));
    }

    fn log(&self, level: LogLevel, message: &str, detail: Option<Vec<String>>) {
        if !self.enabled {
            return;
        }
        let mut lines = vec![self.format_line(level, message)];
        if let Some(detail) = detail {
            lines.extend(tree_lines(&detail));
        }
        self.write_lines(&lines);
    }

    fn format_line(&self, level: LogLevel, message: &str) -> String {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        if self.colored {
            format!(
                "{dim}[{ts}]{reset} {color}{bold}{tag}{reset} {dim}[{source}]{reset} {message}",
                dim = DIM,
                reset = RESET,
                bold = BOLD,
                color = level.color(),
                ts = timestamp,
                tag = level.tag(),
                source = SOURCE_TAG,
                message = message,
            )
        } else {
            format!(
                "[{}] {} [{}] {}",
                timestamp,
                level.tag(),
                SOURCE_TAG,
                message
            )
        }
    }

    fn write_lines(&self, lines: &[String]) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        for line in lines {
            // Console output is best effort.
            let _ = writeln!(sink, "{}", line);
        }
        let _ = sink.flush();
    }
}

impl std::fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleLogger")
            .field("enabled", &self.enabled)
            .field("colored", &self.colored)
            .finish_non_exhaustive()
    }
}

/// Serialize `data` as indented JSON, truncated to [`MAX_PAYLOAD_CHARS`].
///
/// Values that cannot be serialized render as `<unserializable: reason>`
/// instead of failing the log call.
pub fn format_payload<T: Serialize + ?Sized>(data: &T) -> String {
    match serde_json::to_string_pretty(data) {
        Ok(text) => truncate_payload(&text),
        Err(e) => format!("<unserializable: {}>", e),
    }
}

/// Cut `text` to [`MAX_PAYLOAD_CHARS`] characters followed by
/// [`TRUNCATION_MARKER`]; shorter text is returned unchanged.
pub fn truncate_payload(text: &str) -> String {
    match text.char_indices().nth(MAX_PAYLOAD_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

/// Prefix each line with a tree connector, closing the last one.
fn tree_lines(lines: &[String]) -> Vec<String> {
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let connector = if i == last { LAST_BRANCH } else { BRANCH };
            format!("  {} {}", connector, line)
        })
        .collect()
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
