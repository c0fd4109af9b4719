use std::fmt;

use log::{info, warn};

use crate::security::redact_sas;

/// Whether a logged operation succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub outcome: Outcome,
    pub line: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Ordered, append-only record of every outcome in a run.
///
/// Each stage takes `&mut RunLog`; the publisher renders it once at the end.
/// Lines are redacted before they are stored, and echoed to the terminal
/// logger as they are added.
#[derive(Debug, Default)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self, line: impl Into<String>) {
        let line = redact_sas(&line.into());
        info!("{}", line);
        self.entries.push(LogEntry {
            outcome: Outcome::Success,
            line,
        });
    }

    pub fn failure(&mut self, line: impl Into<String>) {
        let line = redact_sas(&line.into());
        warn!("{}", line);
        self.entries.push(LogEntry {
            outcome: Outcome::Failure,
            line,
        });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome == Outcome::Failure).count()
    }

    /// Newline-joined text of every entry, in order
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
