use std::io::{self, IsTerminal, Write};

use crate::Severity;

/// Where formatted records end up. Implementations must be shareable
/// between threads; one sink typically serves every component of a
/// process.
pub trait LogSink: Send + Sync {
    fn log(&self, severity: Severity, token: Option<&str>, message: &str);
}

/// Default sink: one line per record on standard error, with an
/// ISO-8601 timestamp and the bracketed severity tag, colored when
/// stderr is a terminal.
pub struct StderrSink;

impl LogSink for StderrSink {
    fn log(&self, severity: Severity, token: Option<&str>, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");
        let mut stderr = io::stderr().lock();
        let result = if io::stderr().is_terminal() {
            writeln!(
                stderr,
                "{} {}[{}{}{}]\x1b[0m {}",
                timestamp,
                severity.color(),
                severity.tag(),
                if token.is_some() { "/" } else { "" },
                token.unwrap_or(""),
                message,
            )
        } else {
            writeln!(
                stderr,
                "{} [{}{}{}] {}",
                timestamp,
                severity.tag(),
                if token.is_some() { "/" } else { "" },
                token.unwrap_or(""),
                message,
            )
        };
        // best effort
        let _ = result;
    }
}

/// Bridge sink that hands records to the `tracing` ecosystem, for
/// processes that already run a `tracing` subscriber. Severities beyond
/// the five `tracing` levels collapse onto their nearest neighbour.
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, severity: Severity, token: Option<&str>, message: &str) {
        let token = token.unwrap_or("");
        match severity {
            Severity::Emergency | Severity::Alert | Severity::Critical | Severity::Error => {
                tracing::error!(token, "{}", message)
            }
            Severity::Warning => tracing::warn!(token, "{}", message),
            Severity::Notice | Severity::Info => tracing::info!(token, "{}", message),
            Severity::Debug => tracing::debug!(token, "{}", message),
        }
    }
}
