//! Leveled, token-filtered, redirectable diagnostic output.
//!
//! Instead of a process-global logger there is an explicitly passed
//! [`Logger`] handle, so components can be wired to independent sinks
//! and tested without process-wide side effects. A handle is cheap to
//! clone and may be shared freely between threads.

use std::fmt;
use std::io;
use std::process;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod sink;

pub use sink::{LogSink, StderrSink, TracingSink};

/// Upper bound on registered debug tokens.
pub const MAX_DEBUG_TOKENS: usize = 40;

/// Syslog-ordered severities. Lower means more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Emergency,
    Alert,
    Critical,
    Error,
    Warning,
    Notice,
    Info,
    Debug,
}

impl Severity {
    /// Four-character column tag used by [`StderrSink`].
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Emergency => "EMRG",
            Severity::Alert => "ALRT",
            Severity::Critical => "CRIT",
            Severity::Error => " ERR",
            Severity::Warning => "WARN",
            Severity::Notice => "NOTI",
            Severity::Info => "INFO",
            Severity::Debug => " DBG",
        }
    }

    pub(crate) fn color(self) -> &'static str {
        match self {
            Severity::Emergency | Severity::Alert | Severity::Critical => "\x1b[1;37;41m",
            Severity::Error => "\x1b[1;31m",
            Severity::Warning => "\x1b[1;33m",
            Severity::Notice | Severity::Info => "\x1b[1;34m",
            Severity::Debug => "\x1b[1;30m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().trim_start())
    }
}

struct Inner {
    /// 0..=1: warnings and above. 2: adds notice/info and token-accepted
    /// debug. 3+: everything.
    level: u8,
    tokens: RwLock<Vec<String>>,
    redirect: RwLock<Option<Arc<dyn LogSink>>>,
}

/// Shareable handle to one logging configuration.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Logger {
    /// New handle writing to standard error at the given verbosity.
    pub fn new(level: u8) -> Self {
        Self {
            inner: Arc::new(Inner {
                level,
                tokens: RwLock::new(Vec::new()),
                redirect: RwLock::new(None),
            }),
        }
    }

    /// Send every record to `sink` instead of standard error. A
    /// redirected sink receives all severities regardless of verbosity;
    /// filtering is the sink's business.
    pub fn redirect(&self, sink: Arc<dyn LogSink>) {
        *write_lock(&self.inner.redirect) = Some(sink);
    }

    /// Register a token whose debug records pass the filter. Silently
    /// ignored once [`MAX_DEBUG_TOKENS`] tokens are registered.
    pub fn accept(&self, token: &str) {
        let mut tokens = write_lock(&self.inner.tokens);
        if tokens.len() < MAX_DEBUG_TOKENS && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_owned());
        }
    }

    /// Drop every registered debug token.
    pub fn clear_accept(&self) {
        write_lock(&self.inner.tokens).clear();
    }

    fn token_accepted(&self, token: Option<&str>) -> bool {
        match token {
            Some(token) => read_lock(&self.inner.tokens).iter().any(|t| t == token),
            None => false,
        }
    }

    fn enabled(&self, severity: Severity, token: Option<&str>) -> bool {
        if severity <= Severity::Warning {
            return true;
        }
        match severity {
            Severity::Debug => {
                self.inner.level >= 3 || (self.inner.level == 2 && self.token_accepted(token))
            }
            _ => self.inner.level >= 2,
        }
    }

    /// Emit one record. The message is only formatted if the record
    /// passes the verbosity gate or a redirected sink is installed.
    pub fn log(&self, severity: Severity, token: Option<&str>, args: fmt::Arguments<'_>) {
        let redirect = read_lock(&self.inner.redirect).clone();
        if let Some(sink) = redirect {
            sink.log(severity, token, &fmt::format(args));
            return;
        }
        if !self.enabled(severity, token) {
            return;
        }
        StderrSink.log(severity, token, &fmt::format(args));
    }

    /// Critical record.
    pub fn crit(&self, token: &str, args: fmt::Arguments<'_>) {
        self.log(Severity::Critical, Some(token), args);
    }

    /// Warning record with the last OS error appended.
    pub fn warn(&self, token: &str, args: fmt::Arguments<'_>) {
        let err = io::Error::last_os_error();
        self.log(
            Severity::Warning,
            Some(token),
            format_args!("{}: {}", args, err),
        );
    }

    /// Warning record, message only.
    pub fn warnx(&self, token: &str, args: fmt::Arguments<'_>) {
        self.log(Severity::Warning, Some(token), args);
    }

    /// Informational record.
    pub fn info(&self, token: &str, args: fmt::Arguments<'_>) {
        self.log(Severity::Info, Some(token), args);
    }

    /// Debug record, subject to the token filter.
    pub fn debug(&self, token: &str, args: fmt::Arguments<'_>) {
        self.log(Severity::Debug, Some(token), args);
    }

    /// Log at critical severity, appending the OS error description when
    /// one is pending, and terminate the process. For unrecoverable
    /// startup conditions only.
    pub fn fatal(&self, token: Option<&str>, message: Option<&str>) -> ! {
        let token = token.unwrap_or("fatal");
        let err = io::Error::last_os_error();
        match message {
            None => self.crit(token, format_args!("{}", err)),
            Some(message) if err.raw_os_error().unwrap_or(0) != 0 => {
                self.crit(token, format_args!("{}: {}", message, err))
            }
            Some(message) => self.crit(token, format_args!("{}", message)),
        }
        process::exit(1);
    }

    /// [`fatal`](Self::fatal) without the OS error description.
    pub fn fatalx(&self, message: &str) -> ! {
        self.crit("fatal", format_args!("{}", message));
        process::exit(1);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(1)
    }
}

#[macro_export]
macro_rules! log_crit {
    ($logger:expr, $token:expr, $($arg:tt)*) => {
        $logger.crit($token, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $token:expr, $($arg:tt)*) => {
        $logger.warn($token, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warnx {
    ($logger:expr, $token:expr, $($arg:tt)*) => {
        $logger.warnx($token, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $token:expr, $($arg:tt)*) => {
        $logger.info($token, ::core::format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $token:expr, $($arg:tt)*) => {
        $logger.debug($token, ::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CaptureSink {
        records: Mutex<Vec<(Severity, Option<String>, String)>>,
    }

    impl LogSink for CaptureSink {
        fn log(&self, severity: Severity, token: Option<&str>, message: &str) {
            self.records.lock().unwrap().push((
                severity,
                token.map(str::to_owned),
                message.to_owned(),
            ));
        }
    }

    #[test]
    fn warnings_always_pass() {
        let logger = Logger::new(0);
        for severity in [
            Severity::Emergency,
            Severity::Alert,
            Severity::Critical,
            Severity::Error,
            Severity::Warning,
        ] {
            assert!(logger.enabled(severity, None));
        }
    }

    #[test]
    fn info_needs_verbosity() {
        assert!(!Logger::new(1).enabled(Severity::Info, None));
        assert!(Logger::new(2).enabled(Severity::Info, None));
        assert!(!Logger::new(1).enabled(Severity::Notice, None));
        assert!(Logger::new(2).enabled(Severity::Notice, None));
    }

    #[test]
    fn debug_needs_accepted_token() {
        let logger = Logger::new(2);
        assert!(!logger.enabled(Severity::Debug, Some("reorder")));
        logger.accept("reorder");
        assert!(logger.enabled(Severity::Debug, Some("reorder")));
        assert!(!logger.enabled(Severity::Debug, Some("other")));
        assert!(!logger.enabled(Severity::Debug, None));
        logger.clear_accept();
        assert!(!logger.enabled(Severity::Debug, Some("reorder")));
    }

    #[test]
    fn debug_unfiltered_at_high_verbosity() {
        let logger = Logger::new(3);
        assert!(logger.enabled(Severity::Debug, Some("anything")));
        assert!(logger.enabled(Severity::Debug, None));
    }

    #[test]
    fn token_registry_is_bounded() {
        let logger = Logger::new(2);
        for n in 0..MAX_DEBUG_TOKENS + 3 {
            logger.accept(&format!("token-{}", n));
        }
        assert!(logger.enabled(Severity::Debug, Some("token-0")));
        assert!(logger.enabled(
            Severity::Debug,
            Some(&format!("token-{}", MAX_DEBUG_TOKENS - 1))
        ));
        // past the bound the registration was dropped
        assert!(!logger.enabled(Severity::Debug, Some(&format!("token-{}", MAX_DEBUG_TOKENS))));
    }

    #[test]
    fn redirected_sink_receives_everything() {
        let logger = Logger::new(0);
        let capture = Arc::new(CaptureSink::default());
        logger.redirect(capture.clone());
        log_debug!(logger, "reorder", "slot {}", 7);
        log_info!(logger, "reorder", "hello");
        let records = capture.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            (Severity::Debug, Some("reorder".to_owned()), "slot 7".to_owned())
        );
        assert_eq!(records[1].0, Severity::Info);
    }

    #[test]
    fn severity_tags() {
        assert_eq!(Severity::Error.tag(), " ERR");
        assert_eq!(Severity::Error.to_string(), "ERR");
        assert!(Severity::Emergency < Severity::Debug);
    }
}
