use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use chrono::{DateTime, Local};

use crate::event::PowerCycleEvent;

/// How many of the latest retained messages a new one is compared against.
const DEDUP_WINDOW: usize = 5;
/// Retained entries and cycles; the oldest are dropped first.
pub const JOURNAL_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingLevel {
    InfoWarningError,
    #[default]
    WarningErrors,
    Errors,
}

impl LoggingLevel {
    pub fn admits(self, severity: Severity) -> bool {
        let lowest = match self {
            Self::InfoWarningError => Severity::Info,
            Self::WarningErrors => Severity::Warning,
            Self::Errors => Severity::Error,
        };

        severity >= lowest
    }
}

pub trait Logger: Send + Sync {
    fn record(&self, severity: Severity, message: &str);

    fn info(&self, message: &str) {
        self.record(Severity::Info, message)
    }

    fn warning(&self, message: &str) {
        self.record(Severity::Warning, message)
    }

    fn error(&self, message: &str) {
        self.record(Severity::Error, message)
    }

    fn power_cycled(&self, event: &PowerCycleEvent) {
        self.warning(&event.summary())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub at: DateTime<Local>,
    pub severity: Severity,
    pub message: String,
}

/// Bounded monitor history. Everything goes to the `log` facade, only the
/// latest [`JOURNAL_CAPACITY`] entries admitted by the configured level are
/// kept.
#[derive(Debug, Default)]
pub struct Journal {
    level: LoggingLevel,
    entries: Mutex<VecDeque<Entry>>,
    cycles: Mutex<VecDeque<PowerCycleEvent>>,
}

impl Journal {
    pub fn new(level: LoggingLevel) -> Self {
        Self {
            level,
            entries: Mutex::new(VecDeque::with_capacity(JOURNAL_CAPACITY)),
            cycles: Mutex::new(VecDeque::new()),
        }
    }

    pub fn entries(&self) -> Vec<Entry> {
        match self.entries.lock() {
            Ok(entries) => entries.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }

    pub fn cycles(&self) -> Vec<PowerCycleEvent> {
        match self.cycles.lock() {
            Ok(cycles) => cycles.iter().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
        }
    }
}

impl Logger for Journal {
    fn record(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => log::info!("{message}"),
            Severity::Warning => log::warn!("{message}"),
            Severity::Error => log::error!("{message}"),
        }

        if !self.level.admits(severity) {
            return;
        }

        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        let repeated = entries
            .iter()
            .rev()
            .take(DEDUP_WINDOW)
            .any(|entry| entry.message == message);

        if repeated {
            return;
        }

        push_bounded(
            &mut entries,
            Entry {
                at: Local::now(),
                severity,
                message: message.to_string(),
            },
        );
    }

    fn power_cycled(&self, event: &PowerCycleEvent) {
        let mut cycles = match self.cycles.lock() {
            Ok(cycles) => cycles,
            Err(poisoned) => poisoned.into_inner(),
        };
        push_bounded(&mut cycles, event.clone());
        drop(cycles);

        self.warning(&event.summary());
    }
}

fn push_bounded<T>(items: &mut VecDeque<T>, item: T) {
    if items.len() == JOURNAL_CAPACITY {
        items.pop_front();
    }
    items.push_back(item);
}

impl FromStr for LoggingLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "info" | "infowarningerror" => Ok(Self::InfoWarningError),
            "1" | "warning" | "warningerrors" => Ok(Self::WarningErrors),
            "2" | "error" | "errors" => Ok(Self::Errors),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            self.severity,
            self.message
        )
    }
}
