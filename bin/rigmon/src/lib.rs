mod error;
pub use error::{ConfigError, Error, NotifyError, PlugError, PlugFailure};

mod event;
pub use event::PowerCycleEvent;

mod journal;
pub use journal::{Entry, Journal, Logger, LoggingLevel, Severity, JOURNAL_CAPACITY};

mod monitor;
pub use monitor::{MonitorSession, MonitorState, PowerMonitor, StopHandle, Tick, TICK, WAIT_STEP};

mod notifier;
pub use notifier::{normalize_phone, Notifier, Textbelt};

pub mod plug;
pub use plug::{PlugIdentity, PlugState, SmartPlug, Vendor};

mod settings;
pub use settings::{MonitorSettings, TextbeltSettings};

pub type ErasedError = Box<dyn std::error::Error + Send + Sync>;
