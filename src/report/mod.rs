pub mod notify;
pub mod types;
pub mod webhook;

pub use notify::{Notification, NotificationContext, Severity, decide, notify};
pub use types::{Issue, Report, RunResult};
pub use webhook::{Notifier, NotifyError, WebexNotifier};
