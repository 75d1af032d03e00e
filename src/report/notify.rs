use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigLoader, HeartbeatConfig};
use crate::report::types::{Report, RunResult};
use crate::report::webhook::Notifier;
use crate::secrets::SecretResolver;

/// Version shown in notification headlines
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only changed outputs, no errors
    ChangesOnly,
    Errors,
}

impl Severity {
    pub fn marker(self) -> &'static str {
        match self {
            Severity::ChangesOnly => "🟡",
            Severity::Errors => "🔴",
        }
    }
}

/// What to send at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Nothing,
    Heartbeat,
    Report(Severity),
}

/// Whether the heartbeat interval has elapsed since `last_heartbeat_time`.
///
/// An empty timestamp is always due. An unparseable one is never due.
pub fn is_heartbeat_due(heartbeat: &HeartbeatConfig, now: DateTime<Utc>) -> bool {
    let last = heartbeat.last_heartbeat_time.trim();
    if last.is_empty() {
        return true;
    }

    let last = match DateTime::parse_from_rfc3339(last) {
        Ok(last) => last.with_timezone(&Utc),
        Err(e) => {
            error!("Invalid heartbeat time \"{}\". Error: {}", last, e);
            return false;
        }
    };

    let interval = i64::try_from(heartbeat.interval_in_hours)
        .ok()
        .and_then(Duration::try_hours)
        .unwrap_or(Duration::MAX);
    now.signed_duration_since(last) >= interval
}

/// Decide the end-of-run notification from the counters and the heartbeat schedule.
pub fn decide(result: &RunResult, heartbeat: &HeartbeatConfig, now: DateTime<Utc>) -> Notification {
    if result.is_clean() {
        return if is_heartbeat_due(heartbeat, now) {
            Notification::Heartbeat
        } else {
            Notification::Nothing
        };
    }

    if result.error_count() == 0 {
        Notification::Report(Severity::ChangesOnly)
    } else {
        Notification::Report(Severity::Errors)
    }
}

pub fn heartbeat_payload(hostname: &str) -> String {
    let markdown = format!(
        "#### 💙 {}\nHeartbeat: __still alive__\n\n{}",
        VERSION,
        hostname_line(hostname)
    );
    json!({ "markdown": markdown }).to_string()
}

pub fn report_payload(
    severity: Severity,
    result: &RunResult,
    report_json: &str,
    run_name: &str,
    hostname: &str,
) -> String {
    let run_name = if run_name.is_empty() {
        String::new()
    } else {
        format!("`{}`\n\n", run_name)
    };

    let markdown = format!(
        "#### {} {}\n{}Changed files: __{}__\nRequest errors: __{}__\nFormat response errors: __{}__\n\n📄 _report.json_\n```json\n{}\n```\n\n{}",
        severity.marker(),
        VERSION,
        run_name,
        result.changed_files_count(),
        result.request_error_count(),
        result.format_error_count(),
        report_json,
        hostname_line(hostname)
    );
    json!({ "markdown": markdown }).to_string()
}

fn hostname_line(hostname: &str) -> String {
    format!("Message from: __{}__ (hostname)", hostname)
}

/// Best-effort host name for the notification footer.
pub fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.trim().is_empty())
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

/// Everything the end-of-run notification needs.
pub struct NotificationContext<'a> {
    pub config: &'a mut Config,

    /// File the heartbeat timestamp is persisted to; `None` keeps it in memory only
    pub config_path: Option<&'a Path>,

    pub secrets: &'a SecretResolver<'a>,
    pub notifier: &'a dyn Notifier,
    pub run_name: &'a str,

    /// The run was stopped by a shutdown signal
    pub interrupted: bool,
}

/// Write or clear the report file and send the heartbeat or report.
///
/// Returns what was actually delivered: `Nothing` when WebEx is inactive or the send failed.
/// An interrupted run never sends a heartbeat. Nothing in here fails the run: every error is
/// logged and the step is abandoned.
pub async fn notify(ctx: NotificationContext<'_>, result: &RunResult, report: &Report) -> Notification {
    let now = Utc::now();
    let decision = match decide(result, &ctx.config.heartbeat, now) {
        Notification::Heartbeat if ctx.interrupted => {
            info!("Run was interrupted, skipping heartbeat");
            Notification::Nothing
        }
        decision => decision,
    };
    let report_file = ctx.config.report_file.clone();

    let report_json = match decision {
        Notification::Report(_) => match write_report(report, &report_file) {
            Some(json) => Some(json),
            None => return Notification::Nothing,
        },
        _ => {
            remove_stale_report(&report_file);
            None
        }
    };

    let Some(webex) = ctx.config.notification.active_webex().cloned() else {
        debug!("WebEx notification inactive, {:?} not sent", decision);
        return Notification::Nothing;
    };

    let payload = match (decision, report_json) {
        (Notification::Nothing, _) => return Notification::Nothing,
        (Notification::Heartbeat, _) => heartbeat_payload(&hostname()),
        (Notification::Report(severity), Some(json)) => {
            report_payload(severity, result, &json, ctx.run_name, &hostname())
        }
        (Notification::Report(_), None) => return Notification::Nothing,
    };

    let url = match ctx.secrets.resolve_str(&webex.space) {
        Ok(space) => format!("{}{}", webex.webhook_url, space),
        Err(e) => {
            error!("Failed to resolve WebEx space. Error: {}", e);
            return Notification::Nothing;
        }
    };

    if let Err(e) = ctx.notifier.send(&url, &payload).await {
        warn!("Notification failed. Error: {}", e);
        return Notification::Nothing;
    }
    info!("Sent {:?} notification", decision);

    if decision == Notification::Heartbeat {
        ctx.config.heartbeat.last_heartbeat_time = now.to_rfc3339_opts(SecondsFormat::Secs, true);
        if let Some(path) = ctx.config_path
            && let Err(e) = ConfigLoader::save(&*ctx.config, path)
        {
            error!("Failed to persist heartbeat time. Error: {}", e);
        }
    }
    decision
}

fn write_report(report: &Report, path: &Path) -> Option<String> {
    if let Err(e) = report.save_to_file(path) {
        error!("Failed to save report \"{}\". Error: {}", path.display(), e);
        return None;
    }

    match fs::read_to_string(path) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to read report \"{}\". Error: {}", path.display(), e);
            None
        }
    }
}

fn remove_stale_report(path: &Path) {
    if path.exists()
        && let Err(e) = fs::remove_file(path)
    {
        warn!("Failed to remove stale report \"{}\". Error: {}", path.display(), e);
    }
}
