use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!(
        "exam_submissions_total",
        "Exam submissions by outcome"
    );
    metrics::describe_counter!(
        "exam_sessions_started_total",
        "Start-exam requests by outcome"
    );
    metrics::describe_counter!("proctoring_events_total", "Proctoring events recorded by type");
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_submission(outcome: &'static str) {
    metrics::counter!("exam_submissions_total", "outcome" => outcome).increment(1);
}

pub(crate) fn record_session_start(outcome: &'static str) {
    metrics::counter!("exam_sessions_started_total", "outcome" => outcome).increment(1);
}

/// Event types the browser client emits. Anything else is counted as `other`
/// to keep label cardinality bounded.
const KNOWN_EVENT_TYPES: &[&str] = &[
    "exam_end",
    "tab_switch",
    "tab_switch_return",
    "face_missing",
    "multiple_faces",
    "phone_usage_suspected",
    "serious_violation",
    "random_check",
    "webcam_setup",
    "ai_setup",
    "setup_success",
    "setup_warning",
    "setup_failure",
    "fallback_monitoring",
    "video_error",
    "detection_error",
];

pub(crate) fn record_proctoring_event(log_type: &str) {
    let label =
        KNOWN_EVENT_TYPES.iter().find(|known| **known == log_type).copied().unwrap_or("other");
    metrics::counter!("proctoring_events_total", "log_type" => label).increment(1);
}
