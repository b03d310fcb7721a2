use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::core::config::Settings;
use crate::core::{metrics, time::primitive_now_utc};
use crate::repositories::{self, proctoring_logs::NewLog};

const DATA_URL_PREFIX: &str = "data:image/";
const BASE64_MARKER: &str = ";base64,";

/// What happens to a screenshot attached to a proctoring event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScreenshotDecision {
    Absent,
    Stored { sha256: String },
    Omitted { sha256: String },
}

impl ScreenshotDecision {
    pub(crate) fn sha256(&self) -> Option<&str> {
        match self {
            Self::Absent => None,
            Self::Stored { sha256 } | Self::Omitted { sha256 } => Some(sha256),
        }
    }
}

/// Accepts a `data:image/...;base64,` URL no longer than `max_bytes`.
/// Anything else that is non-empty is omitted but fingerprinted.
pub(crate) fn screenshot_decision(raw: Option<&str>, max_bytes: usize) -> ScreenshotDecision {
    let Some(raw) = raw.filter(|value| !value.is_empty()) else {
        return ScreenshotDecision::Absent;
    };

    let sha256 = hex::encode(Sha256::digest(raw.as_bytes()));
    if raw.len() <= max_bytes && is_image_data_url(raw) {
        ScreenshotDecision::Stored { sha256 }
    } else {
        ScreenshotDecision::Omitted { sha256 }
    }
}

fn is_image_data_url(raw: &str) -> bool {
    let Some(rest) = raw.strip_prefix(DATA_URL_PREFIX) else {
        return false;
    };
    let Some((media, payload)) = rest.split_once(BASE64_MARKER) else {
        return false;
    };
    !media.is_empty() && !payload.is_empty() && STANDARD.decode(payload).is_ok()
}

pub(crate) struct ProctoringEvent<'a> {
    pub(crate) session_id: i64,
    pub(crate) log_type: &'a str,
    pub(crate) details: Option<&'a str>,
    pub(crate) screenshot: Option<&'a str>,
}

#[derive(Debug)]
pub(crate) struct RecordedEvent {
    pub(crate) log_id: i64,
    pub(crate) screenshot: ScreenshotDecision,
    pub(crate) critical: bool,
}

/// Appends the event, plus a review row for critical violation types, in one
/// transaction.
pub(crate) async fn record_event(
    pool: &PgPool,
    settings: &Settings,
    event: ProctoringEvent<'_>,
) -> Result<RecordedEvent, sqlx::Error> {
    let proctoring = settings.proctoring();
    let decision = screenshot_decision(event.screenshot, proctoring.screenshot_max_bytes);
    let stored_screenshot = match decision {
        ScreenshotDecision::Stored { .. } => event.screenshot,
        _ => None,
    };
    let critical = proctoring.is_critical(event.log_type);
    let now = primitive_now_utc();

    let mut tx = pool.begin().await?;
    let log_id = repositories::proctoring_logs::append(
        &mut *tx,
        NewLog {
            session_id: event.session_id,
            log_type: event.log_type,
            details: event.details,
            screenshot: stored_screenshot,
            screenshot_sha256: decision.sha256(),
            screenshot_omitted: matches!(decision, ScreenshotDecision::Omitted { .. }),
            timestamp: now,
        },
    )
    .await?;

    if critical {
        repositories::proctoring_logs::insert_critical(
            &mut *tx,
            event.session_id,
            event.log_type,
            event.details,
            now,
        )
        .await?;
    }
    tx.commit().await?;

    metrics::record_proctoring_event(event.log_type);
    if let ScreenshotDecision::Omitted { sha256 } = &decision {
        tracing::warn!(
            session_id = event.session_id,
            log_id,
            screenshot_sha256 = %sha256,
            "Screenshot omitted from proctoring event"
        );
    }
    if critical {
        tracing::warn!(
            session_id = event.session_id,
            log_id,
            log_type = event.log_type,
            "Critical proctoring violation recorded"
        );
    } else {
        tracing::debug!(
            session_id = event.session_id,
            log_id,
            log_type = event.log_type,
            "Proctoring event recorded"
        );
    }

    Ok(RecordedEvent { log_id, screenshot: decision, critical })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    #[test]
    fn small_data_url_is_stored() {
        let decision = screenshot_decision(Some(PNG), 1_000);
        assert!(matches!(decision, ScreenshotDecision::Stored { .. }));
        assert_eq!(decision.sha256().map(str::len), Some(64));
    }

    #[test]
    fn oversized_screenshot_is_omitted_with_digest() {
        let decision = screenshot_decision(Some(PNG), 10);
        let ScreenshotDecision::Omitted { sha256 } = decision else {
            panic!("expected omitted screenshot");
        };
        assert_eq!(sha256, hex::encode(Sha256::digest(PNG.as_bytes())));
    }

    #[test]
    fn cap_is_inclusive() {
        let decision = screenshot_decision(Some(PNG), PNG.len());
        assert!(matches!(decision, ScreenshotDecision::Stored { .. }));
    }

    #[test]
    fn malformed_screenshots_are_omitted() {
        for raw in [
            "not a data url",
            "data:text/plain;base64,aGVsbG8=",
            "data:image/png,raw-bytes",
            "data:image/png;base64,%%%",
        ] {
            assert!(
                matches!(screenshot_decision(Some(raw), 1_000), ScreenshotDecision::Omitted { .. }),
                "{raw} should be omitted"
            );
        }
    }

    #[test]
    fn missing_or_empty_screenshot_is_absent() {
        assert_eq!(screenshot_decision(None, 1_000), ScreenshotDecision::Absent);
        assert_eq!(screenshot_decision(Some(""), 1_000), ScreenshotDecision::Absent);
    }
}
