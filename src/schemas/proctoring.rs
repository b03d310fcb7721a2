use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{ProctoringLog, ViolationSummary};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProctoringLogRequest {
    #[serde(default)]
    pub(crate) session_id: Option<i64>,
    #[serde(alias = "type")]
    #[validate(length(min = 1, max = 50, message = "log_type must be 1-50 characters"))]
    pub(crate) log_type: String,
    #[serde(default)]
    pub(crate) details: Option<String>,
    #[serde(default)]
    pub(crate) screenshot: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProctoringLogResponse {
    pub(crate) status: &'static str,
    pub(crate) log_id: i64,
    pub(crate) screenshot_stored: bool,
    pub(crate) screenshot_omitted: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProctoringLogEntry {
    pub(crate) id: i64,
    pub(crate) log_type: String,
    pub(crate) details: Option<String>,
    pub(crate) screenshot: Option<String>,
    pub(crate) screenshot_sha256: Option<String>,
    pub(crate) screenshot_omitted: bool,
    pub(crate) timestamp: String,
}

impl From<ProctoringLog> for ProctoringLogEntry {
    fn from(log: ProctoringLog) -> Self {
        Self {
            id: log.id,
            log_type: log.log_type,
            details: log.details,
            screenshot: log.screenshot,
            screenshot_sha256: log.screenshot_sha256,
            screenshot_omitted: log.screenshot_omitted,
            timestamp: format_primitive(log.timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ProctoringLogsResponse {
    pub(crate) session_id: i64,
    pub(crate) student_id: i64,
    pub(crate) exam_id: i64,
    pub(crate) critical_violations: i64,
    pub(crate) violations: ViolationSummary,
    pub(crate) logs: Vec<ProctoringLogEntry>,
}
