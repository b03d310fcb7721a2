pub(crate) mod exam_finalize;
pub(crate) mod exam_stats;
pub(crate) mod proctoring;
pub(crate) mod scoring;
pub(crate) mod session_lifecycle;
