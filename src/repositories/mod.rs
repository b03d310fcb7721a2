pub(crate) mod answers;
pub(crate) mod exams;
pub(crate) mod health;
pub(crate) mod proctoring_logs;
pub(crate) mod questions;
pub(crate) mod sessions;
pub(crate) mod users;
