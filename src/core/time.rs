use time::{
    format_description::well_known::Rfc3339, Duration, OffsetDateTime, PrimitiveDateTime,
    UtcOffset,
};

/// All timestamps are stored as naive UTC `TIMESTAMP` columns.
pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Inclusive on both ends: an exam is open at exactly its start and end instant.
pub(crate) fn window_contains(
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
    now: PrimitiveDateTime,
) -> bool {
    start <= now && now <= end
}

/// Seconds left before `deadline`, never negative.
pub(crate) fn seconds_until(deadline: PrimitiveDateTime, now: PrimitiveDateTime) -> i64 {
    (deadline - now).whole_seconds().max(0)
}

pub(crate) fn minutes(value: i32) -> Duration {
    Duration::minutes(i64::from(value))
}
