pub const DEFAULT_LOG_LIMIT: i64 = 50;
pub const MIN_FALLBACK_LOG_LIMIT: i64 = 10;
pub const MAX_LOG_LIMIT: i64 = 100;

/// Page size for log listings. Absent or unparseable means 50, values below 1
/// become 10 and values above 100 become 100.
pub fn clamp_log_limit(raw: Option<&str>) -> i64 {
    let limit = raw
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_LOG_LIMIT);

    if limit > MAX_LOG_LIMIT {
        MAX_LOG_LIMIT
    } else if limit < 1 {
        MIN_FALLBACK_LOG_LIMIT
    } else {
        limit
    }
}
