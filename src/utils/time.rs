use chrono::{DateTime, Utc};
use std::time::Duration;

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Caller-supplied seconds, with non-positive values meaning "use the default".
pub fn timeout_or_default(seconds: i64, default_secs: u64) -> Duration {
    if seconds <= 0 {
        Duration::from_secs(default_secs)
    } else {
        Duration::from_secs(seconds as u64)
    }
}
