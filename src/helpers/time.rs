use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unix seconds.
pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}
