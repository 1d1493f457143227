use chrono::{DateTime, Utc};

use crate::models::constants::UNSET_TIMESTAMP;

/// Current time as unix seconds.
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Render a unix-seconds timestamp as `YYYY-MM-DDTHH:MM:SS +00:00`.
///
/// Returns `None` for the unset sentinel or an out-of-range value.
pub fn format_timestamp(unix_seconds: i64) -> Option<String> {
    if unix_seconds == UNSET_TIMESTAMP {
        return None;
    }
    DateTime::<Utc>::from_timestamp(unix_seconds, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S %:z").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp(1_686_675_662).as_deref(),
            Some("2023-06-13T17:01:02 +00:00")
        );
    }

    #[test]
    fn test_format_timestamp_unset() {
        assert_eq!(format_timestamp(UNSET_TIMESTAMP), None);
    }

    #[test]
    fn test_now_is_positive() {
        assert!(now_unix() > 0);
    }
}
