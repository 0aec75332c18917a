pub mod chat;
pub mod email;
pub mod mailbox;

use chrono::{DateTime, Local, NaiveDateTime};

/// Render a backend timestamp in local time. Unparseable values are shown as-is.
pub fn format_timestamp(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    }
    // naive datetimes from the backend are UTC
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return naive
                .and_utc()
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_timestamp_is_kept() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_eq!(format_timestamp(""), "");
    }

    #[test]
    fn naive_and_rfc3339_timestamps_are_formatted() {
        let a = format_timestamp("2024-03-01T10:20:30");
        let b = format_timestamp("2024-03-01T10:20:30+00:00");
        assert_eq!(a, b);
        assert_eq!(a.len(), "2024-03-01 10:20".len());
    }
}
