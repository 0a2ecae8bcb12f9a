use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Accepts RFC 3339 timestamps as well as offset-less ones, which the
/// backend emits for some records. Offset-less values are taken as UTC.
pub(crate) fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_and_naive_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T09:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T11:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 09:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 11:30:00+02:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01T09:30:00.250").map(|t| t.timestamp()),
            Some(expected.timestamp())
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
