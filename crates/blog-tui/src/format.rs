use chrono::{DateTime, Local, TimeZone, Utc};

/// "October 19, 2026, 03:04 PM" in the local time zone
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    format_timestamp_in(ts, &Local)
}

pub fn format_timestamp_in<Tz: TimeZone>(ts: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    ts.with_timezone(tz).format("%B %-d, %Y, %I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_month_and_twelve_hour_clock() {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 15, 4, 0).unwrap();
        assert_eq!(format_timestamp_in(&ts, &Utc), "October 19, 2026, 03:04 PM");

        let morning = Utc.with_ymd_and_hms(2025, 3, 7, 9, 30, 0).unwrap();
        assert_eq!(format_timestamp_in(&morning, &Utc), "March 7, 2025, 09:30 AM");
    }
}
