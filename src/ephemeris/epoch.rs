//! Epoch representations.
//!
//! The feed writes epochs as day-of-year timestamps (`2024-047T12:00:00.000Z`).
//! Everything this service hands out uses the canonical calendar form
//! `2024-02-16T12:00:00.000000Z`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const FEED_FORMAT: &str = "%Y-%jT%H:%M:%S%.fZ";
const FEED_OUTPUT_FORMAT: &str = "%Y-%jT%H:%M:%S%.6fZ";
const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a feed epoch in ordinal-date form.
pub fn parse_feed_epoch(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s.trim(), FEED_FORMAT).map(|dt| dt.and_utc())
}

pub fn format_feed_epoch(epoch: &DateTime<Utc>) -> String {
    epoch.format(FEED_OUTPUT_FORMAT).to_string()
}

pub fn format_epoch(epoch: &DateTime<Utc>) -> String {
    epoch.format(CANONICAL_FORMAT).to_string()
}

/// Parse an epoch supplied by a client.
///
/// Accepts RFC 3339 (any offset) as well as ISO-8601 date-times without a zone
/// designator, which are taken as UTC. Seconds may be omitted, the separator
/// may be a space, and a bare date means midnight.
pub fn parse_epoch(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Serde adapter writing epochs in canonical form.
pub mod canonical {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(epoch: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_epoch(epoch))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_epoch(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_day_of_year() {
        let epoch = parse_feed_epoch("2024-047T12:00:00.000Z").unwrap();
        assert_eq!(epoch, Utc.with_ymd_and_hms(2024, 2, 16, 12, 0, 0).unwrap());

        let epoch = parse_feed_epoch("2024-366T23:59:59.500000Z").unwrap();
        assert_eq!(epoch.format("%m-%d").to_string(), "12-31");
        assert_eq!(epoch.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn rejects_garbage_feed_epoch() {
        assert!(parse_feed_epoch("Invalid-Date-String").is_err());
        assert!(parse_feed_epoch("2024-02-16T12:00:00.000Z").is_err());
    }

    #[test]
    fn feed_epoch_survives_reformatting() {
        for s in [
            "2024-047T12:00:00.000Z",
            "2024-001T00:00:00.123456Z",
            "2023-365T18:04:30.250Z",
        ] {
            let parsed = parse_feed_epoch(s).unwrap();
            assert_eq!(parse_feed_epoch(&format_feed_epoch(&parsed)).unwrap(), parsed);
            assert_eq!(parse_epoch(&format_epoch(&parsed)).unwrap(), parsed);
        }
    }

    #[test]
    fn canonical_form() {
        let epoch = parse_feed_epoch("2024-047T12:00:00.000Z").unwrap();
        assert_eq!(format_epoch(&epoch), "2024-02-16T12:00:00.000000Z");
    }

    #[test]
    fn request_epochs() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 22, 13, 0, 0).unwrap();
        for s in [
            "2024-02-22T13:00:00",
            "2024-02-22T13:00:00.000",
            "2024-02-22T13:00:00.000000Z",
            "2024-02-22T13:00:00Z",
            "2024-02-22T14:00:00+01:00",
        ] {
            assert_eq!(parse_epoch(s).unwrap(), expected, "{s}");
        }
        assert!(parse_epoch("abc").is_err());
        assert!(parse_epoch("2024-02-30T00:00:00").is_err());
    }

    #[test]
    fn request_epochs_in_short_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 2, 16, 12, 8, 0).unwrap();
        for s in [
            "2024-02-16T12:08",
            "2024-02-16 12:08:00",
            "2024-02-16 12:08:00.000000",
            "2024-02-16 12:08",
        ] {
            assert_eq!(parse_epoch(s).unwrap(), expected, "{s}");
        }

        let midnight = Utc.with_ymd_and_hms(2024, 2, 16, 0, 0, 0).unwrap();
        assert_eq!(parse_epoch("2024-02-16").unwrap(), midnight);

        for s in ["2024-02-16T12", "2024-02-16T", "2024-13-01", "12:08"] {
            assert!(parse_epoch(s).is_err(), "{s}");
        }
    }
}
