//! Keyset pagination cursors.
//!
//! A cursor is the URL-safe base64 form of `<rfc3339 timestamp>|<id>`, where
//! the id is whatever tie-breaker the listing sorts on (a `BIGSERIAL` for GPS
//! points, a UUID for events and notifications).

use std::fmt::Display;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Error type for cursor operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    #[error("Invalid cursor format")]
    InvalidFormat,
    #[error("Invalid cursor encoding")]
    InvalidEncoding,
    #[error("Invalid timestamp in cursor")]
    InvalidTimestamp,
    #[error("Invalid ID in cursor")]
    InvalidId,
}

/// Encodes a cursor pointing at the row `(at, id)`.
pub fn encode_cursor<I: Display>(at: DateTime<Utc>, id: I) -> String {
    let raw = format!("{}|{}", at.to_rfc3339_opts(SecondsFormat::Micros, true), id);
    URL_SAFE_NO_PAD.encode(raw.as_bytes())
}

/// Decodes a cursor produced by [`encode_cursor`].
pub fn decode_cursor<I: FromStr>(cursor: &str) -> Result<(DateTime<Utc>, I), CursorError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| CursorError::InvalidEncoding)?;
    let raw = String::from_utf8(bytes).map_err(|_| CursorError::InvalidFormat)?;

    let (ts, id) = raw.split_once('|').ok_or(CursorError::InvalidFormat)?;

    let at = DateTime::parse_from_rfc3339(ts)
        .map_err(|_| CursorError::InvalidTimestamp)?
        .with_timezone(&Utc);
    let id = id.parse::<I>().map_err(|_| CursorError::InvalidId)?;

    Ok((at, id))
}

/// Clamps a requested page size into `1..=max`, defaulting when absent.
pub fn page_limit(requested: Option<i64>, default: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(1, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};
    use uuid::Uuid;

    #[test]
    fn test_numeric_id_cursor() {
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 8, 15, 0).unwrap();
        let cursor = encode_cursor(at, 4242i64);

        let (decoded_at, id): (DateTime<Utc>, i64) = decode_cursor(&cursor).unwrap();
        assert_eq!(decoded_at, at);
        assert_eq!(id, 4242);
    }

    #[test]
    fn test_uuid_id_cursor() {
        let at = Utc
            .with_ymd_and_hms(2024, 5, 2, 8, 15, 0)
            .unwrap()
            .with_nanosecond(250_000_000)
            .unwrap();
        let id = Uuid::new_v4();

        let (decoded_at, decoded_id): (DateTime<Utc>, Uuid) =
            decode_cursor(&encode_cursor(at, id)).unwrap();
        assert_eq!(decoded_at.timestamp_micros(), at.timestamp_micros());
        assert_eq!(decoded_id, id);
    }

    #[test]
    fn test_cursor_is_url_safe() {
        let cursor = encode_cursor(Utc::now(), i64::MAX);
        assert!(!cursor.contains('+'));
        assert!(!cursor.contains('/'));
        assert!(!cursor.contains('='));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            decode_cursor::<i64>("%%%").unwrap_err(),
            CursorError::InvalidEncoding
        );

        let no_separator = URL_SAFE_NO_PAD.encode(b"2024-01-01T00:00:00Z");
        assert_eq!(
            decode_cursor::<i64>(&no_separator).unwrap_err(),
            CursorError::InvalidFormat
        );

        let bad_time = URL_SAFE_NO_PAD.encode(b"yesterday|5");
        assert_eq!(
            decode_cursor::<i64>(&bad_time).unwrap_err(),
            CursorError::InvalidTimestamp
        );

        let bad_id = URL_SAFE_NO_PAD.encode(b"2024-01-01T00:00:00Z|abc");
        assert_eq!(
            decode_cursor::<i64>(&bad_id).unwrap_err(),
            CursorError::InvalidId
        );
        assert_eq!(
            decode_cursor::<Uuid>(&bad_id).unwrap_err(),
            CursorError::InvalidId
        );
    }

    #[test]
    fn test_page_limit() {
        assert_eq!(page_limit(None, 50, 500), 50);
        assert_eq!(page_limit(Some(0), 50, 500), 1);
        assert_eq!(page_limit(Some(-4), 50, 500), 1);
        assert_eq!(page_limit(Some(20), 50, 500), 20);
        assert_eq!(page_limit(Some(10_000), 50, 500), 500);
    }
}
