// Module name shadows the `serde` crate; use `::serde` for the external crate.
use ::serde::Serializer;
use chrono::{DateTime, SecondsFormat, Utc};

/// Serialize `DateTime<Utc>` as RFC 3339 with millisecond precision and a `Z`
/// suffix, e.g. `2026-03-01T18:30:00.250Z`.
pub fn to_rfc3339_ms<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Round to two decimal places. Used at output boundaries only; never feed a
/// rounded value back into an accumulation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
