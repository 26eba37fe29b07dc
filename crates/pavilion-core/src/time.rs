// crates/pavilion-core/src/time.rs
// ============================================================================
// Module: Pavilion Time Helpers
// Description: RFC 3339 timestamp formatting/parsing shared by the status
//              journal, build lock staleness checks, and result pipeline.
// Purpose: Keep one canonical timestamp representation across components.
// Dependencies: time
// ============================================================================

use time::Duration;
use time::OffsetDateTime;
use time::error::Parse as TimeParseError;
use time::format_description::well_known::Rfc3339;

/// Formats a timestamp as RFC 3339, the on-disk and wire format for every
/// timestamp Pavilion persists.
///
/// # Errors
///
/// Returns an error for a timestamp outside the representable range.
pub fn format_rfc3339(timestamp: OffsetDateTime) -> Result<String, time::error::Format> {
    timestamp.format(&Rfc3339)
}

/// Parses an RFC 3339 timestamp.
///
/// # Errors
///
/// Returns [`TimeParseError`] if `text` is not valid RFC 3339.
pub fn parse_rfc3339(text: &str) -> Result<OffsetDateTime, TimeParseError> {
    OffsetDateTime::parse(text, &Rfc3339)
}

/// Returns the elapsed duration between two timestamps, clamped to zero if
/// `finished` precedes `started` (a clock skew between hosts should never
/// surface as a negative duration in a result JSON).
#[must_use]
pub fn elapsed_seconds(started: OffsetDateTime, finished: OffsetDateTime) -> f64 {
    let delta: Duration = finished - started;
    let seconds = delta.as_seconds_f64();
    if seconds.is_sign_negative() { 0.0 } else { seconds }
}

/// Returns `true` when `reference` is more than `timeout_seconds` in the past
/// relative to `now`, the stall-detection check the build lock uses to
/// decide whether a held lock should be reclaimed.
#[must_use]
pub fn is_stalled(last_progress: OffsetDateTime, now: OffsetDateTime, timeout_seconds: u64) -> bool {
    let elapsed = elapsed_seconds(last_progress, now);
    elapsed > timeout_seconds as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_rfc3339() {
        let ts = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let text = format_rfc3339(ts).unwrap();
        assert_eq!(parse_rfc3339(&text).unwrap(), ts);
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let earlier = OffsetDateTime::from_unix_timestamp(100).unwrap();
        let later = OffsetDateTime::from_unix_timestamp(50).unwrap();
        assert_eq!(elapsed_seconds(earlier, later), 0.0);
    }

    #[test]
    fn stall_detection_respects_timeout() {
        let start = OffsetDateTime::from_unix_timestamp(0).unwrap();
        let now = OffsetDateTime::from_unix_timestamp(31).unwrap();
        assert!(is_stalled(start, now, 30));
        assert!(!is_stalled(start, OffsetDateTime::from_unix_timestamp(29).unwrap(), 30));
    }
}
