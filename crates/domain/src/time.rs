//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for `last_seen`, advisory times, telemetry records, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return `now`, but never earlier than `previous`.
///
/// Keeps per-device timestamps monotonic even when the wall clock is
/// stepped backwards (NTP correction, RTC drift on restart).
#[must_use]
pub fn monotonic_after(previous: Option<Timestamp>, now: Timestamp) -> Timestamp {
    match previous {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn should_return_current_utc_time() {
        let before = Utc::now();
        let ts = now();
        let after = Utc::now();
        assert!(ts >= before);
        assert!(ts <= after);
    }

    #[test]
    fn should_keep_previous_when_clock_went_backwards() {
        let prev = Utc::now();
        let earlier = prev - Duration::seconds(30);
        assert_eq!(monotonic_after(Some(prev), earlier), prev);
    }

    #[test]
    fn should_take_now_when_clock_moved_forward() {
        let prev = Utc::now();
        let later = prev + Duration::seconds(1);
        assert_eq!(monotonic_after(Some(prev), later), later);
        assert_eq!(monotonic_after(None, later), later);
    }
}
