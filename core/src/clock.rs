//! Supplies the reference "current UTC instant" for a report run.

use chrono::{DateTime, Utc};

/// Source of the reference instant a report run measures its three
/// rolling windows against.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fixed instant, captured once at construction from an override
/// string. Naive overrides (no offset) are interpreted as UTC. An
/// unparseable override silently falls back to wall-clock, matching
/// the teacher's `DEBUG_SYSTEM_TIME` handling.
#[derive(Clone, Copy, Debug)]
pub struct OverrideClock {
    instant: DateTime<Utc>,
}

impl OverrideClock {
    /// Parse `override_str` as an ISO-8601 instant. Returns `None` if
    /// the string is unparseable by either the offset-aware or the
    /// naive-UTC path — callers should fall back to [`SystemClock`] in
    /// that case rather than constructing this with a bogus value.
    pub fn parse(override_str: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(override_str) {
            return Some(Self {
                instant: dt.with_timezone(&Utc),
            });
        }
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(override_str, "%Y-%m-%dT%H:%M:%S") {
            return Some(Self {
                instant: DateTime::from_naive_utc_and_offset(naive, Utc),
            });
        }
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(override_str, "%Y-%m-%d %H:%M:%S") {
            return Some(Self {
                instant: DateTime::from_naive_utc_and_offset(naive, Utc),
            });
        }
        None
    }
}

impl Clock for OverrideClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// Resolve the clock to use for a run: an override string if present
/// and parseable, else the wall clock. This is the single entry point
/// callers (the orchestrator's host binary) should use, mirroring
/// spec §4.1's "unparseable override silently falls back to
/// wall-clock" rationale.
pub fn resolve(override_str: Option<&str>) -> Box<dyn Clock> {
    match override_str.and_then(OverrideClock::parse) {
        Some(clock) => Box::new(clock),
        None => {
            if let Some(raw) = override_str {
                tracing::warn!(override_value = raw, "CURRENT_TIMESTAMP_OVERRIDE unparseable, falling back to wall clock");
            }
            Box::new(SystemClock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_with_offset() {
        let clock = OverrideClock::parse("2023-10-26T10:00:00Z").unwrap();
        assert_eq!(clock.now().to_rfc3339(), "2023-10-26T10:00:00+00:00");
    }

    #[test]
    fn parses_naive_as_utc() {
        let clock = OverrideClock::parse("2023-10-26T10:00:00").unwrap();
        assert_eq!(clock.now().to_rfc3339(), "2023-10-26T10:00:00+00:00");
    }

    #[test]
    fn parses_space_separated_naive_as_utc() {
        let clock = OverrideClock::parse("2023-10-26 10:00:00").unwrap();
        assert_eq!(clock.now().to_rfc3339(), "2023-10-26T10:00:00+00:00");
    }

    #[test]
    fn unparseable_override_falls_back() {
        assert!(OverrideClock::parse("not-a-timestamp").is_none());
        let clock = resolve(Some("not-a-timestamp"));
        // Falls back to SystemClock; just assert it doesn't panic and
        // returns something close to now.
        let delta = Utc::now().signed_duration_since(clock.now());
        assert!(delta.num_seconds().abs() < 5);
    }

    #[test]
    fn no_override_uses_wall_clock() {
        let clock = resolve(None);
        let delta = Utc::now().signed_duration_since(clock.now());
        assert!(delta.num_seconds().abs() < 5);
    }
}
