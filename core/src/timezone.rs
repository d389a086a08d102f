//! Store timezone resolution: missing or unparseable IANA zone
//! strings both fall back to `America/Chicago`, logged at `warn`.

use chrono_tz::Tz;

pub const DEFAULT_TZ_NAME: &str = "America/Chicago";

pub fn default_tz() -> Tz {
    DEFAULT_TZ_NAME.parse().expect("America/Chicago is a valid IANA zone")
}

/// Resolve a store's timezone from an optional raw IANA string
/// (`None` when the store has no `StoreTimezone` row at all).
pub fn resolve(store_id: &str, raw: Option<&str>) -> Tz {
    match raw {
        None => {
            tracing::debug!(store_id, "no StoreTimezone row, defaulting to America/Chicago");
            default_tz()
        }
        Some(tz_str) => tz_str.parse().unwrap_or_else(|_| {
            tracing::warn!(store_id, tz = tz_str, "unknown IANA zone, defaulting to America/Chicago");
            default_tz()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_row_defaults() {
        assert_eq!(resolve("A", None), default_tz());
    }

    #[test]
    fn unknown_zone_defaults() {
        assert_eq!(resolve("A", Some("Mars/Olympus_Mons")), default_tz());
    }

    #[test]
    fn known_zone_resolves() {
        assert_eq!(resolve("A", Some("America/New_York")), chrono_tz::America::New_York);
    }
}
