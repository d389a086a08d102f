//! Converts a store's weekly local schedule plus a target day into
//! concrete UTC half-open intervals, resolving DST edge cases.

use chrono::{DateTime, Days, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::BusinessHourRule;

/// A concrete UTC half-open business-hour interval for one local day.
pub type UtcInterval = (DateTime<Utc>, DateTime<Utc>);

/// Expand one local day's business hours into UTC intervals.
///
/// `day_utc` is any UTC instant identifying the day under
/// consideration (the orchestrator passes midnight-UTC of the day it
/// is walking); `rules` must already be filtered to a single
/// `(store, day_of_week)`. Returns intervals in arbitrary order,
/// unsorted and unmerged, per spec.
pub fn expand_day(store_id: &str, day_utc: DateTime<Utc>, rules: &[BusinessHourRule], tz: Tz) -> Vec<UtcInterval> {
    let local_date = day_utc.with_timezone(&tz).date_naive();

    if rules.is_empty() {
        let day_start = local_date.and_hms_opt(0, 0, 0).unwrap();
        let day_end = local_date.and_hms_micro_opt(23, 59, 59, 999_999).unwrap();
        return localize_pair(store_id, day_start, day_end, tz)
            .into_iter()
            .collect();
    }

    let mut seen: Vec<(NaiveTime, NaiveTime)> = Vec::new();
    let mut out = Vec::new();

    for rule in rules {
        let key = (rule.start_local, rule.end_local);
        if seen.contains(&key) {
            continue; // dedup identical (start, end) pairs per the §3 invariant
        }
        seen.push(key);

        let local_start = local_date.and_time(rule.start_local);
        let local_end = if rule.spans_midnight() {
            (local_date + Days::new(1)).and_time(rule.end_local)
        } else {
            local_date.and_time(rule.end_local)
        };

        if let Some(pair) = localize_pair(store_id, local_start, local_end, tz) {
            out.push(pair);
        }
    }

    out
}

/// Localize a naive `[start, end)` pair to `tz` and convert to UTC.
/// Returns `None` (after logging) if either endpoint is ambiguous or
/// non-existent in the local zone; intervals are dropped outright,
/// never heuristically repaired.
fn localize_pair(store_id: &str, start: NaiveDateTime, end: NaiveDateTime, tz: Tz) -> Option<UtcInterval> {
    let start_utc = match localize_one(tz, start) {
        Some(dt) => dt,
        None => {
            tracing::warn!(store_id, local_time = %start, "dropping business-hour interval: start is ambiguous or non-existent");
            return None;
        }
    };
    let end_utc = match localize_one(tz, end) {
        Some(dt) => dt,
        None => {
            tracing::warn!(store_id, local_time = %end, "dropping business-hour interval: end is ambiguous or non-existent");
            return None;
        }
    };
    Some((start_utc, end_utc))
}

fn localize_one(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) | LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone as _, Weekday};

    fn rule(day: Weekday, start: &str, end: &str) -> BusinessHourRule {
        BusinessHourRule {
            store_id: "S".into(),
            day_of_week: day,
            start_local: NaiveTime::parse_from_str(start, "%H:%M:%S").unwrap(),
            end_local: NaiveTime::parse_from_str(end, "%H:%M:%S").unwrap(),
        }
    }

    // Scenario 2 base case: plain business hours, no DST crossing —
    // UTC interval length must equal `end - start` exactly.
    #[test]
    fn round_trip_length_no_dst_crossing() {
        let day = Utc.with_ymd_and_hms(2023, 6, 12, 0, 0, 0).unwrap(); // a Monday, no DST edge
        let rules = vec![rule(Weekday::Mon, "09:00:00", "17:00:00")];
        let segments = expand_day("S", day, &rules, chrono_tz::America::New_York);
        assert_eq!(segments.len(), 1);
        let (s, e) = segments[0];
        assert_eq!(e - s, chrono::Duration::hours(8));
    }

    #[test]
    fn empty_rules_means_24_7() {
        let day = Utc.with_ymd_and_hms(2023, 6, 12, 0, 0, 0).unwrap();
        let segments = expand_day("S", day, &[], chrono_tz::Tz::UTC);
        assert_eq!(segments.len(), 1);
        let (s, e) = segments[0];
        assert!(e - s >= chrono::Duration::hours(23));
        assert!(e - s < chrono::Duration::hours(24));
    }

    // Scenario 2: store "B" only has a Mon-Fri 09:00-17:00 local rule
    // in America/New_York; Saturday has no row for that store at all.
    // The Expander treats each (store, day_of_week) independently per
    // the §3 invariant, so Friday expands to the explicit 8-hour
    // window while Saturday — zero rules for that day — expands to the
    // full-day 24/7 interval rather than being treated as closed.
    #[test]
    fn scenario_2_days_without_a_rule_are_24_7_not_closed() {
        let friday_rules = vec![rule(Weekday::Fri, "09:00:00", "17:00:00")];
        let saturday_rules: Vec<BusinessHourRule> = Vec::new();

        let friday = Utc.with_ymd_and_hms(2023, 6, 9, 0, 0, 0).unwrap();
        let friday_segments = expand_day("B", friday, &friday_rules, chrono_tz::America::New_York);
        assert_eq!(friday_segments.len(), 1);
        let (s, e) = friday_segments[0];
        assert_eq!(e - s, chrono::Duration::hours(8));

        let saturday = Utc.with_ymd_and_hms(2023, 6, 10, 0, 0, 0).unwrap();
        let saturday_segments = expand_day("B", saturday, &saturday_rules, chrono_tz::America::New_York);
        assert_eq!(saturday_segments.len(), 1);
        let (s, e) = saturday_segments[0];
        assert!(e - s >= chrono::Duration::hours(23));
        assert!(e - s < chrono::Duration::hours(24));
    }

    // Scenario 4: overnight rule, UTC timezone so no DST complication.
    #[test]
    fn overnight_rule_extends_into_next_day() {
        let friday = Utc.with_ymd_and_hms(2023, 6, 9, 0, 0, 0).unwrap(); // Friday
        let rules = vec![rule(Weekday::Fri, "22:00:00", "02:00:00")];
        let segments = expand_day("S", friday, &rules, chrono_tz::Tz::UTC);
        assert_eq!(segments.len(), 1);
        let (s, e) = segments[0];
        assert_eq!(s, Utc.with_ymd_and_hms(2023, 6, 9, 22, 0, 0).unwrap());
        assert_eq!(e, Utc.with_ymd_and_hms(2023, 6, 10, 2, 0, 0).unwrap());
    }

    // Scenario 3: spring-forward gap, 2023-03-12 02:00 -> 03:00 in
    // America/New_York is the non-existent hour.
    #[test]
    fn spring_forward_non_existent_start_is_dropped() {
        let sunday = Utc.with_ymd_and_hms(2023, 3, 12, 12, 0, 0).unwrap();
        let rules = vec![rule(Weekday::Sun, "02:30:00", "03:30:00")];
        let segments = expand_day("S", sunday, &rules, chrono_tz::America::New_York);
        assert!(segments.is_empty());
    }

    #[test]
    fn fall_back_ambiguous_start_is_dropped() {
        // 2023-11-05 01:30 local occurs twice in America/New_York.
        let sunday = Utc.with_ymd_and_hms(2023, 11, 5, 12, 0, 0).unwrap();
        let rules = vec![rule(Weekday::Sun, "01:30:00", "02:30:00")];
        let segments = expand_day("S", sunday, &rules, chrono_tz::America::New_York);
        assert!(segments.is_empty());
    }

    #[test]
    fn duplicate_identical_rules_are_deduped() {
        let day = Utc.with_ymd_and_hms(2023, 6, 12, 0, 0, 0).unwrap();
        let rules = vec![
            rule(Weekday::Mon, "09:00:00", "17:00:00"),
            rule(Weekday::Mon, "09:00:00", "17:00:00"),
        ];
        let segments = expand_day("S", day, &rules, chrono_tz::Tz::UTC);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn overlapping_distinct_rules_are_not_merged() {
        let day = Utc.with_ymd_and_hms(2023, 6, 12, 0, 0, 0).unwrap();
        let rules = vec![
            rule(Weekday::Mon, "09:00:00", "17:00:00"),
            rule(Weekday::Mon, "12:00:00", "20:00:00"),
        ];
        let segments = expand_day("S", day, &rules, chrono_tz::Tz::UTC);
        assert_eq!(segments.len(), 2);
    }
}
