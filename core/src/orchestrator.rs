//! Partitions the store set, computes per-store rows by composing the
//! Clock, Business-Hour Expander and Segment Evaluator, and
//! concatenates results into a single CSV body.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use rayon::prelude::*;

use crate::business_hours::expand_day;
use crate::error::ReportError;
use crate::rounding::{ms_to_hours_2dp, ms_to_minutes};
use crate::segment::{evaluate_segment, prepare_window};
use crate::timezone;
use crate::types::{BusinessHourRule, Observation, ReportRow, StoreTimezone, WindowLabel, REPORT_HEADER};

/// Read-only, per-store-grouped view over the three input tables for
/// one run. Construction (grouping raw rows by `store_id`) happens
/// once at run start; workers only ever read from this.
pub struct Snapshot {
    pub observations_by_store: HashMap<String, Vec<Observation>>,
    pub rules_by_store: HashMap<String, Vec<BusinessHourRule>>,
    /// Only present for stores with an explicit `StoreTimezone` row,
    /// already resolved (unknown zone strings defaulted and logged at
    /// load time). A missing entry means "no row at all" and is
    /// defaulted by [`timezone::resolve`] in `compute_store_row`.
    pub timezone_by_store: HashMap<String, StoreTimezone>,
}

impl Snapshot {
    pub fn store_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.observations_by_store.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn floor_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc()
}

/// Compute one store's row across all three windows. Never panics on
/// bad per-store data; the only failure modes are snapshot-level
/// (handled by the caller before this is ever invoked per store).
pub fn compute_store_row(store_id: &str, snapshot: &Snapshot, now: DateTime<Utc>) -> ReportRow {
    let tz = match snapshot.timezone_by_store.get(store_id) {
        Some(store_tz) => store_tz.tz,
        None => timezone::resolve(store_id, None),
    };

    let mut observations: Vec<Observation> = snapshot
        .observations_by_store
        .get(store_id)
        .cloned()
        .unwrap_or_default();
    observations.sort_by_key(|o| o.t_utc);

    let rules: Vec<BusinessHourRule> = snapshot.rules_by_store.get(store_id).cloned().unwrap_or_default();

    let mut minutes = HashMap::new();
    let mut hours = HashMap::new();

    for label in WindowLabel::all() {
        let (window_start, window_end) = label.span(now);
        let prepared = prepare_window(&observations, window_start, window_end, now);

        let mut uptime_ms: i64 = 0;
        let mut downtime_ms: i64 = 0;

        let mut day_cursor = floor_day(window_start);
        while day_cursor <= window_end {
            let day_of_week = day_cursor.weekday();
            let daily_rules: Vec<BusinessHourRule> = rules.iter().filter(|r| r.day_of_week == day_of_week).cloned().collect();
            let is_24_7 = daily_rules.is_empty();

            for (bh_start, bh_end) in expand_day(store_id, day_cursor, &daily_rules, tz) {
                let effective_start = window_start.max(bh_start);
                let effective_end = window_end.min(bh_end);
                if effective_start >= effective_end {
                    continue;
                }
                let (up, down) = evaluate_segment((effective_start, effective_end), &prepared, is_24_7);
                uptime_ms += up;
                downtime_ms += down;
            }

            day_cursor += Duration::days(1);
        }

        match label {
            WindowLabel::LastHour => {
                minutes.insert(label, (ms_to_minutes(uptime_ms), ms_to_minutes(downtime_ms)));
            }
            WindowLabel::LastDay | WindowLabel::LastWeek => {
                hours.insert(label, (ms_to_hours_2dp(uptime_ms), ms_to_hours_2dp(downtime_ms)));
            }
        }
    }

    let (hour_up, hour_down) = minutes.get(&WindowLabel::LastHour).cloned().unwrap_or((0, 0));
    let (day_up, day_down) = hours.get(&WindowLabel::LastDay).cloned().unwrap_or_else(|| ("0.00".into(), "0.00".into()));
    let (week_up, week_down) = hours.get(&WindowLabel::LastWeek).cloned().unwrap_or_else(|| ("0.00".into(), "0.00".into()));

    ReportRow {
        store_id: store_id.to_string(),
        uptime_last_hour: hour_up.to_string(),
        uptime_last_day: day_up,
        uptime_last_week: week_up,
        downtime_last_hour: hour_down.to_string(),
        downtime_last_day: day_down,
        downtime_last_week: week_down,
    }
}

fn rows_to_csv(rows: &[ReportRow]) -> String {
    // csv's default terminator is CRLF; the published report is
    // LF-only regardless of platform.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(REPORT_HEADER).expect("header write cannot fail writing to a Vec");
    for row in rows {
        writer
            .write_record([
                &row.store_id,
                &row.uptime_last_hour,
                &row.uptime_last_day,
                &row.uptime_last_week,
                &row.downtime_last_hour,
                &row.downtime_last_day,
                &row.downtime_last_week,
            ])
            .expect("row write cannot fail writing to a Vec");
    }
    String::from_utf8(writer.into_inner().expect("flushing an in-memory writer cannot fail")).expect("CSV output is ASCII/UTF-8 by construction")
}

/// Sequential reference implementation: one worker, store rows
/// produced in input order. Used by tests and by small runs where
/// chunking overhead isn't worth it.
pub fn build_report(snapshot: &Snapshot, now: DateTime<Utc>) -> Result<String, ReportError> {
    if snapshot.observations_by_store.is_empty() {
        return Err(ReportError::EmptyObservations);
    }

    let rows: Vec<ReportRow> = snapshot
        .store_ids()
        .iter()
        .map(|store_id| compute_store_row(store_id, snapshot, now))
        .collect();

    Ok(rows_to_csv(&rows))
}

/// Map-reduce variant: partitions store ids into `chunk_size` slices,
/// computes each chunk's rows in parallel via the global `rayon` pool
/// (within a chunk, per-store computation stays sequential per spec
/// §5), and reduces by concatenation. A store whose row computation
/// fails is logged and dropped from its chunk; a malformed snapshot
/// fails the whole run before any chunk starts, matching spec §7's
/// "Chunk-level exception: propagate; run fails."
pub fn build_report_chunked(snapshot: &Snapshot, now: DateTime<Utc>, chunk_size: usize) -> Result<String, ReportError> {
    if snapshot.observations_by_store.is_empty() {
        return Err(ReportError::EmptyObservations);
    }
    let chunk_size = chunk_size.max(1);

    let store_ids = snapshot.store_ids();
    let chunks: Vec<&[String]> = store_ids.chunks(chunk_size).collect();

    tracing::info!(store_count = store_ids.len(), chunk_count = chunks.len(), chunk_size, "computing report in chunks");

    let rows: Vec<ReportRow> = chunks
        .par_iter()
        .flat_map(|chunk| {
            chunk
                .iter()
                .filter_map(|store_id| {
                    let row = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| compute_store_row(store_id, snapshot, now)));
                    match row {
                        Ok(row) => Some(row),
                        Err(_) => {
                            tracing::error!(store_id, "computation panicked, skipping store for this run");
                            None
                        }
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(rows_to_csv(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use chrono::TimeZone;

    fn empty_snapshot() -> Snapshot {
        Snapshot {
            observations_by_store: HashMap::new(),
            rules_by_store: HashMap::new(),
            timezone_by_store: HashMap::new(),
        }
    }

    #[test]
    fn empty_observations_table_fails_the_run() {
        let snapshot = empty_snapshot();
        let now = Utc::now();
        assert!(matches!(build_report(&snapshot, now), Err(ReportError::EmptyObservations)));
        assert!(matches!(build_report_chunked(&snapshot, now, 10), Err(ReportError::EmptyObservations)));
    }

    // Scenario 1 end to end through the orchestrator: a single 24/7
    // store with one active sample 30 minutes into the last hour.
    #[test]
    fn single_24_7_store_one_active_sample_end_to_end() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let obs = Observation { store_id: "A".into(), t_utc: now - Duration::minutes(30), status: Status::Active };

        let mut observations_by_store = HashMap::new();
        observations_by_store.insert("A".to_string(), vec![obs]);
        let mut timezone_by_store = HashMap::new();
        timezone_by_store.insert("A".to_string(), StoreTimezone { store_id: "A".to_string(), tz: chrono_tz::Tz::UTC });

        let snapshot = Snapshot {
            observations_by_store,
            rules_by_store: HashMap::new(),
            timezone_by_store,
        };

        let csv = build_report(&snapshot, now).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next().unwrap(), REPORT_HEADER.join(","));
        let row = lines.next().unwrap();
        assert_eq!(row, "A,30,0.50,0.50,30,23.50,167.50");
    }

    #[test]
    fn idempotent_across_repeated_runs_with_fixed_now() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let obs = Observation { store_id: "A".into(), t_utc: now - Duration::minutes(30), status: Status::Active };
        let mut observations_by_store = HashMap::new();
        observations_by_store.insert("A".to_string(), vec![obs]);
        let snapshot = Snapshot {
            observations_by_store,
            rules_by_store: HashMap::new(),
            timezone_by_store: HashMap::new(),
        };

        let first = build_report(&snapshot, now).unwrap();
        let second = build_report(&snapshot, now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn chunked_and_sequential_agree() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap();
        let mut observations_by_store = HashMap::new();
        for i in 0..5 {
            let id = format!("store-{i}");
            observations_by_store.insert(
                id.clone(),
                vec![Observation { store_id: id, t_utc: now - Duration::minutes(10), status: Status::Active }],
            );
        }
        let snapshot = Snapshot {
            observations_by_store,
            rules_by_store: HashMap::new(),
            timezone_by_store: HashMap::new(),
        };

        let sequential = build_report(&snapshot, now).unwrap();
        let chunked = build_report_chunked(&snapshot, now, 2).unwrap();

        let mut seq_lines: Vec<&str> = sequential.lines().collect();
        let mut chunk_lines: Vec<&str> = chunked.lines().collect();
        seq_lines.sort();
        chunk_lines.sort();
        assert_eq!(seq_lines, chunk_lines);
    }
}
