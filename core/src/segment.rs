//! The algorithmic heart of the engine: interpolates a piecewise-
//! constant status signal from sparse samples to compute elapsed time
//! in each state within a UTC interval.

use chrono::{DateTime, Utc};

use crate::types::{Observation, Status};

/// Eight-day rule: an `O_before` reading older than this relative to
/// the run's reference instant is not considered indicative of
/// current state and is discarded.
pub fn stale_observation_cutoff() -> chrono::Duration {
    chrono::Duration::days(8)
}

/// Build the de-duplicated, time-sorted observation sequence `R` for
/// one `(store, report-window)` pair, to be reused across every
/// business-hour segment that window's days produce.
///
/// `store_sorted` must already be sorted ascending by `t_utc` with
/// ties preserving original input order (a stable sort), so that
/// among duplicate timestamps the later-in-iteration-order value
/// survives dedup.
pub fn prepare_window(
    store_sorted: &[Observation],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Vec<Observation> {
    let mut combined: Vec<Observation> = Vec::new();

    let before = store_sorted
        .iter()
        .rev()
        .find(|o| o.t_utc < window_start)
        .filter(|o| now.signed_duration_since(o.t_utc) <= stale_observation_cutoff())
        .cloned();
    if let Some(o) = before {
        combined.push(o);
    }

    combined.extend(
        store_sorted
            .iter()
            .filter(|o| o.t_utc >= window_start && o.t_utc <= window_end)
            .cloned(),
    );

    if let Some(o) = store_sorted.iter().find(|o| o.t_utc > window_end).cloned() {
        combined.push(o);
    }

    dedup_by_timestamp(combined)
}

fn dedup_by_timestamp(items: Vec<Observation>) -> Vec<Observation> {
    let mut out: Vec<Observation> = Vec::with_capacity(items.len());
    for obs in items {
        if let Some(last) = out.last_mut() {
            if last.t_utc == obs.t_utc {
                *last = obs;
                continue;
            }
        }
        out.push(obs);
    }
    out
}

/// Compute `(uptime_ms, downtime_ms)` for a single half-open UTC
/// interval `[S, E)`, interpolating status from `prepared` (the
/// output of [`prepare_window`] for the containing report window).
///
/// `is_24_7` must be true iff the calendar day containing this
/// interval had no `BusinessHourRule`s (a fully open day).
pub fn evaluate_segment(interval: (DateTime<Utc>, DateTime<Utc>), prepared: &[Observation], is_24_7: bool) -> (i64, i64) {
    let (start, end) = interval;

    if prepared.is_empty() {
        let duration_ms = (end - start).num_milliseconds().max(0);
        return if is_24_7 { (0, duration_ms) } else { (0, 0) };
    }

    let initial_status = prepared.iter().rev().find(|o| o.t_utc <= start).map(|o| o.status);

    let mut cursor = start;
    let mut last_status = initial_status;
    let mut uptime_ms: i64 = 0;
    let mut downtime_ms: i64 = 0;

    for obs in prepared.iter().filter(|o| o.t_utc > start && o.t_utc <= end) {
        let delta = obs.t_utc - cursor;

        match last_status {
            // Spec's reference resolution for the None-initial case
            // (§4.3 step 5 / §9): attribute the whole gap to
            // downtime rather than bisecting against the new sample,
            // which is what a literal reading of step 3's "else to
            // o.status" would otherwise do.
            None => downtime_ms += delta.num_milliseconds(),
            Some(last) if last != obs.status => {
                let delta_ns = delta.num_nanoseconds().expect("segment gaps fit in i64 nanoseconds");
                let first_half_ns = delta_ns / 2;
                let second_half_ns = delta_ns - first_half_ns;
                attribute(&mut uptime_ms, &mut downtime_ms, last, first_half_ns / 1_000_000);
                attribute(&mut uptime_ms, &mut downtime_ms, obs.status, second_half_ns / 1_000_000);
            }
            Some(last) => attribute(&mut uptime_ms, &mut downtime_ms, last, delta.num_milliseconds()),
        }

        cursor = obs.t_utc;
        last_status = Some(obs.status);
    }

    if cursor < end {
        let remainder_ms = (end - cursor).num_milliseconds();
        match last_status {
            Some(Status::Active) => uptime_ms += remainder_ms,
            _ => downtime_ms += remainder_ms,
        }
    }

    (uptime_ms, downtime_ms)
}

fn attribute(uptime_ms: &mut i64, downtime_ms: &mut i64, status: Status, ms: i64) {
    match status {
        Status::Active => *uptime_ms += ms,
        Status::Inactive => *downtime_ms += ms,
    }
}
