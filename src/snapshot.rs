//! Loads the three read-only input tables from CSV into the in-memory,
//! per-store-grouped [`storepulse_core::orchestrator::Snapshot`] the
//! engine reads from for the lifetime of a run.

use std::collections::HashMap;
use std::convert::TryFrom;

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::Deserialize;
use storepulse_core::orchestrator::Snapshot;
use storepulse_core::types::{BusinessHourRule, Observation, Status, StoreTimezone};

use storepulse_core::error::ReportError;

/// Validates the `store_id <= 36 chars` bound from spec §6 at this
/// loading boundary only; the core treats `store_id` as an opaque
/// `String` and never re-checks this.
struct StoreId(String);

impl StoreId {
    const MAX_LEN: usize = 36;

    fn parse(raw: String, table: &'static str) -> Result<Self, ReportError> {
        if raw.chars().count() > Self::MAX_LEN {
            tracing::error!(store_id = raw, table, "store_id exceeds 36 characters");
            return Err(ReportError::SchemaMismatch { table });
        }
        Ok(Self(raw))
    }

    fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Deserialize)]
struct ObservationRow {
    store_id: String,
    t_utc: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct BusinessHourRow {
    store_id: String,
    day_of_week: u8,
    start_local: String,
    end_local: String,
}

#[derive(Debug, Deserialize)]
struct TimezoneRow {
    store_id: String,
    tz: String,
}

/// Load the observations/business-hours/timezones CSV files named in
/// `config` into a [`Snapshot`]. A missing `store_id` column in any
/// table fails the whole load, per spec §7's schema-mismatch case.
pub fn load(config: &crate::config::AppConfig) -> Result<Snapshot, ReportError> {
    let observations_by_store = load_observations(&config.observations_csv_path)?;
    let rules_by_store = load_business_hours(&config.business_hours_csv_path)?;
    let timezone_by_store = load_timezones(&config.timezones_csv_path)?;

    Ok(Snapshot {
        observations_by_store,
        rules_by_store,
        timezone_by_store,
    })
}

fn load_observations(path: &str) -> Result<HashMap<String, Vec<Observation>>, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        tracing::error!(path, error = %e, "failed to open observations CSV");
        ReportError::SchemaMismatch { table: "observations" }
    })?;

    let mut by_store: HashMap<String, Vec<Observation>> = HashMap::new();
    for result in reader.deserialize::<ObservationRow>() {
        let row = result.map_err(|e| {
            tracing::error!(path, error = %e, "malformed row in observations table");
            ReportError::SchemaMismatch { table: "observations" }
        })?;

        let t_utc = parse_instant(&row.t_utc).ok_or_else(|| {
            tracing::error!(path, t_utc = row.t_utc, "unparseable t_utc in observations table");
            ReportError::SchemaMismatch { table: "observations" }
        })?;
        let status: Status = row.status.parse().map_err(|_| {
            tracing::error!(path, status = row.status, "unknown status in observations table");
            ReportError::SchemaMismatch { table: "observations" }
        })?;
        let store_id = StoreId::parse(row.store_id, "observations")?.into_inner();

        by_store.entry(store_id.clone()).or_default().push(Observation {
            store_id,
            t_utc,
            status,
        });
    }

    Ok(by_store)
}

fn load_business_hours(path: &str) -> Result<HashMap<String, Vec<BusinessHourRule>>, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        tracing::error!(path, error = %e, "failed to open business hours CSV");
        ReportError::SchemaMismatch { table: "business_hours" }
    })?;

    let mut by_store: HashMap<String, Vec<BusinessHourRule>> = HashMap::new();
    for result in reader.deserialize::<BusinessHourRow>() {
        let row = result.map_err(|e| {
            tracing::error!(path, error = %e, "malformed row in business hours table");
            ReportError::SchemaMismatch { table: "business_hours" }
        })?;

        let day_of_week = Weekday::try_from(row.day_of_week).map_err(|_| {
            tracing::error!(path, day_of_week = row.day_of_week, "day_of_week out of range 0..6 in business hours table");
            ReportError::SchemaMismatch { table: "business_hours" }
        })?;
        let start_local = parse_time(&row.start_local).ok_or_else(|| {
            tracing::error!(path, start_local = row.start_local, "unparseable start_local in business hours table");
            ReportError::SchemaMismatch { table: "business_hours" }
        })?;
        let end_local = parse_time(&row.end_local).ok_or_else(|| {
            tracing::error!(path, end_local = row.end_local, "unparseable end_local in business hours table");
            ReportError::SchemaMismatch { table: "business_hours" }
        })?;
        let store_id = StoreId::parse(row.store_id, "business_hours")?.into_inner();

        by_store.entry(store_id.clone()).or_default().push(BusinessHourRule {
            store_id,
            day_of_week,
            start_local,
            end_local,
        });
    }

    Ok(by_store)
}

/// Resolves each row's raw IANA string to a `chrono_tz::Tz` up front
/// (logging and defaulting to `America/Chicago` on an unknown zone, per
/// spec §4.2), so the `Snapshot` holds real `StoreTimezone` values
/// rather than unresolved strings. A store with no row at all is
/// absent from the map; `compute_store_row` defaults that case.
fn load_timezones(path: &str) -> Result<HashMap<String, StoreTimezone>, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        tracing::error!(path, error = %e, "failed to open timezones CSV");
        ReportError::SchemaMismatch { table: "timezones" }
    })?;

    let mut by_store = HashMap::new();
    for result in reader.deserialize::<TimezoneRow>() {
        let row = result.map_err(|e| {
            tracing::error!(path, error = %e, "malformed row in timezones table");
            ReportError::SchemaMismatch { table: "timezones" }
        })?;
        let store_id = StoreId::parse(row.store_id, "timezones")?.into_inner();
        let tz = storepulse_core::timezone::resolve(&store_id, Some(&row.tz));
        by_store.insert(store_id.clone(), StoreTimezone { store_id, tz });
    }

    Ok(by_store)
}

fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S").ok()
}
