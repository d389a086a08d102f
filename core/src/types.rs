//! Core data model: observations, business-hour rules, timezones,
//! report windows and rows. Kept free of I/O so the engine can be
//! driven purely in-memory by tests and by the orchestrator alike.

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A closed two-variant status. Internal boundaries never carry a
/// free-form string for this; only the CSV/table boundary does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Inactive,
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(format!("unknown status {other:?}, expected active|inactive")),
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        };
        write!(f, "{s}")
    }
}

/// A single `active|inactive` polling sample for a store, UTC-aware.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation {
    pub store_id: String,
    pub t_utc: DateTime<Utc>,
    pub status: Status,
}

/// A recurring weekly local-time business-hour window for a store.
/// `day_of_week` follows spec's 0 = Monday convention via
/// `chrono::Weekday`, not a bare integer, so the engine never has to
/// re-derive the convention at each call site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusinessHourRule {
    pub store_id: String,
    pub day_of_week: Weekday,
    pub start_local: NaiveTime,
    pub end_local: NaiveTime,
}

impl BusinessHourRule {
    /// True iff the rule spans midnight and extends into the
    /// following local date (spec §3: `end_local <= start_local`).
    pub fn spans_midnight(&self) -> bool {
        self.end_local <= self.start_local
    }
}

/// The store's IANA timezone identifier, already resolved to a
/// `chrono_tz::Tz`. Construction from a raw string lives in
/// `timezone::resolve`, which applies the default-on-missing and
/// default-on-unknown policies.
#[derive(Clone, Debug)]
pub struct StoreTimezone {
    pub store_id: String,
    pub tz: chrono_tz::Tz,
}

/// One of the three rolling reporting windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WindowLabel {
    LastHour,
    LastDay,
    LastWeek,
}

impl WindowLabel {
    pub fn all() -> [WindowLabel; 3] {
        [WindowLabel::LastHour, WindowLabel::LastDay, WindowLabel::LastWeek]
    }

    /// The window's span against the run's reference instant `now`.
    pub fn span(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = match self {
            WindowLabel::LastHour => now - chrono::Duration::hours(1),
            WindowLabel::LastDay => now - chrono::Duration::days(1),
            WindowLabel::LastWeek => now - chrono::Duration::weeks(1),
        };
        (start, now)
    }
}

/// A concrete report window: the rolling label plus its resolved
/// `[start_utc, end_utc]` span for a particular run.
#[derive(Clone, Copy, Debug)]
pub struct ReportWindow {
    pub label: WindowLabel,
    pub start_utc: DateTime<Utc>,
    pub end_utc: DateTime<Utc>,
}

impl ReportWindow {
    pub fn for_now(label: WindowLabel, now: DateTime<Utc>) -> Self {
        let (start_utc, end_utc) = label.span(now);
        Self { label, start_utc, end_utc }
    }
}

/// One store's published row: already rounded into its publication
/// units and formatted as text, so CSV serialization cannot
/// reintroduce floating point drift.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub store_id: String,
    pub uptime_last_hour: String,
    pub uptime_last_day: String,
    pub uptime_last_week: String,
    pub downtime_last_hour: String,
    pub downtime_last_day: String,
    pub downtime_last_week: String,
}

pub const REPORT_HEADER: [&str; 7] = [
    "store_id",
    "uptime_last_hour",
    "uptime_last_day",
    "uptime_last_week",
    "downtime_last_hour",
    "downtime_last_day",
    "downtime_last_week",
];
