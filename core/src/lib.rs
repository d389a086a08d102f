//! # storepulse-core
//!
//! Business-hour-aware uptime/downtime metrics engine for a fleet of
//! stores. Pure computation, no I/O: given a snapshot of observations,
//! business-hour rules and store timezones, produces a CSV report body.
//!
//! ## Quick start
//!
//! ```rust
//! use storepulse_core::prelude::*;
//! use storepulse_core::clock::SystemClock;
//!
//! # fn run(snapshot: Snapshot) -> Result<String, ReportError> {
//! let now = SystemClock.now();
//! build_report(&snapshot, now)
//! # }
//! ```

pub mod business_hours;
pub mod clock;
pub mod error;
pub mod orchestrator;
pub mod rounding;
pub mod segment;
pub mod timezone;
pub mod types;

pub mod prelude {
    //! Import this module to get the types most callers need:
    //! ```rust
    //! use storepulse_core::prelude::*;
    //! ```

    pub use crate::clock::Clock;
    pub use crate::error::ReportError;
    pub use crate::orchestrator::{build_report, build_report_chunked, Snapshot};
    pub use crate::types::{BusinessHourRule, Observation, ReportRow, Status, StoreTimezone};
}
