//! Run-fatal error taxonomy, shared by the engine and the host
//! binary's report lifecycle. Store-local and interval-local problems
//! (unknown timezone, DST ambiguity, a single store's computation
//! failing inside a chunk) are *not* represented here — those are
//! logged and skipped per spec §7, never propagated as a `ReportError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("StoreStatus data is empty.")]
    EmptyObservations,

    #[error("required column `store_id` missing from table `{table}`")]
    SchemaMismatch { table: &'static str },

    /// Raised by the host binary's report store on a poll against an
    /// unknown `report_id`; the engine itself never returns this.
    #[error("report `{0}` not found")]
    ReportNotFound(String),
}
