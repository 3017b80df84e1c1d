//! Per-provider translation of raw samples into the unified metric schema.
//!
//! Every mapper is a pure function from one raw provider record to zero or
//! more `UnifiedMetric`s. Unit conversion happens here; downstream code never
//! converts. Unrecognized sample types and malformed samples are skipped, not
//! errors: ingestion is best-effort per record.

pub mod healthkit;
pub mod withings;
pub mod oura;
pub mod csv;
