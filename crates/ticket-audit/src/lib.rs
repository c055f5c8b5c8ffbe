//! Support-ticket quality auditing.
//!
//! The [`audit`] module holds the rule engine: timestamp extraction, comment normalization,
//! business-calendar cadence analysis, vocabulary canonicalization, phrase matching, the rule
//! registry and the scoring aggregator. The remaining modules carry the service plumbing shared
//! with the HTTP/CLI front-end.

pub mod audit;
pub mod config;
pub mod error;
pub mod telemetry;
