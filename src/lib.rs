//! Comparative market analysis engine and supporting infrastructure.
//!
//! The `valuation` module is the core: request validation, comparable
//! screening, similarity scoring, dollar adjustments, and estimate
//! synthesis. `pool` loads comparable sales from CSV exports, `demo`
//! provides seeded collaborators for offline runs, and `config` /
//! `telemetry` / `error` carry the application plumbing.

pub mod config;
pub mod demo;
pub mod error;
pub mod pool;
pub mod telemetry;
pub mod valuation;
