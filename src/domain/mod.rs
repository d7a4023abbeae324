//! Domain types used throughout the load/bind cycle and the collector.
//!
//! This module defines:
//!
//! - chart input (`ParsedPoint`, `TimestampEncoding`)
//! - fixed chart display settings (`ChartConfig`, `TickInterval`)
//! - collector aggregates (`DailyInfo`, `CollectedMetric`)

pub mod types;

pub use types::*;
