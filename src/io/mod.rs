//! Input/output helpers.
//!
//! - metric CSV parsing (`ingest`)
//! - collector CSV output (`export`)
//! - ETag persistence for the collector (`etags`)
//! - the collector's per-member event cache (`cache`)

pub mod cache;
pub mod etags;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use etags::*;
pub use export::*;
pub use ingest::*;
