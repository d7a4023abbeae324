//! `vibe` library crate.
//!
//! The binary (`vibe`) is a thin wrapper around this library so that:
//!
//! - loading, parsing and binding are testable without spawning processes
//! - the same controller drives every surface (SVG, text, terminal UI)

pub mod app;
pub mod chart;
pub mod cli;
pub mod controller;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod load;
pub mod plot;
pub mod report;
pub mod tui;
