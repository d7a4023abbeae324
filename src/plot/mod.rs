//! Text rendering of a timeline (`ascii`).

pub mod ascii;

pub use ascii::{AsciiChart, AsciiSurface, render_ascii_timeline};
