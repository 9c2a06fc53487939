//! Buffer module: Core data structures for the double-buffer rendering system.
//!
//! This module contains:
//! - [`Cell`]: The atomic unit of display, one character plus its style
//! - [`CellBuffer`]: A grid of cells representing the terminal screen
//! - [`Color`]: Packed 24-bit color with a "terminal default" sentinel
//! - [`Attributes`]: Text style bitflags
//! - [`diff`]: Diffing engine for generating minimal ANSI sequences

mod cell;
#[allow(clippy::module_inception)]
mod buffer;
pub mod diff;

pub use buffer::{CellBuffer, RowPaint, Snapshot, UNCLIPPED};
pub use cell::{Attributes, Cell, Color, Style};
