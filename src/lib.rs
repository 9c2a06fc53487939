//! # cellframe
//!
//! A differential character-cell compositor for terminal applications.
//!
//! Applications draw into an in-memory grid of cells; once per frame the
//! engine compares that grid with what the terminal already shows and writes
//! only the difference, as a single ANSI byte stream.
//!
//! ## Core Concepts
//!
//! - **Double-buffered rendering**: a backbuffer for drawing and a baseline
//!   of what is on screen, diffed once per frame
//! - **Run-length output**: changed cells sharing a style go out as one run
//!   with one set of color escapes
//! - **Frame lifecycle**: `begin_frame` → draw calls → `end_frame`, nothing
//!   reaches the terminal in between
//! - **Widget cache**: unchanged widgets are blitted from a bounded LRU
//!   cache instead of being redrawn
//! - **Cooperative loop**: input is read on its own thread but only handled
//!   between frames
//!
//! ## Example
//!
//! ```rust
//! use cellframe::{buffer::diff::build_diff, CellBuffer, Color, Style};
//!
//! let previous = CellBuffer::new(80, 24).unwrap();
//! let mut current = previous.clone();
//! current.write_str(0, 0, "AB", Style::new(Color::from_u32(0xFF0000), Color::DEFAULT));
//!
//! assert_eq!(
//!     build_diff(&current, Some(&previous)),
//!     "\x1b[1;1H\x1b[38;2;255;0;0mAB\x1b[0m"
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod buffer;
pub mod cache;
pub mod compositor;
pub mod config;
pub mod error;
pub mod layout;
pub mod runtime;
pub mod terminal;

// Re-exports for convenience
pub use buffer::{Attributes, Cell, CellBuffer, Color, RowPaint, Snapshot, Style};
pub use cache::{content_hash, CacheStats, CachedWidget, RenderCache, WidgetKey};
pub use compositor::{Compositor, FrameState, FrameStats, RenderStats, Span, StyledText, WidgetOutcome};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use layout::Rect;
pub use runtime::{App, FrameContext, FrameLoop, LoopControl, RunFlag, Runtime, TerminalEvent};
pub use terminal::{OutputBuffer, TerminalSession};
