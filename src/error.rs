//! Error type shared by every fallible cellframe operation.
//!
//! Drawing never fails on coordinates (out-of-bounds writes are clipped), so
//! the variants here cover programmer errors (bad dimensions, lifecycle
//! misuse, out-of-range colors) and terminal I/O.

use thiserror::Error;

/// Errors produced by cellframe.
#[derive(Debug, Error)]
pub enum Error {
    /// A buffer was created or resized with a zero dimension.
    #[error("invalid buffer dimensions {width}x{height}: both must be positive")]
    InvalidDimensions {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },

    /// A packed color was neither -1 nor within `0..=0xFFFFFF`.
    #[error("color value {0} is neither -1 nor a packed 24-bit RGB value")]
    InvalidColor(i64),

    /// `begin_frame` was called while a frame was already in flight.
    #[error("begin_frame called while frame {frame} is still in progress")]
    FrameInProgress {
        /// Number of the frame that is still open.
        frame: u64,
    },

    /// `end_frame` was called without a matching `begin_frame`.
    #[error("end_frame called with no frame in progress")]
    NoFrameInProgress,

    /// Engine configuration rejected by [`EngineConfig::validate`](crate::EngineConfig::validate).
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(&'static str),

    /// Writing to or configuring the terminal failed.
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
