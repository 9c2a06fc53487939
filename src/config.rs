//! Engine configuration.

use crate::cache::DEFAULT_CAPACITY;
use crate::error::{Error, Result};
use std::time::Duration;

/// Configuration for a [`Runtime`](crate::runtime::Runtime) and its
/// terminal session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Target frames per second.
    pub target_fps: u32,
    /// How long the input thread waits for an event before checking for
    /// shutdown.
    pub input_poll_timeout: Duration,
    /// Whether to enable mouse capture.
    pub enable_mouse: bool,
    /// Whether to use the alternate screen buffer.
    pub alternate_screen: bool,
    /// Number of widgets kept in the render cache (0 disables it).
    pub cache_capacity: usize,
    /// Input events buffered between frames before the input thread blocks.
    pub input_queue_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            input_poll_timeout: Duration::from_millis(10),
            enable_mouse: false,
            alternate_screen: true,
            cache_capacity: DEFAULT_CAPACITY,
            input_queue_depth: 64,
        }
    }
}

impl EngineConfig {
    /// Check the configuration for values the runtime cannot work with.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.target_fps == 0 {
            return Err(Error::InvalidConfig("target_fps must be at least 1"));
        }
        if self.target_fps > 1000 {
            return Err(Error::InvalidConfig("target_fps must be at most 1000"));
        }
        if self.input_poll_timeout.is_zero() {
            return Err(Error::InvalidConfig("input_poll_timeout must be non-zero"));
        }
        if self.input_queue_depth == 0 {
            return Err(Error::InvalidConfig("input_queue_depth must be at least 1"));
        }
        Ok(())
    }

    /// Time budget of one frame at the target rate.
    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps.max(1)
    }

    /// Set the target frame rate.
    #[must_use]
    pub const fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Set the input poll timeout.
    #[must_use]
    pub const fn with_input_poll_timeout(mut self, timeout: Duration) -> Self {
        self.input_poll_timeout = timeout;
        self
    }

    /// Enable or disable mouse capture.
    #[must_use]
    pub const fn with_mouse(mut self, enable: bool) -> Self {
        self.enable_mouse = enable;
        self
    }

    /// Use the alternate screen or draw over the main one.
    #[must_use]
    pub const fn with_alternate_screen(mut self, enable: bool) -> Self {
        self.alternate_screen = enable;
        self
    }

    /// Set the render cache capacity.
    #[must_use]
    pub const fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the input queue depth.
    #[must_use]
    pub const fn with_input_queue_depth(mut self, depth: usize) -> Self {
        self.input_queue_depth = depth;
        self
    }
}
