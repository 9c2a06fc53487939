//! Runtime: the cooperative, single-threaded frame loop.
//!
//! ```text
//! ┌──────────────┐  TerminalEvent   ┌──────────────────────────────┐
//! │ Input Thread │ ───────────────▶ │ queue (bounded)              │
//! └──────────────┘                  └──────────────┬───────────────┘
//!                                                  │ drained between frames
//!                                                  ▼
//!          ┌──────────────────────────────────────────────────────┐
//!          │ FrameLoop: events → begin → App::draw → end → tick   │
//!          └──────────────────────────────────────────────────────┘
//! ```
//!
//! Only the loop's thread touches the compositor, the cache and the
//! application. One frame is in flight at a time; a stop request is honored
//! between frames, never in the middle of one.

mod input;

pub use input::{CrosstermEvents, EventSource, InputPump, TerminalEvent};

use crate::cache::{RenderCache, WidgetKey};
use crate::compositor::{Compositor, FrameStats, WidgetOutcome};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::layout::Rect;
use crate::terminal::TerminalSession;
use crossbeam_channel::Receiver;
use std::fmt;
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared run/stop switch, checked between frames.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    /// A flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Whether the loop should keep going.
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Ask the loop to stop after the current frame.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Requests an application makes while handling events or ticking.
///
/// Applied by the loop before the next frame starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopControl {
    stop: bool,
    clear: bool,
    transition: bool,
}

impl LoopControl {
    /// Stop the loop before the next frame.
    pub fn stop(&mut self) {
        self.stop = true;
    }

    /// Clear the screen and repaint everything next frame.
    pub fn request_clear(&mut self) {
        self.clear = true;
    }

    /// Switch to a different screen: drop every cached widget and clear.
    pub fn transition(&mut self) {
        self.transition = true;
        self.clear = true;
    }

    /// Whether a stop was requested.
    pub const fn stop_requested(&self) -> bool {
        self.stop
    }
}

/// What a frame is drawn with: the compositor plus the widget cache.
pub struct FrameContext<'a, W: Write> {
    /// Draw API for this frame.
    pub compositor: &'a mut Compositor<W>,
    /// The process-wide widget cache.
    pub cache: &'a mut RenderCache,
}

impl<W: Write> FrameContext<'_, W> {
    /// Draw a widget through the cache. See [`Compositor::render_widget`].
    pub fn render_widget<F, E>(&mut self, key: &WidgetKey, hash: &str, render: F) -> WidgetOutcome
    where
        F: FnOnce(&mut Compositor<W>, Rect) -> std::result::Result<(), E>,
        E: fmt::Display,
    {
        self.compositor.render_widget(self.cache, key, hash, render)
    }
}

/// An application driven by the frame loop.
pub trait App {
    /// Draw one frame. Called between `begin_frame` and `end_frame`.
    fn draw<W: Write>(&mut self, frame: &mut FrameContext<'_, W>);

    /// Handle one input event. Called between frames.
    fn handle_event(&mut self, _event: &TerminalEvent, _control: &mut LoopControl) {}

    /// Called once after every frame, for quick non-blocking work.
    fn tick(&mut self, _stats: &FrameStats, _control: &mut LoopControl) {}
}

/// Frame loop over any output sink.
///
/// Owns the compositor and the render cache; the terminal-facing
/// [`Runtime`] wraps one of these around stdout.
pub struct FrameLoop<W: Write> {
    compositor: Compositor<W>,
    cache: RenderCache,
    run: RunFlag,
    frame_duration: Duration,
}

impl<W: Write> FrameLoop<W> {
    /// Create a loop drawing to `writer`.
    ///
    /// # Errors
    /// Returns an error if the configuration or dimensions are invalid.
    pub fn new(writer: W, width: u16, height: u16, config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            compositor: Compositor::new(writer, width, height)?,
            cache: RenderCache::new(config.cache_capacity),
            run: RunFlag::new(),
            frame_duration: config.frame_duration(),
        })
    }

    /// Set the minimum time between frame starts (zero disables pacing).
    #[must_use]
    pub const fn with_frame_duration(mut self, frame_duration: Duration) -> Self {
        self.frame_duration = frame_duration;
        self
    }

    /// A handle that stops the loop from anywhere.
    pub fn run_flag(&self) -> RunFlag {
        self.run.clone()
    }

    /// The compositor.
    pub const fn compositor(&self) -> &Compositor<W> {
        &self.compositor
    }

    /// Mutable access to the compositor.
    pub const fn compositor_mut(&mut self) -> &mut Compositor<W> {
        &mut self.compositor
    }

    /// The widget cache.
    pub const fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Hand queued events to the application and apply what it asks for.
    ///
    /// Resize events resize the compositor before the application sees them;
    /// `Shutdown` stops the loop.
    pub fn handle_events<A, I>(&mut self, app: &mut A, events: I)
    where
        A: App,
        I: IntoIterator<Item = TerminalEvent>,
    {
        let mut control = LoopControl::default();
        for event in events {
            match &event {
                TerminalEvent::Resize { width, height } => {
                    if let Err(err) = self.compositor.resize(*width, *height) {
                        tracing::warn!(error = %err, "ignoring resize");
                    }
                }
                TerminalEvent::Shutdown => control.stop(),
                TerminalEvent::Error(message) => {
                    tracing::warn!(%message, "terminal input error");
                }
                _ => {}
            }
            app.handle_event(&event, &mut control);
        }
        self.apply(control);
    }

    /// Run exactly one frame: begin, draw, end, tick.
    ///
    /// # Errors
    /// Returns the compositor's error if the frame could not be written. The
    /// frame has still completed and the next one repaints fully.
    pub fn run_frame<A: App>(&mut self, app: &mut A) -> Result<FrameStats> {
        self.compositor.begin_frame()?;
        {
            let mut frame = FrameContext {
                compositor: &mut self.compositor,
                cache: &mut self.cache,
            };
            app.draw(&mut frame);
        }
        let stats = self.compositor.end_frame()?;

        let mut control = LoopControl::default();
        app.tick(&stats, &mut control);
        self.apply(control);
        Ok(stats)
    }

    /// Run until stopped, draining `events` between frames.
    ///
    /// Returns the number of frames rendered.
    ///
    /// # Errors
    /// Stops at the first frame whose output could not be written.
    pub fn run<A: App>(&mut self, app: &mut A, events: &Receiver<TerminalEvent>) -> Result<u64> {
        let mut frames = 0;
        while self.run.is_running() {
            let started = Instant::now();

            self.handle_events(app, events.try_iter());
            if !self.run.is_running() {
                break;
            }

            self.run_frame(app)?;
            frames += 1;

            let elapsed = started.elapsed();
            if elapsed < self.frame_duration {
                std::thread::sleep(self.frame_duration - elapsed);
            }
        }
        tracing::debug!(frames, "frame loop stopped");
        Ok(frames)
    }

    fn apply(&mut self, control: LoopControl) {
        if control.transition {
            self.cache.clear();
        }
        if control.clear {
            self.compositor.request_clear();
        }
        if control.stop {
            self.run.stop();
        }
    }
}

impl<W: Write> fmt::Debug for FrameLoop<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameLoop")
            .field("compositor", &self.compositor)
            .field("cache", &self.cache.stats())
            .field("running", &self.run.is_running())
            .field("frame_duration", &self.frame_duration)
            .finish()
    }
}

/// A frame loop on the real terminal.
///
/// Fields drop in order: the loop, then the input thread, then the terminal
/// session, so the terminal is restored last.
pub struct Runtime {
    frame_loop: FrameLoop<Stdout>,
    input: InputPump,
    session: TerminalSession,
}

impl Runtime {
    /// Set up the terminal and start reading input.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or terminal setup
    /// fails. Anything already changed on the terminal is restored.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let session = TerminalSession::enter(config)?;
        let (width, height) = TerminalSession::size()?;
        let frame_loop = FrameLoop::new(io::stdout(), width, height, config)?;
        let input = InputPump::spawn(config.input_queue_depth, config.input_poll_timeout)?;

        tracing::info!(width, height, fps = config.target_fps, "runtime started");
        Ok(Self {
            frame_loop,
            input,
            session,
        })
    }

    /// A handle that stops the loop from anywhere.
    pub fn run_flag(&self) -> RunFlag {
        self.frame_loop.run_flag()
    }

    /// Run `app` until it stops the loop or the input thread shuts down.
    ///
    /// # Errors
    /// Returns the first terminal write error.
    pub fn run<A: App>(&mut self, app: &mut A) -> Result<u64> {
        self.frame_loop.run(app, self.input.receiver())
    }

    /// The underlying frame loop.
    pub const fn frame_loop(&self) -> &FrameLoop<Stdout> {
        &self.frame_loop
    }

    /// Restore the terminal now instead of on drop.
    ///
    /// # Errors
    /// Returns the first error hit while restoring.
    pub fn shutdown(mut self) -> Result<()> {
        self.input.shutdown();
        self.session.restore()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("frame_loop", &self.frame_loop)
            .field("input", &self.input)
            .field("session", &self.session)
            .finish()
    }
}
