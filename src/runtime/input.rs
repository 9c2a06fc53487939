//! Input pump: a dedicated thread that reads terminal events.
//!
//! The thread only reads and forwards. Events wait in a bounded crossbeam
//! channel until the frame loop drains them between frames, so nothing the
//! application owns is touched off the render thread.

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// An event delivered to the frame loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalEvent {
    /// A key was pressed (releases and repeats are filtered out).
    Key(KeyEvent),
    /// Mouse activity (only with mouse capture enabled).
    Mouse(MouseEvent),
    /// The terminal was resized.
    Resize {
        /// New width in columns.
        width: u16,
        /// New height in rows.
        height: u16,
    },
    /// Bracketed paste.
    Paste(String),
    /// Terminal gained focus.
    FocusGained,
    /// Terminal lost focus.
    FocusLost,
    /// Reading from the terminal failed.
    Error(String),
    /// The input thread is shutting down.
    Shutdown,
}

impl TerminalEvent {
    /// Convert a crossterm event. Returns `None` for events the loop never
    /// sees (key releases and repeats).
    pub fn from_crossterm(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            Event::Key(_) => None,
            Event::Mouse(mouse) => Some(Self::Mouse(mouse)),
            Event::Resize(width, height) => Some(Self::Resize { width, height }),
            Event::Paste(text) => Some(Self::Paste(text)),
            Event::FocusGained => Some(Self::FocusGained),
            Event::FocusLost => Some(Self::FocusLost),
        }
    }
}

/// Where the pump reads events from.
pub trait EventSource: Send + 'static {
    /// Wait up to `timeout` for an event to become available.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read the available event.
    fn read(&mut self) -> io::Result<Event>;
}

/// The real terminal, through crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        event::poll(timeout)
    }

    fn read(&mut self) -> io::Result<Event> {
        event::read()
    }
}

/// Handle to the input thread.
pub struct InputPump {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    receiver: Receiver<TerminalEvent>,
}

impl InputPump {
    /// Start reading the terminal.
    ///
    /// # Errors
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn(queue_depth: usize, poll_timeout: Duration) -> io::Result<Self> {
        Self::with_source(CrosstermEvents, queue_depth, poll_timeout)
    }

    /// Start reading from an arbitrary event source.
    ///
    /// # Errors
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn with_source<S: EventSource>(
        source: S,
        queue_depth: usize,
        poll_timeout: Duration,
    ) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = bounded(queue_depth.max(1));

        let thread_shutdown = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name("cellframe-input".to_string())
            .spawn(move || run_loop(source, &sender, &thread_shutdown, poll_timeout))?;

        Ok(Self {
            handle: Some(handle),
            shutdown,
            receiver,
        })
    }

    /// The queue the loop drains.
    pub const fn receiver(&self) -> &Receiver<TerminalEvent> {
        &self.receiver
    }

    /// Take every event queued so far without waiting.
    pub fn drain(&self) -> Vec<TerminalEvent> {
        self.receiver.try_iter().collect()
    }

    /// Ask the thread to stop. It notices within one poll timeout.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Stop the thread and wait for it to exit.
    pub fn join(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("input thread panicked");
            }
        }
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

impl std::fmt::Debug for InputPump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputPump")
            .field("queued", &self.receiver.len())
            .field("running", &self.handle.is_some())
            .finish()
    }
}

fn run_loop<S: EventSource>(
    mut source: S,
    sender: &Sender<TerminalEvent>,
    shutdown: &AtomicBool,
    poll_timeout: Duration,
) {
    tracing::debug!("input thread started");
    while !shutdown.load(Ordering::Relaxed) {
        let event = match source.poll(poll_timeout) {
            Ok(true) => match source.read() {
                Ok(event) => TerminalEvent::from_crossterm(event),
                Err(err) => Some(TerminalEvent::Error(err.to_string())),
            },
            Ok(false) => None,
            Err(err) => Some(TerminalEvent::Error(err.to_string())),
        };

        if let Some(event) = event {
            if !forward(sender, event, shutdown, poll_timeout) {
                tracing::debug!("input queue closed, input thread exiting");
                return;
            }
        }
    }
    let _ = sender.try_send(TerminalEvent::Shutdown);
    tracing::debug!("input thread stopped");
}

/// Send one event, waiting while the queue is full but never past shutdown.
/// Returns `false` once the thread should exit.
fn forward(
    sender: &Sender<TerminalEvent>,
    mut event: TerminalEvent,
    shutdown: &AtomicBool,
    poll_timeout: Duration,
) -> bool {
    loop {
        match sender.send_timeout(event, poll_timeout) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(pending)) => {
                if shutdown.load(Ordering::Relaxed) {
                    return false;
                }
                event = pending;
            }
            Err(SendTimeoutError::Disconnected(_)) => return false,
        }
    }
}
