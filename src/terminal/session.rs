//! Terminal session: raw mode, alternate screen and cursor visibility.
//!
//! Entering a session changes global terminal state; the guard puts every
//! piece back on drop, including when setup fails halfway through.

use crate::config::EngineConfig;
use crate::error::Result;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::io;

/// Guard over the terminal modes a full-screen application needs.
#[derive(Debug)]
pub struct TerminalSession {
    raw_mode: bool,
    alternate_screen: bool,
    mouse: bool,
    cursor_hidden: bool,
}

impl TerminalSession {
    /// Enter raw mode, then optionally the alternate screen and mouse
    /// capture, and hide the cursor.
    ///
    /// # Errors
    /// Returns the first terminal error. Modes already entered are left
    /// again before returning.
    pub fn enter(config: &EngineConfig) -> Result<Self> {
        let mut session = Self {
            raw_mode: false,
            alternate_screen: false,
            mouse: false,
            cursor_hidden: false,
        };

        terminal::enable_raw_mode()?;
        session.raw_mode = true;

        let mut stdout = io::stdout();
        if config.alternate_screen {
            execute!(stdout, EnterAlternateScreen)?;
            session.alternate_screen = true;
        }
        if config.enable_mouse {
            execute!(stdout, EnableMouseCapture)?;
            session.mouse = true;
        }
        execute!(stdout, cursor::Hide)?;
        session.cursor_hidden = true;

        tracing::debug!(
            alternate_screen = session.alternate_screen,
            mouse = session.mouse,
            "terminal session entered"
        );
        Ok(session)
    }

    /// Current terminal size as (columns, rows).
    ///
    /// # Errors
    /// Returns an error if the size cannot be queried.
    pub fn size() -> Result<(u16, u16)> {
        Ok(terminal::size()?)
    }

    /// Whether any terminal mode is still changed.
    pub const fn is_active(&self) -> bool {
        self.raw_mode || self.alternate_screen || self.mouse || self.cursor_hidden
    }

    /// Put the terminal back the way it was. Safe to call more than once.
    ///
    /// Every step is attempted even if an earlier one fails.
    ///
    /// # Errors
    /// Returns the first error encountered.
    pub fn restore(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        let mut first_error: Option<io::Error> = None;
        let mut note = |result: io::Result<()>| {
            if let Err(err) = result {
                first_error.get_or_insert(err);
            }
        };

        if self.cursor_hidden {
            note(execute!(stdout, cursor::Show));
            self.cursor_hidden = false;
        }
        if self.mouse {
            note(execute!(stdout, DisableMouseCapture));
            self.mouse = false;
        }
        if self.alternate_screen {
            note(execute!(stdout, LeaveAlternateScreen));
            self.alternate_screen = false;
        }
        if self.raw_mode {
            note(terminal::disable_raw_mode());
            self.raw_mode = false;
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(err) = self.restore() {
            tracing::warn!(error = %err, "failed to restore terminal");
        }
    }
}
