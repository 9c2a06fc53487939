//! `OutputBuffer`: Accumulates one frame's ANSI output for a single write.
//!
//! Every escape sequence the engine emits is produced here, so this file is
//! the whole terminal vocabulary:
//!
//! | Purpose | Sequence |
//! |---|---|
//! | Cursor position (1-indexed) | `ESC[{row};{col}H` |
//! | SGR reset | `ESC[0m` |
//! | Bold / Underline / Italic | `ESC[1m` / `ESC[4m` / `ESC[3m` |
//! | 24-bit foreground | `ESC[38;2;{r};{g};{b}m` |
//! | 24-bit background | `ESC[48;2;{r};{g};{b}m` |
//! | Default foreground/background | `ESC[39m` / `ESC[49m` |
//! | Cursor show / hide | `ESC[?25h` / `ESC[?25l` |

use crate::buffer::{Attributes, Color};
use std::fmt::Write as _;
use unicode_width::UnicodeWidthChar;

/// Emitted in place of characters that would not occupy exactly one column.
pub const REPLACEMENT_CHAR: char = '\u{FFFD}';

/// Pre-allocated buffer for building ANSI escape sequences.
///
/// All output is accumulated here, then flushed with a single `write_all`
/// to prevent terminal flickering.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    data: String,
}

impl OutputBuffer {
    /// Create a new output buffer with the given capacity in bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: String::with_capacity(capacity),
        }
    }

    /// Create a buffer sized for a typical terminal (4KB).
    pub fn new() -> Self {
        Self::with_capacity(4096)
    }

    /// Clear the buffer for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Get the buffer contents.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    /// Get the buffer contents as bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Consume the buffer, returning its contents.
    #[inline]
    pub fn into_string(self) -> String {
        self.data
    }

    /// Get the buffer length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Write a string verbatim.
    #[inline]
    pub fn write_str(&mut self, s: &str) {
        self.data.push_str(s);
    }

    /// Write the character stored in a cell.
    ///
    /// Anything that would not advance the cursor by exactly one column
    /// (control, zero-width or double-width characters) is replaced, so the
    /// caller's virtual cursor always matches the real one.
    #[inline]
    pub fn write_cell_char(&mut self, ch: char) {
        if ch.is_ascii_graphic() || ch == ' ' {
            self.data.push(ch);
        } else if ch.is_control() || ch.width() != Some(1) {
            self.data.push(REPLACEMENT_CHAR);
        } else {
            self.data.push(ch);
        }
    }

    /// Move cursor to (x, y), 0-indexed (emitted 1-indexed).
    #[inline]
    pub fn cursor_move(&mut self, x: u16, y: u16) {
        // CSI row ; col H
        let _ = write!(
            self.data,
            "\x1b[{};{}H",
            u32::from(y) + 1,
            u32::from(x) + 1
        );
    }

    /// Hide cursor.
    #[inline]
    pub fn cursor_hide(&mut self) {
        self.data.push_str("\x1b[?25l");
    }

    /// Show cursor.
    #[inline]
    pub fn cursor_show(&mut self) {
        self.data.push_str("\x1b[?25h");
    }

    /// Set foreground color: truecolor, or `ESC[39m` for the default.
    #[inline]
    pub fn set_fg(&mut self, color: Color) {
        match color.components() {
            Some((r, g, b)) => {
                let _ = write!(self.data, "\x1b[38;2;{r};{g};{b}m");
            }
            None => self.data.push_str("\x1b[39m"),
        }
    }

    /// Set background color: truecolor, or `ESC[49m` for the default.
    #[inline]
    pub fn set_bg(&mut self, color: Color) {
        match color.components() {
            Some((r, g, b)) => {
                let _ = write!(self.data, "\x1b[48;2;{r};{g};{b}m");
            }
            None => self.data.push_str("\x1b[49m"),
        }
    }

    /// Turn on each attribute in `attrs` (bold, underline, italic order).
    pub fn set_attributes(&mut self, attrs: Attributes) {
        if attrs.contains(Attributes::BOLD) {
            self.data.push_str("\x1b[1m");
        }
        if attrs.contains(Attributes::UNDERLINE) {
            self.data.push_str("\x1b[4m");
        }
        if attrs.contains(Attributes::ITALIC) {
            self.data.push_str("\x1b[3m");
        }
    }

    /// Reset all attributes.
    #[inline]
    pub fn reset_attrs(&mut self) {
        self.data.push_str("\x1b[0m");
    }

    /// Flush to a writer in a single write.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    pub fn flush_to<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(self.data.as_bytes())?;
        writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_move_is_one_indexed() {
        let mut out = OutputBuffer::new();
        out.cursor_move(0, 0);
        out.cursor_move(10, 5);
        assert_eq!(out.as_str(), "\x1b[1;1H\x1b[6;11H");
    }

    #[test]
    fn test_cursor_move_at_u16_max() {
        let mut out = OutputBuffer::new();
        out.cursor_move(u16::MAX, u16::MAX);
        assert_eq!(out.as_str(), "\x1b[65536;65536H");
    }

    #[test]
    fn test_colors() {
        let mut out = OutputBuffer::new();
        out.set_fg(Color::from_u32(0xFF0000));
        out.set_bg(Color::rgb(1, 2, 3));
        out.set_fg(Color::DEFAULT);
        out.set_bg(Color::DEFAULT);
        assert_eq!(
            out.as_str(),
            "\x1b[38;2;255;0;0m\x1b[48;2;1;2;3m\x1b[39m\x1b[49m"
        );
    }

    #[test]
    fn test_attributes_order() {
        let mut out = OutputBuffer::new();
        out.set_attributes(Attributes::ITALIC | Attributes::BOLD | Attributes::UNDERLINE);
        assert_eq!(out.as_str(), "\x1b[1m\x1b[4m\x1b[3m");
        out.clear();
        out.set_attributes(Attributes::empty());
        assert!(out.is_empty());
    }

    #[test]
    fn test_cell_char_replacement() {
        let mut out = OutputBuffer::new();
        out.write_cell_char('a');
        out.write_cell_char('é');
        out.write_cell_char('\x1b');
        out.write_cell_char('\n');
        out.write_cell_char('日');
        out.write_cell_char('\u{301}');
        assert_eq!(out.as_str(), "aé\u{FFFD}\u{FFFD}\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn test_flush_to_writer() {
        let mut out = OutputBuffer::new();
        out.reset_attrs();
        out.cursor_hide();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"\x1b[0m\x1b[?25l");
    }
}
