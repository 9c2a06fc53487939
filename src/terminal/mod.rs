//! Terminal module: everything that talks to the real terminal.
//!
//! - [`OutputBuffer`]: the ANSI vocabulary, accumulated for one write
//! - [`TerminalSession`]: raw mode and screen setup, restored on drop

mod output;
mod session;

pub use output::{OutputBuffer, REPLACEMENT_CHAR};
pub use session::TerminalSession;
