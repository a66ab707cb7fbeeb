//! htmlterm - terminal emulation core that renders remote shell output as HTML
//!
//! Raw output from a remote shell is fed through a [`Session`] (or a
//! [`Terminal`] one character at a time). Escape sequences drive a small
//! virtual screen whose rows keep their text with run-length style
//! attributes; a snapshot renders as one line of `<span>` markup per row.
//!
//! ```
//! use htmlterm::Terminal;
//!
//! let mut term = Terminal::with_size(std::io::sink(), 24, 80);
//! for ch in "\x1b[1mhi\x1b[0m".chars() {
//!     term.process_character(ch);
//! }
//! assert_eq!(
//!     term.render(),
//!     "<span class=\"bold\">hi</span><span class=\"cursor\"> </span>"
//! );
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod theme;

pub use crate::config::Config;
pub use crate::core::session::{Session, SharedSession};
pub use crate::core::term::{Cursor, Row, Screen, Style, Terminal};
pub use crate::error::{Error, Result};
pub use crate::theme::Theme;
