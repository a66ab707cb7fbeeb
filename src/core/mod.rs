//! Core terminal emulation components.
//!
//! - **term**: escape sequence parser, styled row buffer and terminal state
//! - **session**: byte-stream front over one terminal
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── Utf8Decoder (bytes -> chars across chunk boundaries)
//! └── Terminal
//!     ├── EscapeParser (CSI / OSC / charset / save-restore)
//!     ├── Screen x2 (primary, alternate)
//!     │   └── Row (text + style runs)
//!     └── Cursor + Style
//! ```

pub mod session;
pub mod term;
