//! Terminal emulation: escape parsing, screen state and HTML rendering.

pub mod parser;
pub mod row;
pub mod screen;
pub mod state;
pub mod style;

pub use parser::{EscapeParser, Response};
pub use row::{AttrRun, Row};
pub use screen::Screen;
pub use state::{Cursor, Terminal, TerminalModes};
pub use style::{AttrFlags, Color, Style};
