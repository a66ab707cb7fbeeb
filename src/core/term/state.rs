//! Terminal state management
//!
//! [`Terminal`] aggregates the cursor, current style, dimensions, both
//! screens and title state, and is the single ingest point for decoded
//! characters from the remote end.

use std::fmt;
use std::io::Write;

use super::parser::{self, Advance, EscapeParser, Response};
use super::row::Row;
use super::screen::Screen;
use super::style::Style;

pub const DEFAULT_ROWS: usize = 40;
pub const DEFAULT_COLUMNS: usize = 80;
pub const DEFAULT_SCROLLBACK: usize = 500;

const TAB_WIDTH: usize = 8;

/// Cursor position, 1-based, relative to the viewport
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { row: 1, col: 1 }
    }
}

/// DEC private modes that are tracked but do not affect rendering
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TerminalModes {
    pub application_cursor: bool,
    pub smooth_scroll: bool,
    pub cursor_blink: bool,
    pub focus_reporting: bool,
    pub bracketed_paste: bool,
}

/// Virtual terminal rendering its screen as HTML
///
/// Replies to the remote end (cursor position reports) are written to
/// `output`.
pub struct Terminal<W: Write> {
    output: W,
    title: String,
    static_title: String,
    title_update: bool,
    rows: usize,
    columns: usize,
    scrollback: usize,
    parser: EscapeParser,
    style: Style,
    cursor: Cursor,
    saved_cursor: Cursor,
    cursor_visible: bool,
    modes: TerminalModes,
    using_alternate: bool,
    primary_screen: Screen,
    alternate_screen: Screen,
}

impl<W: Write> Terminal<W> {
    pub fn new(output: W) -> Self {
        Self::with_size(output, DEFAULT_ROWS, DEFAULT_COLUMNS)
    }

    pub fn with_size(output: W, rows: usize, columns: usize) -> Self {
        Self {
            output,
            title: String::new(),
            static_title: String::new(),
            title_update: false,
            rows: rows.max(1),
            columns: columns.max(1),
            scrollback: DEFAULT_SCROLLBACK,
            parser: EscapeParser::new(),
            style: Style::new(),
            cursor: Cursor::default(),
            saved_cursor: Cursor::default(),
            cursor_visible: true,
            modes: TerminalModes::default(),
            using_alternate: false,
            primary_screen: Screen::new(),
            alternate_screen: Screen::new(),
        }
    }

    /// Initial dynamic title; does not raise the title-changed flag.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Cap on rows kept per screen, scrollback included.
    pub fn set_scrollback_limit(&mut self, limit: usize) {
        self.scrollback = limit.max(self.rows);
        self.primary_screen.truncate(self.scrollback);
        self.alternate_screen.truncate(self.scrollback);
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn is_alternate_screen(&self) -> bool {
        self.using_alternate
    }

    /// Style applied to newly written characters
    pub fn style(&self) -> Style {
        self.style
    }

    /// `(rows, columns)`
    pub fn size(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn modes(&self) -> &TerminalModes {
        &self.modes
    }

    pub fn screen(&self) -> &Screen {
        if self.using_alternate {
            &self.alternate_screen
        } else {
            &self.primary_screen
        }
    }

    fn screen_and_cursor(&mut self) -> (&mut Screen, &mut Cursor) {
        let screen = if self.using_alternate {
            &mut self.alternate_screen
        } else {
            &mut self.primary_screen
        };
        (screen, &mut self.cursor)
    }

    fn current_row(&mut self) -> &mut Row {
        let rows = self.rows;
        let (screen, cursor) = self.screen_and_cursor();
        screen.current_row(cursor, rows)
    }

    fn linefeed(&mut self) {
        let rows = self.rows;
        let (screen, cursor) = self.screen_and_cursor();
        screen.move_to_next_line(cursor, rows);
    }

    /// Feed one decoded character from the remote end.
    pub fn process_character(&mut self, ch: char) {
        match self.parser.advance(ch) {
            Advance::Pass => self.handle_plain(ch),
            Advance::Consumed => {}
            Advance::Complete(sequence) => parser::dispatch(sequence, self),
        }
        let limit = self.scrollback;
        self.screen_and_cursor().0.truncate(limit);
    }

    fn handle_plain(&mut self, ch: char) {
        match ch {
            '\r' => self.cursor.col = 1,
            '\x08' => self.cursor.col = self.cursor.col.saturating_sub(1).max(1),
            '\x07' => tracing::trace!("Bell"),
            '\n' => self.linefeed(),
            '\t' => self.horizontal_tab(),
            c if c.is_control() => {
                tracing::trace!("Ignoring control character {:?}", c);
            }
            _ => {
                if self.cursor.col > self.columns {
                    self.linefeed();
                }
                let col = self.cursor.col;
                let style = self.style;
                self.current_row().write(ch, col, &style);
                self.cursor.col += 1;
            }
        }
    }

    /// Move to the next tab stop (every 8 columns)
    fn horizontal_tab(&mut self) {
        let next = ((self.cursor.col - 1) / TAB_WIDTH + 1) * TAB_WIDTH + 1;
        // never backwards: a pending wrap sits one past the margin
        self.cursor.col = next.min(self.columns).max(self.cursor.col);
    }

    /// Change the viewport size. Returns whether anything changed.
    ///
    /// No reflow happens; when the buffer already fills the new height and
    /// the height grew, the cursor moves down by the difference so it keeps
    /// pointing at the same buffer row.
    pub fn resize(&mut self, rows: usize, columns: usize) -> bool {
        let rows = rows.max(1);
        let columns = columns.max(1);
        if rows == self.rows && columns == self.columns {
            return false;
        }

        self.cursor.row = self.cursor.row.min(rows);
        if self.screen().len() >= rows && rows > self.rows {
            self.cursor.row += rows - self.rows;
        }
        self.cursor.col = self.cursor.col.min(columns + 1);
        self.rows = rows;
        self.columns = columns;
        self.scrollback = self.scrollback.max(rows);
        true
    }

    /// Current title: the static override when set, otherwise the dynamic one.
    pub fn title(&self) -> &str {
        if self.static_title.is_empty() {
            &self.title
        } else {
            &self.static_title
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.title != title {
            self.title = title;
            if self.static_title.is_empty() {
                self.title_update = true;
            }
        }
    }

    pub fn set_static_title(&mut self, title: impl Into<String>) {
        self.static_title = title.into();
    }

    /// Whether the title changed since the last call; clears the flag.
    pub fn take_title_update(&mut self) -> bool {
        std::mem::take(&mut self.title_update)
    }

    /// Render the active screen as newline separated HTML lines.
    pub fn render(&self) -> String {
        self.screen()
            .render(&self.cursor, self.rows, self.cursor_visible)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.render().into_bytes()
    }

    // Actions invoked by the escape sequence dispatcher

    /// SGR - an empty parameter list resets the style
    pub(crate) fn select_graphic_rendition(&mut self, args: &[u16]) {
        self.style = if args.is_empty() {
            Style::new()
        } else {
            self.style.add_styles(args)
        };
    }

    /// Erase in display
    pub(crate) fn erase_in_display(&mut self, mode: u16) {
        match mode {
            0 => {
                let col = self.cursor.col;
                self.current_row().clear_to_end(col);
            }
            2 | 3 => {
                let rows = self.rows;
                let (screen, cursor) = self.screen_and_cursor();
                screen.clear(mode, cursor, rows);
            }
            _ => tracing::debug!("Unsupported erase in display mode {}", mode),
        }
    }

    /// Erase in line
    pub(crate) fn erase_in_line(&mut self, mode: u16) {
        match mode {
            0 => {
                let col = self.cursor.col;
                self.current_row().clear_to_end(col);
            }
            2 => self.current_row().clear(),
            _ => tracing::debug!("Unsupported erase in line mode {}", mode),
        }
    }

    pub(crate) fn set_column(&mut self, col: usize) {
        self.cursor.col = col.clamp(1, self.columns);
    }

    pub(crate) fn set_row(&mut self, row: usize) {
        self.cursor.row = row.clamp(1, self.rows);
    }

    /// Set cursor position (1-indexed parameters, 0 treated as 1)
    pub(crate) fn cursor_position(&mut self, row: usize, col: usize) {
        self.set_row(row);
        self.set_column(col);
    }

    pub(crate) fn cursor_up(&mut self, n: usize) {
        self.cursor.row = self.cursor.row.saturating_sub(n).max(1);
    }

    pub(crate) fn cursor_down(&mut self, n: usize) {
        self.cursor.row = self.cursor.row.saturating_add(n).min(self.rows);
    }

    pub(crate) fn cursor_forward(&mut self, n: usize) {
        self.cursor.col = self.cursor.col.saturating_add(n).min(self.columns);
    }

    pub(crate) fn cursor_backward(&mut self, n: usize) {
        self.cursor.col = self.cursor.col.saturating_sub(n).max(1);
    }

    /// Cells between the cursor and the right margin, cursor included
    fn cells_to_margin(&self) -> usize {
        self.columns.saturating_sub(self.cursor.col - 1)
    }

    /// DCH - delete characters, shifting the rest of the row left
    pub(crate) fn delete_chars(&mut self, n: usize) {
        let col = self.cursor.col;
        self.current_row().remove_n(col, n);
    }

    /// ECH - blank characters in the default style, no shift
    pub(crate) fn erase_chars(&mut self, n: usize) {
        let n = n.min(self.cells_to_margin());
        let col = self.cursor.col;
        self.current_row().erase_to_n(col, n);
    }

    /// ICH - insert blanks in the current style, shifting the row right
    pub(crate) fn insert_chars(&mut self, n: usize) {
        let n = n.min(self.cells_to_margin());
        let col = self.cursor.col;
        let style = self.style;
        let row = self.current_row();
        for _ in 0..n {
            row.insert_text(' ', col, &style);
        }
    }

    /// DSR 6 - report the cursor position to the remote end
    pub(crate) fn report_cursor_position(&mut self) {
        let response = Response::CursorPosition(self.cursor.row, self.cursor.col);
        let result = self
            .output
            .write_all(&response.to_bytes())
            .and_then(|_| self.output.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to write cursor position report: {}", e);
        }
    }

    /// Save cursor position
    pub(crate) fn save_cursor(&mut self) {
        self.saved_cursor = self.cursor;
    }

    /// Restore cursor position, clamped to the current viewport
    pub(crate) fn restore_cursor(&mut self) {
        self.cursor = Cursor {
            row: self.saved_cursor.row.clamp(1, self.rows),
            col: self.saved_cursor.col.clamp(1, self.columns + 1),
        };
    }

    /// Set private mode
    pub(crate) fn set_private_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.modes.application_cursor = enable,
            4 => self.modes.smooth_scroll = enable,
            12 => self.modes.cursor_blink = enable,
            25 => self.cursor_visible = enable,
            1004 => self.modes.focus_reporting = enable,
            1049 => {
                if enable && !self.using_alternate {
                    self.save_cursor();
                    self.alternate_screen = Screen::new();
                    self.using_alternate = true;
                } else if !enable && self.using_alternate {
                    self.using_alternate = false;
                    self.restore_cursor();
                }
            }
            2004 => self.modes.bracketed_paste = enable,
            _ => tracing::debug!("Ignoring private mode {} ({})", mode, enable),
        }
    }
}

impl<W: Write> fmt::Display for Terminal<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
