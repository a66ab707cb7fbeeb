//! Scrollback buffer
//!
//! A [`Screen`] is an append-only list of rows. The trailing `height` rows
//! form the visible viewport, everything before them is scrollback.

use super::row::Row;
use super::state::Cursor;

/// Rows of one screen (primary or alternate)
#[derive(Clone, Debug, Default)]
pub struct Screen {
    rows: Vec<Row>,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of materialized rows, scrollback included
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Buffer index addressed by the cursor for a viewport of `height` rows.
    fn cursor_index(&self, cursor: &Cursor, height: usize) -> usize {
        let row = cursor.row.max(1);
        if self.rows.len() > height {
            self.rows.len() - height + row - 1
        } else {
            row - 1
        }
    }

    /// Row under the cursor, materializing missing rows on demand.
    pub fn current_row(&mut self, cursor: &Cursor, height: usize) -> &mut Row {
        let index = self.cursor_index(cursor, height);
        if index >= self.rows.len() {
            self.rows.resize_with(index + 1, Row::new);
        }
        &mut self.rows[index]
    }

    /// Line feed: move the cursor down, scrolling by appending at the bottom.
    pub fn move_to_next_line(&mut self, cursor: &mut Cursor, height: usize) {
        if cursor.row >= height {
            if self.rows.len() < height {
                self.rows.resize_with(height, Row::new);
            }
            self.rows.push(Row::new());
        } else {
            if self.rows.len() < height && self.rows.len() == cursor.row {
                self.rows.push(Row::new());
            }
            cursor.row += 1;
        }
        cursor.col = 1;
    }

    /// Drop the oldest rows so at most `limit` remain.
    pub fn truncate(&mut self, limit: usize) {
        if self.rows.len() > limit {
            let excess = self.rows.len() - limit;
            self.rows.drain(..excess);
        }
    }

    /// Erase in display.
    ///
    /// Mode `2` pushes a full viewport of blank rows, keeping what was shown
    /// as scrollback. Mode `3` discards every row and homes the cursor.
    pub fn clear(&mut self, mode: u16, cursor: &mut Cursor, height: usize) {
        match mode {
            2 => {
                let len = self.rows.len();
                self.rows.resize_with(len + height, Row::new);
            }
            3 => {
                self.rows.clear();
                *cursor = Cursor::default();
            }
            _ => {}
        }
    }

    /// Render every row, newline separated, marking the cursor when visible.
    pub fn render(&self, cursor: &Cursor, height: usize, cursor_visible: bool) -> String {
        let active = self.cursor_index(cursor, height);
        let count = self.rows.len().max(active + 1);
        let blank = Row::new();

        let mut out = String::new();
        for i in 0..count {
            let row = self.rows.get(i).unwrap_or(&blank);
            if i == active && cursor_visible {
                out.push_str(&row.html_with_cursor(cursor.col));
            } else {
                out.push_str(&row.html());
            }
            if i + 1 != count {
                out.push('\n');
            }
        }
        out
    }
}
