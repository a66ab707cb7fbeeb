//! Styled row buffer
//!
//! A [`Row`] keeps its characters plus a run-length list of styles. The run
//! list is always sorted, non-overlapping, covers every occupied column
//! exactly once and never holds two adjacent runs with the same style.
//! All columns are 1-based.

use super::style::Style;

const CURSOR_OPEN: &str = "<span class=\"cursor\">";

/// A style applied to the inclusive column range `start..=end`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttrRun {
    pub start: usize,
    pub end: usize,
    pub style: Style,
}

impl AttrRun {
    pub fn new(start: usize, end: usize, style: Style) -> Self {
        Self { start, end, style }
    }

    fn contains(&self, col: usize) -> bool {
        self.start <= col && col <= self.end
    }
}

/// A single line of styled text
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Row {
    text: Vec<char>,
    runs: Vec<AttrRun>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Plain text content of the row
    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn runs(&self) -> &[AttrRun] {
        &self.runs
    }

    /// Index of the run covering `col`.
    fn run_index(&self, col: usize) -> Option<usize> {
        let idx = self.runs.partition_point(|run| run.end < col);
        match self.runs.get(idx) {
            Some(run) if run.start <= col => Some(idx),
            _ => None,
        }
    }

    /// Append a run at the tail, extending the last run when it has the same style.
    fn push_run(&mut self, start: usize, end: usize, style: Style) {
        if let Some(last) = self.runs.last_mut() {
            if last.style == style && last.end + 1 == start {
                last.end = end;
                return;
            }
        }
        self.runs.push(AttrRun::new(start, end, style));
    }

    /// Pad with default-styled spaces so the row is `len` columns long.
    fn pad_to(&mut self, len: usize) {
        let current = self.text.len();
        if len > current {
            self.text.resize(len, ' ');
            self.push_run(current + 1, len, Style::default());
        }
    }

    /// Merge neighbouring runs that carry the same style.
    fn coalesce(&mut self) {
        self.runs.dedup_by(|next, prev| {
            if prev.style == next.style && prev.end + 1 == next.start {
                prev.end = next.end;
                true
            } else {
                false
            }
        });
    }

    /// Overwrite the character at `col`, padding with spaces if the row is shorter.
    pub fn write(&mut self, ch: char, col: usize, style: &Style) {
        if col == 0 {
            return;
        }

        if col > self.text.len() {
            self.pad_to(col - 1);
            self.text.push(ch);
            self.push_run(col, col, *style);
            return;
        }

        self.text[col - 1] = ch;
        self.restyle(col, style);
    }

    /// Give the existing cell at `col` a new style, splitting or merging runs.
    fn restyle(&mut self, col: usize, style: &Style) {
        let Some(i) = self.run_index(col) else {
            debug_assert!(false, "column {} not covered by any run", col);
            return;
        };

        let current = self.runs[i].clone();
        if current.style == *style {
            return;
        }

        let merge_left = i > 0 && self.runs[i - 1].style == *style;
        let merge_right = i + 1 < self.runs.len() && self.runs[i + 1].style == *style;

        if current.start == current.end {
            // single cell run
            if merge_left && merge_right {
                self.runs[i - 1].end = self.runs[i + 1].end;
                self.runs.drain(i..i + 2);
            } else if merge_left {
                self.runs[i - 1].end = col;
                self.runs.remove(i);
            } else if merge_right {
                self.runs[i + 1].start = col;
                self.runs.remove(i);
            } else {
                self.runs[i].style = *style;
            }
        } else if current.start == col {
            // left edge
            self.runs[i].start = col + 1;
            if merge_left {
                self.runs[i - 1].end = col;
            } else {
                self.runs.insert(i, AttrRun::new(col, col, *style));
            }
        } else if current.end == col {
            // right edge
            self.runs[i].end = col - 1;
            if merge_right {
                self.runs[i + 1].start = col;
            } else {
                self.runs.insert(i + 1, AttrRun::new(col, col, *style));
            }
        } else {
            // strictly inside: prefix, new cell, suffix
            self.runs[i].end = col - 1;
            self.runs.splice(
                i + 1..i + 1,
                [
                    AttrRun::new(col, col, *style),
                    AttrRun::new(col + 1, current.end, current.style),
                ],
            );
        }
    }

    /// Insert `ch` at `col`, shifting the rest of the row right.
    ///
    /// The run containing `col` grows by one; the inserted cell then takes
    /// `style` through the same rules as [`Row::write`].
    pub fn insert_text(&mut self, ch: char, col: usize, style: &Style) {
        if col == 0 {
            return;
        }
        if col > self.text.len() {
            self.write(ch, col, style);
            return;
        }

        let Some(i) = self.run_index(col) else {
            return;
        };
        self.text.insert(col - 1, ch);
        self.runs[i].end += 1;
        for run in &mut self.runs[i + 1..] {
            run.start += 1;
            run.end += 1;
        }
        self.restyle(col, style);
    }

    /// Overwrite a same-styled burst of characters starting at `col`.
    pub fn add_texts(&mut self, chars: &[char], col: usize, style: &Style) {
        if col == 0 || chars.is_empty() {
            return;
        }
        let end = col + chars.len() - 1;

        self.pad_to(col - 1);
        for (i, &ch) in chars.iter().enumerate() {
            match self.text.get_mut(col - 1 + i) {
                Some(cell) => *cell = ch,
                None => self.text.push(ch),
            }
        }

        let mut before = Vec::with_capacity(self.runs.len() + 2);
        let mut after = Vec::new();
        for run in self.runs.drain(..) {
            if run.end < col {
                before.push(run);
            } else if run.start > end {
                after.push(run);
            } else {
                if run.start < col {
                    before.push(AttrRun::new(run.start, col - 1, run.style));
                }
                if run.end > end {
                    after.push(AttrRun::new(end + 1, run.end, run.style));
                }
            }
        }
        before.push(AttrRun::new(col, end, *style));
        before.extend(after);
        self.runs = before;
        self.coalesce();
    }

    /// Delete `n` cells starting at `col`, shifting the rest of the row left.
    pub fn remove_n(&mut self, col: usize, n: usize) {
        if col == 0 || n == 0 || col > self.text.len() {
            return;
        }
        let end = (col + n - 1).min(self.text.len());
        let removed = end - col + 1;
        self.text.drain(col - 1..end);

        let mut runs = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if run.end < col {
                runs.push(run);
            } else if run.start > end {
                runs.push(AttrRun::new(run.start - removed, run.end - removed, run.style));
            } else {
                let start = run.start.min(col);
                let keep_left = col - start;
                let keep_right = run.end.saturating_sub(end);
                if keep_left + keep_right > 0 {
                    runs.push(AttrRun::new(start, start + keep_left + keep_right - 1, run.style));
                }
            }
        }
        self.runs = runs;
        self.coalesce();
    }

    /// Truncate the row so it ends just before `col`.
    pub fn clear_to_end(&mut self, col: usize) {
        let col = col.max(1);
        if col > self.text.len() {
            return;
        }
        self.text.truncate(col - 1);
        self.runs.retain(|run| run.start < col);
        if let Some(last) = self.runs.last_mut() {
            last.end = last.end.min(col - 1);
        }
    }

    /// Blank `n` cells from `col` with default-styled spaces, without shifting.
    pub fn erase_to_n(&mut self, col: usize, n: usize) {
        let blank = Style::default();
        for i in 0..n {
            self.write(' ', col + i, &blank);
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.runs.clear();
    }

    /// Render every run as a `<span>`; runs with an empty style are emitted bare.
    pub fn html(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        for run in &self.runs {
            open_span(&mut out, &run.style);
            push_escaped(&mut out, &self.text[run.start - 1..run.end]);
            close_span(&mut out, &run.style);
        }
        out
    }

    /// Like [`Row::html`], with the character at `col` wrapped in a cursor span.
    ///
    /// When `col` lies past the end of the text the row is padded with spaces
    /// and a one-space cursor span is appended.
    pub fn html_with_cursor(&self, col: usize) -> String {
        let mut out = String::with_capacity(self.text.len() + CURSOR_OPEN.len() + 8);
        let mut rendered = 0;

        for run in &self.runs {
            open_span(&mut out, &run.style);
            if run.contains(col) {
                push_escaped(&mut out, &self.text[run.start - 1..col - 1]);
                out.push_str(CURSOR_OPEN);
                push_escaped(&mut out, &self.text[col - 1..col]);
                out.push_str("</span>");
                push_escaped(&mut out, &self.text[col..run.end]);
            } else {
                push_escaped(&mut out, &self.text[run.start - 1..run.end]);
            }
            close_span(&mut out, &run.style);
            rendered = run.end;
        }

        if col > rendered {
            out.extend(std::iter::repeat(' ').take(col - rendered - 1));
            out.push_str(CURSOR_OPEN);
            out.push_str(" </span>");
        }
        out
    }
}

fn open_span(out: &mut String, style: &Style) {
    if !style.is_empty() {
        out.push_str("<span ");
        out.push_str(&style.attributes());
        out.push('>');
    }
}

fn close_span(out: &mut String, style: &Style) {
    if !style.is_empty() {
        out.push_str("</span>");
    }
}

fn push_escaped(out: &mut String, chars: &[char]) {
    for &ch in chars {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}
