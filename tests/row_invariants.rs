//! Property tests for the row attribute-run buffer.
//!
//! Every operation is mirrored on a per-cell model (one character and one
//! style per column); after each step the run list must be sorted, gapless,
//! maximally merged, and expand to exactly the model's styles.

use htmlterm::core::term::row::Row;
use htmlterm::Style;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Write(char, usize, Style),
    Insert(char, usize, Style),
    AddTexts(Vec<char>, usize, Style),
    Remove(usize, usize),
    ClearToEnd(usize),
    Erase(usize, usize),
    Clear,
}

fn style() -> impl Strategy<Value = Style> {
    prop::sample::select(vec![
        Style::new(),
        Style::new().add(1),
        Style::new().add(31),
        Style::new().add(1).add(31),
        Style::new().add_styles(&[38, 2, 10, 20, 30]),
    ])
}

fn col() -> impl Strategy<Value = usize> {
    1usize..14
}

fn text_char() -> impl Strategy<Value = char> {
    prop::sample::select(vec!['a', 'b', 'z', ' ', 'é', '<'])
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (text_char(), col(), style()).prop_map(|(c, n, s)| Op::Write(c, n, s)),
        2 => (text_char(), col(), style()).prop_map(|(c, n, s)| Op::Insert(c, n, s)),
        2 => (prop::collection::vec(text_char(), 1..5), col(), style())
            .prop_map(|(cs, n, s)| Op::AddTexts(cs, n, s)),
        2 => (col(), 1usize..6).prop_map(|(c, n)| Op::Remove(c, n)),
        1 => col().prop_map(Op::ClearToEnd),
        1 => (col(), 1usize..6).prop_map(|(c, n)| Op::Erase(c, n)),
        1 => Just(Op::Clear),
    ]
}

/// Per-cell reference model
#[derive(Default)]
struct Model {
    cells: Vec<(char, Style)>,
}

impl Model {
    fn pad_to(&mut self, len: usize) {
        while self.cells.len() < len {
            self.cells.push((' ', Style::new()));
        }
    }

    fn write(&mut self, ch: char, col: usize, style: Style) {
        self.pad_to(col - 1);
        if col > self.cells.len() {
            self.cells.push((ch, style));
        } else {
            self.cells[col - 1] = (ch, style);
        }
    }

    fn apply(&mut self, op: &Op) {
        match op {
            Op::Write(ch, col, style) => self.write(*ch, *col, *style),
            Op::Insert(ch, col, style) => {
                if *col > self.cells.len() {
                    self.write(*ch, *col, *style);
                } else {
                    self.cells.insert(col - 1, (*ch, *style));
                }
            }
            Op::AddTexts(chars, col, style) => {
                for (i, ch) in chars.iter().enumerate() {
                    self.write(*ch, col + i, *style);
                }
            }
            Op::Remove(col, n) => {
                if *col <= self.cells.len() {
                    let end = (col + n - 1).min(self.cells.len());
                    self.cells.drain(col - 1..end);
                }
            }
            Op::ClearToEnd(col) => self.cells.truncate(col - 1),
            Op::Erase(col, n) => {
                for i in 0..*n {
                    self.write(' ', col + i, Style::new());
                }
            }
            Op::Clear => self.cells.clear(),
        }
    }
}

fn apply(row: &mut Row, op: &Op) {
    match op {
        Op::Write(ch, col, style) => row.write(*ch, *col, style),
        Op::Insert(ch, col, style) => row.insert_text(*ch, *col, style),
        Op::AddTexts(chars, col, style) => row.add_texts(chars, *col, style),
        Op::Remove(col, n) => row.remove_n(*col, *n),
        Op::ClearToEnd(col) => row.clear_to_end(*col),
        Op::Erase(col, n) => row.erase_to_n(*col, *n),
        Op::Clear => row.clear(),
    }
}

fn check(row: &Row, model: &Model) -> Result<(), TestCaseError> {
    let text: String = model.cells.iter().map(|(c, _)| *c).collect();
    prop_assert_eq!(row.text(), text);
    prop_assert_eq!(row.len(), model.cells.len());

    let runs = row.runs();
    if model.cells.is_empty() {
        prop_assert!(runs.is_empty(), "runs left on empty row: {:?}", runs);
        return Ok(());
    }

    prop_assert_eq!(runs[0].start, 1);
    prop_assert_eq!(runs[runs.len() - 1].end, model.cells.len());
    for run in runs {
        prop_assert!(run.start <= run.end, "inverted run {:?}", run);
        for col in run.start..=run.end {
            prop_assert_eq!(run.style, model.cells[col - 1].1, "style at column {}", col);
        }
    }
    for pair in runs.windows(2) {
        prop_assert_eq!(pair[0].end + 1, pair[1].start, "gap or overlap in {:?}", runs);
        prop_assert_ne!(pair[0].style, pair[1].style, "unmerged neighbours in {:?}", runs);
    }
    Ok(())
}

proptest! {
    #[test]
    fn run_list_tracks_cell_model(ops in prop::collection::vec(op(), 1..40)) {
        let mut row = Row::new();
        let mut model = Model::default();
        for op in &ops {
            apply(&mut row, op);
            model.apply(op);
            check(&row, &model)?;
        }
    }

    #[test]
    fn rendering_is_stable(ops in prop::collection::vec(op(), 1..20), cursor in 1usize..20) {
        let mut row = Row::new();
        for op in &ops {
            apply(&mut row, op);
        }
        prop_assert_eq!(row.html(), row.clone().html());
        prop_assert_eq!(row.html_with_cursor(cursor), row.html_with_cursor(cursor));
        prop_assert!(row.html_with_cursor(cursor).contains("<span class=\"cursor\">"));
    }
}
