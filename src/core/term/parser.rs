//! Escape sequence parser
//!
//! Consumes one character at a time and recognizes CSI, OSC, G0 charset
//! designation and DECSC/DECRC sequences. Completed sequences are handed
//! to [`dispatch`], which applies them to the terminal.

use std::io::Write;

use super::state::Terminal;

const ESC: char = '\x1b';
const BEL: char = '\x07';

/// Bytes besides ASCII letters that terminate a CSI sequence
const CSI_FINAL: &str = "@[\\]^_`{|}~";

/// Longest sequence body kept before the sequence is dropped
const MAX_SEQUENCE_LEN: usize = 4096;

/// Response that needs to be sent back to the remote end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Cursor position report: ESC [ row ; col R
    CursorPosition(usize, usize),
}

impl Response {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::CursorPosition(row, col) => format!("\x1b[{};{}R", row, col).into_bytes(),
        }
    }
}

/// Kind of sequence being collected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceKind {
    Csi,
    Osc,
    Charset,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    AwaitingKind,
    Collecting(SequenceKind),
}

/// Parsed control sequence: ESC [ [?] args final
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Csi {
    pub private: bool,
    pub command: char,
    pub args: Vec<u16>,
}

impl Csi {
    /// Parse a collected body whose last character is the final byte.
    fn parse(body: &str) -> Option<Self> {
        let command = body.chars().last()?;
        let params = &body[..body.len() - command.len_utf8()];
        let (private, params) = match params.strip_prefix('?') {
            Some(rest) => (true, rest),
            None => (false, params),
        };
        let args = params
            .split(';')
            .filter_map(|field| field.parse::<u32>().ok())
            .map(|n| n.min(u16::MAX as u32) as u16)
            .collect();

        Some(Self {
            private,
            command,
            args,
        })
    }

    /// First argument, or `default` when absent
    fn arg(&self, default: u16) -> u16 {
        self.args.first().copied().unwrap_or(default)
    }

    /// First argument as a count: absent or zero means one
    fn count(&self) -> usize {
        self.arg(1).max(1) as usize
    }
}

/// A completed escape sequence
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sequence {
    Csi(Csi),
    Osc { command: u16, content: String },
    Charset(char),
    SaveCursor,
    RestoreCursor,
}

/// Outcome of offering one character to the parser
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Not part of a sequence; the terminal handles it as plain input
    Pass,
    /// Consumed as sequence content
    Consumed,
    /// Consumed and completed a sequence
    Complete(Sequence),
}

/// Escape sequence state machine
#[derive(Debug, Default)]
pub struct EscapeParser {
    state: ParserState,
    buffer: String,
}

impl EscapeParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    fn reset(&mut self) {
        self.state = ParserState::Idle;
        self.buffer.clear();
    }

    /// Feed a single character to the parser
    pub fn advance(&mut self, ch: char) -> Advance {
        match self.state {
            ParserState::Idle => {
                if ch == ESC {
                    self.state = ParserState::AwaitingKind;
                    Advance::Consumed
                } else {
                    Advance::Pass
                }
            }
            ParserState::AwaitingKind => self.kind(ch),
            ParserState::Collecting(kind) => self.collect(kind, ch),
        }
    }

    fn kind(&mut self, ch: char) -> Advance {
        match ch {
            '[' => self.state = ParserState::Collecting(SequenceKind::Csi),
            ']' => self.state = ParserState::Collecting(SequenceKind::Osc),
            '(' => self.state = ParserState::Collecting(SequenceKind::Charset),
            '7' => {
                // DECSC - Save cursor
                self.reset();
                return Advance::Complete(Sequence::SaveCursor);
            }
            '8' => {
                // DECRC - Restore cursor
                self.reset();
                return Advance::Complete(Sequence::RestoreCursor);
            }
            _ => {
                tracing::debug!("Unknown escape kind: {:?} ({})", ch, ch as u32);
                self.reset();
            }
        }
        Advance::Consumed
    }

    fn collect(&mut self, kind: SequenceKind, ch: char) -> Advance {
        if kind == SequenceKind::Charset {
            // ESC ( B / 0 / U / K
            if !matches!(ch, 'B' | '0' | 'U' | 'K') {
                tracing::debug!("Unknown G0 charset designator: {:?}", ch);
            }
            self.reset();
            return Advance::Complete(Sequence::Charset(ch));
        }

        self.buffer.push(ch);
        let finished = match kind {
            SequenceKind::Csi => ch.is_ascii_alphabetic() || CSI_FINAL.contains(ch),
            SequenceKind::Osc => ch == BEL || (ch == '\\' && self.buffer.ends_with("\x1b\\")),
            SequenceKind::Charset => true,
        };

        if !finished {
            if self.buffer.len() > MAX_SEQUENCE_LEN {
                tracing::debug!("Dropping oversized {:?} sequence", kind);
                self.reset();
            }
            return Advance::Consumed;
        }

        let body = std::mem::take(&mut self.buffer);
        self.reset();

        let sequence = match kind {
            SequenceKind::Csi => Csi::parse(&body).map(Sequence::Csi),
            SequenceKind::Osc => Some(parse_osc(&body)),
            SequenceKind::Charset => None,
        };
        match sequence {
            Some(sequence) => Advance::Complete(sequence),
            None => Advance::Consumed,
        }
    }
}

/// Split an OSC body into its numeric command and content.
fn parse_osc(body: &str) -> Sequence {
    let body = body
        .strip_suffix(BEL)
        .or_else(|| body.strip_suffix("\x1b\\"))
        .unwrap_or(body);
    let (command, content) = body.split_once(';').unwrap_or((body, ""));
    Sequence::Osc {
        // unparsable commands map to a value no handler recognizes
        command: command.parse().unwrap_or(u16::MAX),
        content: content.to_string(),
    }
}

/// Apply a completed sequence to the terminal.
pub fn dispatch<W: Write>(sequence: Sequence, term: &mut Terminal<W>) {
    match sequence {
        Sequence::Csi(csi) if csi.private => execute_private(&csi, term),
        Sequence::Csi(csi) => execute_csi(&csi, term),
        Sequence::Osc { command, content } => execute_osc(command, content, term),
        Sequence::Charset(_) => {
            // Designation is accepted but glyph mapping is not applied
        }
        Sequence::SaveCursor => term.save_cursor(),
        Sequence::RestoreCursor => term.restore_cursor(),
    }
}

fn execute_csi<W: Write>(csi: &Csi, term: &mut Terminal<W>) {
    match csi.command {
        // SGR - Select Graphic Rendition
        'm' => term.select_graphic_rendition(&csi.args),

        // Erase
        'J' => term.erase_in_display(csi.arg(0)),
        'K' => term.erase_in_line(csi.arg(0)),

        // CHA - Cursor Character Absolute
        'G' => term.set_column(csi.arg(1) as usize),
        // VPA - Line Position Absolute
        'd' => term.set_row(csi.arg(1) as usize),
        // CUP - Cursor Position
        'H' => match csi.args.as_slice() {
            [] => term.cursor_position(1, 1),
            [row] => term.cursor_position(*row as usize, 1),
            [row, col, ..] => term.cursor_position(*row as usize, *col as usize),
        },

        // Cursor movement
        'A' => term.cursor_up(csi.count()),
        'B' => term.cursor_down(csi.count()),
        'C' => term.cursor_forward(csi.count()),
        'D' => term.cursor_backward(csi.count()),

        // DCH - Delete Characters
        'P' => term.delete_chars(csi.count()),
        // ECH - Erase Characters
        'X' => term.erase_chars(csi.count()),
        // ICH - Insert Characters
        '@' => term.insert_chars(csi.count()),

        // DSR - Device Status Report
        'n' => {
            if csi.args == [6] {
                term.report_cursor_position();
            }
        }

        _ => {
            tracing::debug!("Unknown CSI: args={:?}, final={:?}", csi.args, csi.command);
        }
    }
}

fn execute_private<W: Write>(csi: &Csi, term: &mut Terminal<W>) {
    let enable = match csi.command {
        'h' => true,
        'l' => false,
        _ => {
            tracing::debug!("Unknown private CSI: args={:?}, final={:?}", csi.args, csi.command);
            return;
        }
    };
    match csi.args.as_slice() {
        [mode] => term.set_private_mode(*mode, enable),
        _ => tracing::debug!("Ignoring multi-mode private CSI: {:?}", csi.args),
    }
}

fn execute_osc<W: Write>(command: u16, content: String, term: &mut Terminal<W>) {
    match command {
        0 | 2 => term.set_title(content),
        _ => tracing::debug!("Unknown OSC {}: {:?}", command, content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(parser: &mut EscapeParser, input: &str) -> Vec<Advance> {
        input.chars().map(|ch| parser.advance(ch)).collect()
    }

    fn last_sequence(input: &str) -> Option<Sequence> {
        let mut parser = EscapeParser::new();
        match feed(&mut parser, input).pop() {
            Some(Advance::Complete(sequence)) => Some(sequence),
            _ => None,
        }
    }

    #[test]
    fn test_plain_characters_pass() {
        let mut parser = EscapeParser::new();
        assert_eq!(parser.advance('a'), Advance::Pass);
        assert_eq!(parser.advance('\n'), Advance::Pass);
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_csi_states() {
        let mut parser = EscapeParser::new();
        assert_eq!(parser.advance('\x1b'), Advance::Consumed);
        assert_eq!(parser.state(), ParserState::AwaitingKind);
        assert_eq!(parser.advance('['), Advance::Consumed);
        assert_eq!(parser.state(), ParserState::Collecting(SequenceKind::Csi));
        assert_eq!(parser.advance('3'), Advance::Consumed);
        assert_eq!(
            parser.advance('m'),
            Advance::Complete(Sequence::Csi(Csi {
                private: false,
                command: 'm',
                args: vec![3],
            }))
        );
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_csi_private_and_args() {
        assert_eq!(
            last_sequence("\x1b[?1049h"),
            Some(Sequence::Csi(Csi {
                private: true,
                command: 'h',
                args: vec![1049],
            }))
        );
        assert_eq!(
            last_sequence("\x1b[12;40H"),
            Some(Sequence::Csi(Csi {
                private: false,
                command: 'H',
                args: vec![12, 40],
            }))
        );
    }

    #[test]
    fn test_csi_skips_unparsable_fields() {
        assert_eq!(
            last_sequence("\x1b[1;x;;4m"),
            Some(Sequence::Csi(Csi {
                private: false,
                command: 'm',
                args: vec![1, 4],
            }))
        );
        assert_eq!(
            last_sequence("\x1b[m"),
            Some(Sequence::Csi(Csi {
                private: false,
                command: 'm',
                args: vec![],
            }))
        );
    }

    #[test]
    fn test_csi_large_values_saturate() {
        match last_sequence("\x1b[99999999C") {
            Some(Sequence::Csi(csi)) => assert_eq!(csi.args, vec![u16::MAX]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_csi_symbol_final_byte() {
        match last_sequence("\x1b[4@") {
            Some(Sequence::Csi(csi)) => {
                assert_eq!(csi.command, '@');
                assert_eq!(csi.args, vec![4]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_osc_title() {
        assert_eq!(
            last_sequence("\x1b]0;My Title\x07"),
            Some(Sequence::Osc {
                command: 0,
                content: "My Title".to_string(),
            })
        );
        assert_eq!(
            last_sequence("\x1b]2;a;b\x1b\\"),
            Some(Sequence::Osc {
                command: 2,
                content: "a;b".to_string(),
            })
        );
        assert_eq!(
            last_sequence("\x1b]7\x07"),
            Some(Sequence::Osc {
                command: 7,
                content: String::new(),
            })
        );
    }

    #[test]
    fn test_save_restore_are_immediate() {
        let mut parser = EscapeParser::new();
        let results = feed(&mut parser, "\x1b7\x1b8x");
        assert_eq!(
            results,
            vec![
                Advance::Consumed,
                Advance::Complete(Sequence::SaveCursor),
                Advance::Consumed,
                Advance::Complete(Sequence::RestoreCursor),
                Advance::Pass,
            ]
        );
    }

    #[test]
    fn test_charset_designation() {
        assert_eq!(last_sequence("\x1b(B"), Some(Sequence::Charset('B')));
        assert_eq!(last_sequence("\x1b(0"), Some(Sequence::Charset('0')));

        let mut parser = EscapeParser::new();
        feed(&mut parser, "\x1b(z");
        assert_eq!(parser.state(), ParserState::Idle);
    }

    #[test]
    fn test_unknown_kind_dropped() {
        let mut parser = EscapeParser::new();
        assert_eq!(feed(&mut parser, "\x1bZ"), vec![Advance::Consumed; 2]);
        assert_eq!(parser.state(), ParserState::Idle);
        assert_eq!(parser.advance('Z'), Advance::Pass);
    }

    #[test]
    fn test_oversized_sequence_dropped() {
        let mut parser = EscapeParser::new();
        parser.advance('\x1b');
        parser.advance(']');
        for _ in 0..=MAX_SEQUENCE_LEN {
            parser.advance('x');
        }
        assert_eq!(parser.state(), ParserState::Idle);
        assert_eq!(parser.advance('y'), Advance::Pass);
    }

    #[test]
    fn test_response_bytes() {
        assert_eq!(
            Response::CursorPosition(3, 14).to_bytes(),
            b"\x1b[3;14R".to_vec()
        );
    }
}
