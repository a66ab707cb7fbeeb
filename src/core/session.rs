//! Session management
//!
//! A [`Session`] feeds raw bytes from the remote shell into a [`Terminal`]
//! and hands out rendered snapshots. [`SharedSession`] lets a reader render
//! from another thread while a single producer keeps feeding.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::Config;

use super::term::Terminal;

/// Incremental UTF-8 decoder that carries incomplete sequences over
/// chunk boundaries
#[derive(Debug, Default)]
struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    fn decode(&mut self, bytes: &[u8], mut emit: impl FnMut(char)) {
        let joined;
        let mut input = if self.pending.is_empty() {
            bytes
        } else {
            let mut buf = std::mem::take(&mut self.pending);
            buf.extend_from_slice(bytes);
            joined = buf;
            &joined[..]
        };

        loop {
            match std::str::from_utf8(input) {
                Ok(s) => {
                    s.chars().for_each(&mut emit);
                    return;
                }
                Err(e) => {
                    let (valid, rest) = input.split_at(e.valid_up_to());
                    if let Ok(s) = std::str::from_utf8(valid) {
                        s.chars().for_each(&mut emit);
                    }
                    match e.error_len() {
                        Some(len) => {
                            emit(char::REPLACEMENT_CHARACTER);
                            input = &rest[len..];
                        }
                        None => {
                            // Incomplete sequence at the end of the chunk
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Drain a dangling incomplete sequence at end of stream.
    fn flush(&mut self, mut emit: impl FnMut(char)) {
        if !self.pending.is_empty() {
            self.pending.clear();
            emit(char::REPLACEMENT_CHARACTER);
        }
    }
}

/// A shell session
pub struct Session<W: Write> {
    /// Session ID
    pub id: u64,
    terminal: Terminal<W>,
    decoder: Utf8Decoder,
}

impl<W: Write> Session<W> {
    /// Create a new session
    pub fn new(id: u64, terminal: Terminal<W>) -> Self {
        Self {
            id,
            terminal,
            decoder: Utf8Decoder::default(),
        }
    }

    /// Create a session with geometry, titles and scrollback from `config`
    pub fn from_config(id: u64, config: &Config, output: W) -> Self {
        let mut terminal =
            Terminal::with_size(output, config.rows, config.columns).with_title(config.title.clone());
        if let Some(title) = &config.static_title {
            terminal.set_static_title(title.clone());
        }
        terminal.set_scrollback_limit(config.scrollback);
        Self::new(id, terminal)
    }

    pub fn terminal(&self) -> &Terminal<W> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<W> {
        &mut self.terminal
    }

    /// Feed raw bytes into the terminal
    pub fn feed_bytes(&mut self, bytes: &[u8]) {
        let terminal = &mut self.terminal;
        self.decoder.decode(bytes, |ch| terminal.process_character(ch));
    }

    /// Feed already decoded text into the terminal
    pub fn feed_str(&mut self, text: &str) {
        for ch in text.chars() {
            self.terminal.process_character(ch);
        }
    }

    /// Signal end of input; a truncated trailing sequence renders as U+FFFD.
    pub fn finish(&mut self) {
        let terminal = &mut self.terminal;
        self.decoder.flush(|ch| terminal.process_character(ch));
    }

    /// Rendered HTML snapshot of the active screen
    pub fn render(&self) -> String {
        self.terminal.render()
    }

    pub fn title(&self) -> &str {
        self.terminal.title()
    }

    /// The new title, if it changed since the last poll
    pub fn take_title_update(&mut self) -> Option<String> {
        if self.terminal.take_title_update() {
            Some(self.terminal.title().to_string())
        } else {
            None
        }
    }

    /// Resize the terminal
    pub fn resize(&mut self, rows: usize, columns: usize) -> bool {
        let changed = self.terminal.resize(rows, columns);
        if changed {
            tracing::debug!("Session {} resized to {}x{}", self.id, rows, columns);
        }
        changed
    }
}

/// Session handle shared between one producer and any number of readers
pub struct SharedSession<W: Write> {
    inner: Arc<Mutex<Session<W>>>,
}

impl<W: Write> Clone for SharedSession<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<W: Write> SharedSession<W> {
    pub fn new(session: Session<W>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session<W>> {
        // Every mutation leaves the terminal consistent, so a poisoned
        // lock still guards valid state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed one chunk under a single lock
    pub fn feed_bytes(&self, bytes: &[u8]) {
        self.lock().feed_bytes(bytes);
    }

    pub fn render(&self) -> String {
        self.lock().render()
    }

    pub fn take_title_update(&self) -> Option<String> {
        self.lock().take_title_update()
    }

    pub fn resize(&self, rows: usize, columns: usize) -> bool {
        self.lock().resize(rows, columns)
    }

    /// Run `f` with exclusive access to the session
    pub fn with<R>(&self, f: impl FnOnce(&mut Session<W>) -> R) -> R {
        f(&mut self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::thread;

    fn session(rows: usize, columns: usize) -> Session<io::Sink> {
        let mut terminal = Terminal::with_size(io::sink(), rows, columns);
        terminal.set_private_mode(25, false);
        Session::new(1, terminal)
    }

    fn decode_all(chunks: &[&[u8]]) -> String {
        let mut decoder = Utf8Decoder::default();
        let mut out = String::new();
        for chunk in chunks {
            decoder.decode(chunk, |ch| out.push(ch));
        }
        decoder.flush(|ch| out.push(ch));
        out
    }

    #[test]
    fn test_decode_split_multibyte() {
        let bytes = "zażółć €".as_bytes();
        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(decode_all(&[a, b]), "zażółć €");
        }
    }

    #[test]
    fn test_decode_invalid_bytes() {
        assert_eq!(decode_all(&[b"a\xffb".as_slice()]), "a\u{fffd}b");
        assert_eq!(decode_all(&[b"\xc3(x".as_slice()]), "\u{fffd}(x");
    }

    #[test]
    fn test_decode_truncated_at_end() {
        assert_eq!(decode_all(&[b"ok\xe2\x82".as_slice()]), "ok\u{fffd}");
    }

    #[test]
    fn test_feed_bytes_across_chunks() {
        let mut session = session(3, 20);
        session.feed_bytes(b"\x1b[3");
        session.feed_bytes(b"1mr\xc3");
        session.feed_bytes(b"\xb3\x1b[0m");
        assert_eq!(session.render(), "<span class=\"fg_red\">ró</span>");
    }

    #[test]
    fn test_title_poll() {
        let mut session = session(3, 20);
        assert_eq!(session.take_title_update(), None);
        session.feed_str("\x1b]0;build\x07");
        assert_eq!(session.take_title_update(), Some("build".to_string()));
        assert_eq!(session.take_title_update(), None);
        assert_eq!(session.title(), "build");
    }

    #[test]
    fn test_from_config() {
        let config = Config {
            rows: 5,
            columns: 12,
            title: "shell".to_string(),
            static_title: Some("fixed".to_string()),
            ..Config::default()
        };
        let session = Session::from_config(7, &config, io::sink());
        assert_eq!(session.id, 7);
        assert_eq!(session.terminal().size(), (5, 12));
        assert_eq!(session.title(), "fixed");
    }

    #[test]
    fn test_resize() {
        let mut session = session(3, 20);
        assert!(!session.resize(3, 20));
        assert!(session.resize(4, 20));
        assert_eq!(session.terminal().size(), (4, 20));
    }

    #[test]
    fn test_shared_session_across_threads() {
        let shared = SharedSession::new(session(3, 20));
        let producer = shared.clone();
        let handle = thread::spawn(move || {
            for _ in 0..3 {
                producer.feed_bytes(b"ab");
            }
        });
        handle.join().expect("producer thread panicked");

        assert_eq!(shared.render(), "ababab");
        assert_eq!(shared.with(|s| s.terminal().cursor().col), 7);
    }
}
