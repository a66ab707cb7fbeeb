//! SGR style engine
//!
//! Decodes Select Graphic Rendition parameters into an immutable [`Style`]
//! value and renders it as HTML class/style attributes.
//!
//! | color    | fg | bg  | bright fg | bright bg |
//! |----------|----|-----|-----------|-----------|
//! | black    | 30 | 40  | 90        | 100       |
//! | red      | 31 | 41  | 91        | 101       |
//! | green    | 32 | 42  | 92        | 102       |
//! | yellow   | 33 | 43  | 93        | 103       |
//! | blue     | 34 | 44  | 94        | 104       |
//! | magenta  | 35 | 45  | 95        | 105       |
//! | cyan     | 36 | 46  | 96        | 106       |
//! | white    | 37 | 47  | 97        | 107       |

use std::fmt::Write;

use bitflags::bitflags;

/// Class suffixes for the eight base colors, in SGR index order.
pub const COLOR_NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

/// Channel levels of the 6x6x6 color cube (indices 16-231).
const CUBE_LEVELS: [u8; 6] = [0, 51, 102, 153, 204, 255];

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0000_0001;
        const DIM       = 0b0000_0010;
        const ITALIC    = 0b0000_0100;
        const UNDERLINE = 0b0000_1000;
        const BLINK     = 0b0001_0000;
        const INVERT    = 0b0010_0000;
        const STRIKE    = 0b0100_0000;
    }
}

/// Class tokens for each boolean attribute, in rendering order.
const FLAG_CLASSES: [(AttrFlags, &str); 7] = [
    (AttrFlags::BOLD, "bold"),
    (AttrFlags::DIM, "dim"),
    (AttrFlags::ITALIC, "italic"),
    (AttrFlags::UNDERLINE, "underline"),
    (AttrFlags::BLINK, "blink"),
    (AttrFlags::INVERT, "invert"),
    (AttrFlags::STRIKE, "strike"),
];

/// Color of one channel (foreground or background)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Color {
    #[default]
    None,
    /// One of the eight base colors, optionally in its bright variant
    Indexed { index: u8, bright: bool },
    Rgb(u8, u8, u8),
}

impl Color {
    /// Resolve an 8-bit (256 color) palette index.
    ///
    /// Returns `None` for values outside `0..=255`.
    pub fn from_8bit(n: u16) -> Option<Self> {
        let color = match n {
            0..=7 => Color::Indexed {
                index: n as u8,
                bright: false,
            },
            8..=15 => Color::Indexed {
                index: (n - 8) as u8,
                bright: true,
            },
            16..=231 => {
                let n = (n - 16) as usize;
                Color::Rgb(
                    CUBE_LEVELS[n / 36],
                    CUBE_LEVELS[(n % 36) / 6],
                    CUBE_LEVELS[n % 6],
                )
            }
            232..=255 => {
                let value = ((n - 232) * 10 + 8) as u8;
                Color::Rgb(value, value, value)
            }
            _ => return None,
        };
        Some(color)
    }

    fn name(&self) -> Option<&'static str> {
        match self {
            Color::Indexed { index, .. } => COLOR_NAMES.get(*index as usize).copied(),
            _ => None,
        }
    }

    fn is_bright(&self) -> bool {
        matches!(self, Color::Indexed { bright: true, .. })
    }
}

/// Text style: boolean attributes plus foreground and background color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    pub flags: AttrFlags,
    pub fg: Color,
    pub bg: Color,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no attribute is set and both colors are unset.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.fg == Color::None && self.bg == Color::None
    }

    /// Apply a single SGR parameter. Unknown codes leave the style unchanged.
    pub fn add(mut self, code: u16) -> Self {
        match code {
            0 => return Style::default(),
            1 => self.flags |= AttrFlags::BOLD,
            2 => self.flags |= AttrFlags::DIM,
            3 => self.flags |= AttrFlags::ITALIC,
            4 => self.flags |= AttrFlags::UNDERLINE,
            5 | 6 => self.flags |= AttrFlags::BLINK,
            7 => self.flags |= AttrFlags::INVERT,
            9 => self.flags |= AttrFlags::STRIKE,

            22 => self.flags &= !(AttrFlags::BOLD | AttrFlags::DIM),
            23 => self.flags &= !AttrFlags::ITALIC,
            24 => self.flags &= !AttrFlags::UNDERLINE,
            25 => self.flags &= !AttrFlags::BLINK,
            27 => self.flags &= !AttrFlags::INVERT,

            30..=37 => {
                self.fg = Color::Indexed {
                    index: (code - 30) as u8,
                    bright: false,
                }
            }
            39 => self.fg = Color::None,
            40..=47 => {
                self.bg = Color::Indexed {
                    index: (code - 40) as u8,
                    bright: false,
                }
            }
            49 => self.bg = Color::None,
            90..=97 => {
                self.fg = Color::Indexed {
                    index: (code - 90) as u8,
                    bright: true,
                }
            }
            100..=107 => {
                self.bg = Color::Indexed {
                    index: (code - 100) as u8,
                    bright: true,
                }
            }
            _ => {}
        }
        self
    }

    /// Apply an 8-bit palette color to the foreground or background.
    pub fn add_8bit_color(mut self, n: u16, background: bool) -> Self {
        if let Some(color) = Color::from_8bit(n) {
            if background {
                self.bg = color;
            } else {
                self.fg = color;
            }
        }
        self
    }

    /// Fold a full SGR parameter list, including `38`/`48` extended colors.
    ///
    /// `38;5;n` / `48;5;n` select a palette color and `38;2;r;g;b` /
    /// `48;2;r;g;b` a true color. A truncated or malformed extended color
    /// stops the fold; everything applied before it is kept.
    pub fn add_styles(self, codes: &[u16]) -> Self {
        let mut style = self;
        let mut iter = codes.iter().copied();

        while let Some(code) = iter.next() {
            if code != 38 && code != 48 {
                style = style.add(code);
                continue;
            }

            let background = code == 48;
            match iter.next() {
                Some(5) => match iter.next() {
                    Some(n) => style = style.add_8bit_color(n, background),
                    None => break,
                },
                Some(2) => match (iter.next(), iter.next(), iter.next()) {
                    (Some(r), Some(g), Some(b)) => {
                        let color = Color::Rgb(channel(r), channel(g), channel(b));
                        if background {
                            style.bg = color;
                        } else {
                            style.fg = color;
                        }
                    }
                    _ => break,
                },
                _ => break,
            }
        }
        style
    }

    /// Space separated class list.
    ///
    /// Order: bold, dim, italic, underline, blink, invert, strike,
    /// fg_bright, fg_<name>, bg_bright, bg_<name>.
    pub fn classes(&self) -> String {
        let mut out = String::new();
        for (flag, class) in FLAG_CLASSES {
            if self.flags.contains(flag) {
                push_class(&mut out, class);
            }
        }
        for (prefix, color) in [("fg", &self.fg), ("bg", &self.bg)] {
            if let Some(name) = color.name() {
                if color.is_bright() {
                    push_class(&mut out, &format!("{}_bright", prefix));
                }
                push_class(&mut out, &format!("{}_{}", prefix, name));
            }
        }
        out
    }

    /// Attribute text for an opening `<span ...>` tag.
    ///
    /// Indexed colors render as classes, RGB colors as inline
    /// `color`/`background-color` declarations.
    pub fn attributes(&self) -> String {
        let mut html = String::new();

        let classes = self.classes();
        if !classes.is_empty() {
            let _ = write!(html, "class=\"{}\"", classes);
        }

        let fg = rgb(&self.fg);
        let bg = rgb(&self.bg);
        if fg.is_some() || bg.is_some() {
            if !html.is_empty() {
                html.push(' ');
            }
            html.push_str("style=\"");
            if let Some((r, g, b)) = fg {
                let _ = write!(html, "color: rgb({},{},{});", r, g, b);
            }
            if let Some((r, g, b)) = bg {
                let _ = write!(html, "background-color: rgb({},{},{});", r, g, b);
            }
            html.push('"');
        }

        html
    }
}

fn push_class(out: &mut String, class: &str) {
    if !out.is_empty() {
        out.push(' ');
    }
    out.push_str(class);
}

fn rgb(color: &Color) -> Option<(u8, u8, u8)> {
    match *color {
        Color::Rgb(r, g, b) => Some((r, g, b)),
        _ => None,
    }
}

fn channel(value: u16) -> u8 {
    value.min(u8::MAX as u16) as u8
}
