//! Color themes for rendered output.
//!
//! The terminal core emits class tokens (`fg_red`, `bg_bright`, `bold`, ...)
//! and leaves colors to CSS. A [`Theme`] maps those tokens to concrete
//! colors through [`Theme::stylesheet`].
//!
//! # Available Themes
//!
//! - `default` - Classic xterm colors
//! - `dracula` - Dark theme with vibrant colors
//! - `gruvbox` - Retro groove colors
//! - `nord` - Arctic, bluish color palette
//! - `solarized-dark` / `solarized-light` - Ethan Schoonover's Solarized
//!
//! A theme can also be loaded from a TOML file:
//!
//! ```toml
//! name = "mine"
//! foreground = "#D8DEE9"
//! background = "#2E3440"
//! black = "#3B4252"
//! # ... red, green, yellow, blue, magenta (or purple), cyan, white
//! brightBlack = "#4C566A"
//! # ... brightRed through brightWhite
//! ```

use std::fmt::{self, Write as _};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::term::style::COLOR_NAMES;
use crate::error::{Error, Result};

/// Color definition (RGB), serialized as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// From a packed `0xRRGGBB` value
    pub const fn from_hex(hex: u32) -> Self {
        Self::new((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
        Ok(Self::from_hex(value))
    }
}

impl TryFrom<String> for Rgb {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

/// Named palette: foreground, background and the 16 ANSI colors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    pub foreground: Rgb,
    pub background: Rgb,

    pub black: Rgb,
    pub red: Rgb,
    pub green: Rgb,
    pub yellow: Rgb,
    pub blue: Rgb,
    #[serde(alias = "purple")]
    pub magenta: Rgb,
    pub cyan: Rgb,
    pub white: Rgb,

    pub bright_black: Rgb,
    pub bright_red: Rgb,
    pub bright_green: Rgb,
    pub bright_yellow: Rgb,
    pub bright_blue: Rgb,
    #[serde(alias = "brightPurple")]
    pub bright_magenta: Rgb,
    pub bright_cyan: Rgb,
    pub bright_white: Rgb,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    fn build(name: &str, foreground: u32, background: u32, normal: [u32; 8], bright: [u32; 8]) -> Self {
        let [black, red, green, yellow, blue, magenta, cyan, white] = normal.map(Rgb::from_hex);
        let [bright_black, bright_red, bright_green, bright_yellow, bright_blue, bright_magenta, bright_cyan, bright_white] =
            bright.map(Rgb::from_hex);
        Self {
            name: name.to_string(),
            foreground: Rgb::from_hex(foreground),
            background: Rgb::from_hex(background),
            black,
            red,
            green,
            yellow,
            blue,
            magenta,
            cyan,
            white,
            bright_black,
            bright_red,
            bright_green,
            bright_yellow,
            bright_blue,
            bright_magenta,
            bright_cyan,
            bright_white,
        }
    }

    /// Classic xterm colors
    pub fn default_theme() -> Self {
        Self::build(
            "default",
            0xE5E5E5,
            0x000000,
            [0x000000, 0xCD0000, 0x00CD00, 0xCDCD00, 0x0000EE, 0xCD00CD, 0x00CDCD, 0xE5E5E5],
            [0x7F7F7F, 0xFF0000, 0x00FF00, 0xFFFF00, 0x5C5CFF, 0xFF00FF, 0x00FFFF, 0xFFFFFF],
        )
    }

    /// Dracula scheme
    pub fn dracula() -> Self {
        Self::build(
            "dracula",
            0xF8F8F2,
            0x282A36,
            [0x21222C, 0xFF5555, 0x50FA7B, 0xF1FA8C, 0xBD93F9, 0xFF79C6, 0x8BE9FD, 0xF8F8F2],
            [0x6272A4, 0xFF6E6E, 0x69FF94, 0xFFFFA5, 0xD6ACFF, 0xFF92DF, 0xA4FFFF, 0xFFFFFF],
        )
    }

    /// Gruvbox Dark scheme
    pub fn gruvbox() -> Self {
        Self::build(
            "gruvbox",
            0xEBDBB2,
            0x282828,
            [0x282828, 0xCC241D, 0x98971A, 0xD79921, 0x458588, 0xB16286, 0x689D6A, 0xA89984],
            [0x928374, 0xFB4934, 0xB8BB26, 0xFABD2F, 0x83A598, 0xD3869B, 0x8EC07C, 0xEBDBB2],
        )
    }

    /// Nord scheme
    pub fn nord() -> Self {
        Self::build(
            "nord",
            0xD8DEE9,
            0x2E3440,
            [0x3B4252, 0xBF616A, 0xA3BE8C, 0xEBCB8B, 0x81A1C1, 0xB48EAD, 0x88C0D0, 0xE5E9F0],
            [0x4C566A, 0xBF616A, 0xA3BE8C, 0xEBCB8B, 0x81A1C1, 0xB48EAD, 0x8FBCBB, 0xECEFF4],
        )
    }

    const SOLARIZED: [u32; 8] = [0x073642, 0xDC322F, 0x859900, 0xB58900, 0x268BD2, 0xD33682, 0x2AA198, 0xEEE8D5];
    const SOLARIZED_BRIGHT: [u32; 8] = [0x002B36, 0xCB4B16, 0x586E75, 0x657B83, 0x839496, 0x6C71C4, 0x93A1A1, 0xFDF6E3];

    /// Solarized Dark scheme
    pub fn solarized_dark() -> Self {
        Self::build("solarized-dark", 0x839496, 0x002B36, Self::SOLARIZED, Self::SOLARIZED_BRIGHT)
    }

    /// Solarized Light scheme
    pub fn solarized_light() -> Self {
        Self::build("solarized-light", 0x657B83, 0xFDF6E3, Self::SOLARIZED, Self::SOLARIZED_BRIGHT)
    }

    /// Get a built-in theme by name
    pub fn by_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "default" => Ok(Self::default_theme()),
            "dracula" => Ok(Self::dracula()),
            "gruvbox" | "gruvbox-dark" | "gruvbox_dark" => Ok(Self::gruvbox()),
            "nord" => Ok(Self::nord()),
            "solarized-dark" | "solarized_dark" => Ok(Self::solarized_dark()),
            "solarized-light" | "solarized_light" => Ok(Self::solarized_light()),
            _ => Err(Error::UnknownTheme(name.to_string())),
        }
    }

    /// List available themes
    pub fn list() -> Vec<&'static str> {
        vec![
            "default",
            "dracula",
            "gruvbox",
            "nord",
            "solarized-dark",
            "solarized-light",
        ]
    }

    /// Load a theme from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The 8 base colors, in SGR index order
    pub fn palette(&self) -> [Rgb; 8] {
        [
            self.black,
            self.red,
            self.green,
            self.yellow,
            self.blue,
            self.magenta,
            self.cyan,
            self.white,
        ]
    }

    /// The 8 bright colors, in SGR index order
    pub fn bright_palette(&self) -> [Rgb; 8] {
        [
            self.bright_black,
            self.bright_red,
            self.bright_green,
            self.bright_yellow,
            self.bright_blue,
            self.bright_magenta,
            self.bright_cyan,
            self.bright_white,
        ]
    }

    /// CSS rules for every class token the renderer emits.
    ///
    /// Rules are scoped under `.terminal`, the class of the element that
    /// holds the rendered lines.
    pub fn stylesheet(&self) -> String {
        let mut css = String::new();
        let _ = writeln!(
            css,
            ".terminal {{ color: {}; background-color: {}; font-family: monospace; white-space: pre; }}",
            self.foreground, self.background
        );

        let colors = COLOR_NAMES.iter().zip(self.palette().into_iter().zip(self.bright_palette()));
        for (name, (normal, bright)) in colors {
            let _ = writeln!(css, ".terminal .fg_{} {{ color: {}; }}", name, normal);
            let _ = writeln!(css, ".terminal .bg_{} {{ background-color: {}; }}", name, normal);
            let _ = writeln!(css, ".terminal .fg_bright.fg_{} {{ color: {}; }}", name, bright);
            let _ = writeln!(css, ".terminal .bg_bright.bg_{} {{ background-color: {}; }}", name, bright);
        }

        css.push_str(
            ".terminal .bold { font-weight: bold; }\n\
             .terminal .dim { opacity: 0.6; }\n\
             .terminal .italic { font-style: italic; }\n\
             .terminal .underline { text-decoration: underline; }\n\
             .terminal .strike { text-decoration: line-through; }\n\
             .terminal .underline.strike { text-decoration: underline line-through; }\n\
             .terminal .invert { filter: invert(100%); }\n\
             .terminal .blink { animation: terminal-blink 1s steps(1) infinite; }\n\
             @keyframes terminal-blink { 50% { opacity: 0; } }\n",
        );
        let _ = writeln!(
            css,
            ".terminal .cursor {{ color: {}; background-color: {}; }}",
            self.background, self.foreground
        );
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_parse_and_display() {
        let color: Rgb = "#ff5555".parse().unwrap();
        assert_eq!(color, Rgb::new(0xFF, 0x55, 0x55));
        assert_eq!(color.to_string(), "#FF5555");
    }

    #[test]
    fn test_rgb_invalid() {
        for input in ["FF5555", "#FF555", "#GG0000", "#FF55550", ""] {
            assert!(
                matches!(input.parse::<Rgb>(), Err(Error::InvalidColor(_))),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("Dracula").unwrap().name, "dracula");
        assert_eq!(Theme::by_name("gruvbox-dark").unwrap().name, "gruvbox");
        assert!(matches!(
            Theme::by_name("monokai"),
            Err(Error::UnknownTheme(name)) if name == "monokai"
        ));
    }

    #[test]
    fn test_list_resolves() {
        for name in Theme::list() {
            assert_eq!(Theme::by_name(name).unwrap().name, name);
        }
    }

    #[test]
    fn test_palette_order() {
        let theme = Theme::default_theme();
        assert_eq!(theme.palette()[1], Rgb::from_hex(0xCD0000));
        assert_eq!(theme.bright_palette()[4], Rgb::from_hex(0x5C5CFF));
    }

    #[test]
    fn test_stylesheet_rules() {
        let css = Theme::nord().stylesheet();
        assert!(css.contains(".terminal .fg_red { color: #BF616A; }"));
        assert!(css.contains(".terminal .bg_bright.bg_cyan { background-color: #8FBCBB; }"));
        assert!(css.contains(".terminal .bold { font-weight: bold; }"));
        assert!(css.contains(".terminal .cursor { color: #2E3440; background-color: #D8DEE9; }"));
    }

    #[test]
    fn test_deserialize_with_purple_alias() {
        let toml = r##"
name = "custom"
foreground = "#FFFFFF"
background = "#000000"
black = "#000000"
red = "#110000"
green = "#001100"
yellow = "#111100"
blue = "#000011"
purple = "#110011"
cyan = "#001111"
white = "#111111"
brightBlack = "#222222"
brightRed = "#220000"
brightGreen = "#002200"
brightYellow = "#222200"
brightBlue = "#000022"
brightPurple = "#220022"
brightCyan = "#002222"
brightWhite = "#FFFFFF"
"##;
        let theme: Theme = toml::from_str(toml).unwrap();
        assert_eq!(theme.magenta, Rgb::from_hex(0x110011));
        assert_eq!(theme.bright_magenta, Rgb::from_hex(0x220022));
    }

    #[test]
    fn test_deserialize_bad_color() {
        let toml = "name = \"broken\"\nforeground = \"white\"\n";
        let err = toml::from_str::<Theme>(toml).unwrap_err();
        assert!(err.to_string().contains("white"));
    }
}
