//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::piece::PieceColor;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece and UI colours, One Dark by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub red: Color,
    pub green: Color,
    pub blue: Color,
    pub yellow: Color,
    /// Board background.
    pub bg: Color,
    /// Borders and empty-cell dots.
    pub div_line: Color,
    /// Text (score, help).
    pub main_fg: Color,
    /// Titles and highlights.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("cannot read theme {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub const fn onedark_default() -> Self {
        Self {
            red: Color::Rgb(0xE0, 0x6C, 0x75),
            green: Color::Rgb(0x98, 0xC3, 0x79),
            blue: Color::Rgb(0x61, 0xAF, 0xEF),
            yellow: Color::Rgb(0xE5, 0xC0, 0x7B),
            bg: Color::Rgb(0x28, 0x2C, 0x34),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
        }
    }

    /// Loads a btop-style theme file, then applies `palette` on top.
    /// No path means the default theme; a missing or unreadable file is an error.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            None => Self::onedark_default(),
            Some(p) => {
                let s = std::fs::read_to_string(p).map_err(|source| ThemeError::Io {
                    path: p.display().to_string(),
                    source,
                })?;
                Self::from_map(&parse_theme_file(&s))
            }
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Swap piece colours for the high-contrast or colorblind variants.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.red = Color::Rgb(0xFF, 0x00, 0x00);
                self.green = Color::Rgb(0x00, 0xFF, 0x00);
                self.blue = Color::Rgb(0x00, 0x88, 0xFF);
                self.yellow = Color::Rgb(0xFF, 0xFF, 0x00);
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito: vermillion, bluish green, blue, yellow
                self.red = Color::Rgb(0xD5, 0x5E, 0x00);
                self.green = Color::Rgb(0x00, 0x9E, 0x73);
                self.blue = Color::Rgb(0x00, 0x72, 0xB2);
                self.yellow = Color::Rgb(0xF0, 0xE4, 0x42);
            }
        }
    }

    /// Our own keys first, then the btop keys that carry a matching hue.
    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |keys: &[&str]| keys.iter().find_map(|k| map.get(*k).and_then(|v| parse_hex(v).ok()));
        let d = Self::onedark_default();
        Self {
            red: get(&["piece_red", "cpu_end", "temp_end"]).unwrap_or(d.red),
            green: get(&["piece_green", "mem_box", "cpu_start"]).unwrap_or(d.green),
            blue: get(&["piece_blue", "cpu_box"]).unwrap_or(d.blue),
            yellow: get(&["piece_yellow", "cpu_mid"]).unwrap_or(d.yellow),
            bg: get(&["main_bg", "meter_bg"]).unwrap_or(d.bg),
            div_line: get(&["div_line"]).unwrap_or(d.div_line),
            main_fg: get(&["main_fg"]).unwrap_or(d.main_fg),
            title: get(&["title"]).unwrap_or(d.title),
        }
    }

    /// Colour for a piece; empty cells use the border colour.
    #[inline]
    pub fn piece_color(&self, color: PieceColor) -> Color {
        match color {
            PieceColor::None => self.div_line,
            PieceColor::Red => self.red,
            PieceColor::Green => self.green,
            PieceColor::Blue => self.blue,
            PieceColor::Yellow => self.yellow,
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some((key, rest)) = stripped.split_once(']') else {
            continue;
        };
        let Some((_, value)) = rest.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').trim_matches('\'');
        if !value.is_empty() {
            map.insert(key.trim().to_string(), value.to_string());
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let (r, g, b) = match s.len() {
        6 => (channel(&s[0..2])?, channel(&s[2..4])?, channel(&s[4..6])?),
        3 => (
            channel(&s[0..1])? * 17,
            channel(&s[1..2])? * 17,
            channel(&s[2..3])? * 17,
        ),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_6() {
        let c = parse_hex("#98C379").unwrap();
        assert!(matches!(c, Color::Rgb(0x98, 0xC3, 0x79)));
    }

    #[test]
    fn test_parse_hex_3() {
        let c = parse_hex("#FFF").unwrap();
        assert!(matches!(c, Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_parse_hex_rejects_garbage() {
        assert!(parse_hex("#12345").is_err());
        assert!(parse_hex("zzzzzz").is_err());
        assert!(parse_hex("#ééé").is_err());
    }

    #[test]
    fn test_parse_theme_line() {
        let map = parse_theme_file(r##"theme[meter_bg]="#31353F""##);
        assert_eq!(map.get("meter_bg"), Some(&"#31353F".to_string()));
    }

    #[test]
    fn test_own_keys_win_over_btop_keys() {
        let map = parse_theme_file(
            "# comment\ntheme[cpu_end]=\"#110000\"\ntheme[piece_red]='#FF0000'\ntheme[cpu_box]=\"#0000EE\"\n",
        );
        let theme = Theme::from_map(&map);
        assert_eq!(theme.red, Color::Rgb(0xFF, 0, 0));
        assert_eq!(theme.blue, Color::Rgb(0, 0, 0xEE));
        assert_eq!(theme.green, Theme::onedark_default().green);
    }

    #[test]
    fn test_palette_overrides_pieces_only() {
        let mut theme = Theme::default();
        theme.apply_palette(crate::Palette::HighContrast);
        assert_eq!(theme.piece_color(PieceColor::Red), Color::Rgb(0xFF, 0, 0));
        assert_eq!(theme.bg, Theme::onedark_default().bg);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = Theme::load(
            Some(Path::new("/nonexistent/colortris.theme")),
            crate::Palette::Normal,
        );
        assert!(matches!(err, Err(ThemeError::Io { .. })));
    }
}
