//! Menu configuration and colors.
//!
//! All visual configuration lives here - paddings, border, icon size,
//! font spec and the six color strings. Color strings are parsed once at
//! startup into a [`Palette`]; a malformed color is a construction error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("empty color")]
    EmptyColor,
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// A straight-alpha RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        if s.is_empty() {
            return Err(ConfigError::EmptyColor);
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(ConfigError::InvalidColor(s.to_string()));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).chain("ff".chars()).collect(),
            4 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => format!("{hex}ff"),
            8 => hex.to_string(),
            _ => return Err(ConfigError::InvalidColor(s.to_string())),
        };
        let byte = |i: usize| {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map_err(|_| ConfigError::InvalidColor(s.to_string()))
        };
        Ok(Self {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        })
    }
}

/// Foreground/background pair for one item state.
#[derive(Debug, Clone, Copy)]
pub struct ColorPair {
    pub foreground: Color,
    pub background: Color,
}

/// Parsed colors for every part of the menu.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub normal: ColorPair,
    pub selected: ColorPair,
    pub border: Color,
    pub separator: Color,
}

/// Menu configuration.
///
/// Sizes are in pixels. The color fields hold hex strings and are parsed
/// by [`Config::palette`] at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Font spec, `"file.ttf:size=12"`.
    pub font: String,

    pub background_color: String,
    pub foreground_color: String,
    pub sel_background_color: String,
    pub sel_foreground_color: String,
    pub separator_color: String,
    pub border_color: String,

    /// Minimum width of a menu, border excluded.
    pub min_item_width: i32,
    /// Menu border thickness.
    pub border_size: i32,
    /// Horizontal inset of the separator line.
    pub separator_length: i32,
    /// Icons are decoded and resized to this square.
    pub icon_size: i32,
    pub padding_x: i32,
    pub padding_y: i32,

    /// Where the root menu spawns when no position is known.
    pub spawn_x: i32,
    pub spawn_y: i32,

    /// Skip icon fields entirely when set.
    pub disable_icons: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: "NotoSansMono-Regular.ttf:size=12".to_string(),

            background_color: "#FFFFFF".to_string(),
            foreground_color: "#2E3436".to_string(),
            sel_background_color: "#3584E4".to_string(),
            sel_foreground_color: "#FFFFFF".to_string(),
            separator_color: "#CDC7C2".to_string(),
            border_color: "#E6E6E6".to_string(),

            min_item_width: 130,
            border_size: 1,
            separator_length: 3,
            icon_size: 24,
            padding_x: 4,
            padding_y: 4,

            spawn_x: 0,
            spawn_y: 0,

            disable_icons: false,
        }
    }
}

impl Config {
    /// Parse all color strings. Fatal before first display if any fails.
    pub fn palette(&self) -> Result<Palette, ConfigError> {
        Ok(Palette {
            normal: ColorPair {
                foreground: Color::parse(&self.foreground_color)?,
                background: Color::parse(&self.background_color)?,
            },
            selected: ColorPair {
                foreground: Color::parse(&self.sel_foreground_color)?,
                background: Color::parse(&self.sel_background_color)?,
            },
            border: Color::parse(&self.border_color)?,
            separator: Color::parse(&self.separator_color)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_hex() {
        let c = Color::parse("#3584E4").unwrap();
        assert_eq!(c, Color::rgba(0x35, 0x84, 0xE4, 0xFF));
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(Color::parse("#abc").unwrap(), Color::rgba(0xAA, 0xBB, 0xCC, 0xFF));
        assert_eq!(Color::parse("#abcd").unwrap(), Color::rgba(0xAA, 0xBB, 0xCC, 0xDD));
        assert_eq!(Color::parse("11223344").unwrap(), Color::rgba(0x11, 0x22, 0x33, 0x44));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(Color::parse("").is_err());
        assert!(Color::parse("#12345").is_err());
        assert!(Color::parse("#gggggg").is_err());
        assert!(Color::parse("#ééé").is_err());
    }

    #[test]
    fn test_default_palette_parses() {
        let palette = Config::default().palette().unwrap();
        assert_eq!(palette.normal.background, Color::rgba(0xFF, 0xFF, 0xFF, 0xFF));
        assert_eq!(palette.selected.background, Color::rgba(0x35, 0x84, 0xE4, 0xFF));
    }
}
