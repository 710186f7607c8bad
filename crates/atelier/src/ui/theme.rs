//! Colours used by the picker, resolved from the `[theme]` config table.

use ratatui::style::Color;

use crate::infra::config::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: Color,
    pub accent: Color,
    pub highlight: Color,
    pub text: Color,
    pub subtext: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: Color::Rgb(0x89, 0xb4, 0xfa),
            accent: Color::Rgb(0x1f, 0x6f, 0xeb),
            highlight: Color::Rgb(0x23, 0x86, 0x36),
            text: Color::Rgb(0xc9, 0xd1, 0xd9),
            subtext: Color::Rgb(0x8b, 0x94, 0x9e),
        }
    }
}

impl Palette {
    /// Configured colours, keeping the defaults for unset or unparsable entries.
    pub fn from_theme(theme: &Theme) -> Self {
        let defaults = Self::default();
        let pick = |value: &Option<String>, fallback: Color| {
            value.as_deref().and_then(parse_hex).unwrap_or(fallback)
        };
        Self {
            primary: pick(&theme.primary, defaults.primary),
            accent: pick(&theme.accent, defaults.accent),
            highlight: pick(&theme.highlight, defaults.highlight),
            text: pick(&theme.text, defaults.text),
            subtext: pick(&theme.subtext, defaults.subtext),
        }
    }
}

/// `#rrggbb` or `rrggbb`.
fn parse_hex(value: &str) -> Option<Color> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colours() {
        assert_eq!(parse_hex("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_hex("00ff00"), Some(Color::Rgb(0, 255, 0)));
        assert_eq!(parse_hex("#fff"), None);
        assert_eq!(parse_hex("#gggggg"), None);
    }

    #[test]
    fn invalid_entries_keep_defaults() {
        let theme = Theme {
            primary: Some("#010203".into()),
            accent: Some("blue".into()),
            ..Theme::default()
        };
        let palette = Palette::from_theme(&theme);
        assert_eq!(palette.primary, Color::Rgb(1, 2, 3));
        assert_eq!(palette.accent, Palette::default().accent);
    }
}
