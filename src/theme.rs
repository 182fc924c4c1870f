//! Terminal palette for the previewer
//! Inline CSS colors found on the page are mapped onto terminal colors here

use ratatui::style::Color;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,      // Active borders, highlights
    pub danger: Color,      // Errors, invalid fields
    pub success: Color,     // Accepted actions
    pub warning: Color,     // Status messages, dialogs
    pub text: Color,        // Primary text (foreground)
    pub text_dim: Color,    // Dimmed text, faded elements
    pub bg_selected: Color, // Selection background
    pub inactive: Color,    // Borders, fully transparent elements
    pub header: Color,      // Section headers
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(250, 179, 135),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Map a CSS color value to a terminal color.
    ///
    /// Hex forms and the few named colors the enhancers write; anything else
    /// (gradients, rgba) is `None`.
    pub fn css_color(&self, value: &str) -> Option<Color> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        match value.to_ascii_lowercase().as_str() {
            "red" => Some(self.danger),
            "green" => Some(self.success),
            "orange" => Some(self.warning),
            "white" => Some(Color::White),
            "black" => Some(Color::Black),
            _ => None,
        }
    }
}

/// `rgb` or `rrggbb`
fn parse_hex(hex: &str) -> Option<Color> {
    let expand = |c: char| -> Option<u8> {
        let v = c.to_digit(16)? as u8;
        Some(v * 16 + v)
    };

    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            let r = expand(chars.next()?)?;
            let g = expand(chars.next()?)?;
            let b = expand(chars.next()?)?;
            Some(Color::Rgb(r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
            let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
            let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_color() {
        let theme = Theme::default();
        assert_eq!(theme.css_color("#ddd"), Some(Color::Rgb(221, 221, 221)));
        assert_eq!(theme.css_color("#667eea"), Some(Color::Rgb(102, 126, 234)));
        assert_eq!(theme.css_color("red"), Some(theme.danger));
        assert_eq!(theme.css_color("#12"), None);
        assert_eq!(theme.css_color("#zzzzzz"), None);
        assert_eq!(theme.css_color("linear-gradient(135deg, #667eea 0%, #764ba2 100%)"), None);
    }
}
