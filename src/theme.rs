//! Terminal color theme.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent for titles and controls
    pub primary: Color,
    pub error: Color,
    /// Stale data shown under an error
    pub warning: Color,
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Rgb(218, 165, 32), // Goldenrod
            error: Color::Rgb(220, 20, 60),    // Crimson
            warning: Color::Rgb(255, 165, 0),  // Orange
            text: Color::White,
            text_muted: Color::Gray,
            border: Color::Rgb(90, 90, 90),
        }
    }
}

impl Theme {
    pub fn primary_style(&self) -> Style {
        Style::default().fg(self.primary).add_modifier(Modifier::BOLD)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub fn warning_style(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.text_muted)
    }

    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }
}
