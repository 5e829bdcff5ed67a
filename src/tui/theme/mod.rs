pub mod icons;
pub mod palette;

pub use icons::{Icons, LoadingSpinner};
pub use palette::Palette;

use ratatui::style::{Modifier, Style};
use ratatui::symbols::border;

#[derive(Debug, Clone)]
pub struct Theme {
    pub palette: Palette,
    pub icons: Icons,
}

impl Theme {
    pub fn border_set(&self) -> border::Set<'static> {
        border::ROUNDED
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.palette.border)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.palette.accent)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.palette.fg_secondary)
    }

    pub fn text(&self) -> Style {
        Style::default().fg(self.palette.fg_primary)
    }

    /// Selected or active row.
    pub fn focus(&self) -> Style {
        Style::default()
            .fg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.palette.bg_primary)
            .bg(self.palette.accent)
            .add_modifier(Modifier::BOLD)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            palette: Palette::GROOVE,
            icons: Icons::nerd(),
        }
    }
}

pub fn get_theme() -> Theme {
    Theme::default()
}
