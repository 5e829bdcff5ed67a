use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_primary: Color,
    pub bg_highlight: Color,
    pub fg_primary: Color,
    pub fg_secondary: Color,
    pub accent: Color,
    pub accent_alt: Color,
    pub border: Color,
    pub error: Color,
}

impl Palette {
    /// Dark background with a vinyl-label red accent.
    pub const GROOVE: Self = Self {
        bg_primary: Color::Rgb(16, 16, 18),
        bg_highlight: Color::Rgb(44, 44, 50),
        fg_primary: Color::Rgb(235, 235, 235),
        fg_secondary: Color::Rgb(130, 130, 140),
        accent: Color::Rgb(236, 65, 65),
        accent_alt: Color::Rgb(240, 180, 90),
        border: Color::Rgb(70, 70, 78),
        error: Color::Rgb(255, 110, 90),
    };
}
