//! Help screen showing keybindings

use crate::tui::theme::{Theme, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

pub fn render(frame: &mut Frame, area: Rect) {
    let theme = get_theme();

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let left = vec![
        section_header("Navigation", &theme),
        keybind("j / Down", "Move down", &theme),
        keybind("k / Up", "Move up", &theme),
        keybind("g / G", "Top / bottom", &theme),
        keybind("Ctrl+d/u", "Page down / up", &theme),
        keybind("Tab / l", "Next screen", &theme),
        keybind("S-Tab / h", "Previous screen", &theme),
        keybind("1-6", "Go to screen", &theme),
        Line::default(),
        section_header("Playback", &theme),
        keybind("Enter", "Play selected track", &theme),
        keybind("Space", "Toggle pause", &theme),
        keybind("n / p", "Next / previous", &theme),
        keybind("m", "Cycle play mode", &theme),
        keybind("] / [", "Seek 10s", &theme),
        keybind("+ / -", "Volume", &theme),
        keybind("x", "Dismiss player error", &theme),
    ];
    frame.render_widget(Paragraph::new(left).wrap(Wrap { trim: false }), cols[0]);

    let right = vec![
        section_header("Lists", &theme),
        keybind("a", "Add to queue", &theme),
        keybind("P", "Replace queue with list", &theme),
        keybind("d", "Remove from queue", &theme),
        keybind("Esc", "Close playlist", &theme),
        Line::default(),
        section_header("Search", &theme),
        keybind("/ or i", "Edit query", &theme),
        keybind("Enter", "Run search", &theme),
        keybind("Ctrl+u", "Clear query", &theme),
        keybind("Down", "Focus results", &theme),
        Line::default(),
        section_header("General", &theme),
        keybind("F5", "Refresh screen", &theme),
        keybind("q / Esc", "Quit", &theme),
    ];
    frame.render_widget(Paragraph::new(right).wrap(Wrap { trim: false }), cols[1]);
}

fn section_header(title: &str, theme: &Theme) -> Line<'static> {
    Line::from(Span::styled(
        format!("━━ {title} ━━"),
        Style::default()
            .fg(theme.palette.accent)
            .add_modifier(Modifier::BOLD),
    ))
}

fn keybind(key: &str, desc: &str, theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(
            format!("{key:12}"),
            Style::default()
                .fg(theme.palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc.to_string(), theme.text()),
    ])
}
