//! Queue screen widget - the player's playlist

use crate::app::state::AppState;
use crate::player::Player;
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::truncate_str;

pub fn render(frame: &mut Frame, state: &mut AppState, player: &Player, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
        .split(area)[1];

    let playlist = player.playlist();
    if playlist.is_empty() {
        let empty = Line::from(Span::styled(
            "Queue is empty. Press Enter or a on a track to add it.",
            theme.dim(),
        ));
        frame.render_widget(Paragraph::new(empty), padded);
        return;
    }

    let mode = player.mode();
    let header = Line::from(vec![
        Span::styled(format!("{} tracks", playlist.len()), theme.dim()),
        Span::raw("  "),
        Span::styled(format!("{} {}", icons.mode(mode), mode.label()), theme.title()),
    ]);

    // Header, blank line and the hint row.
    let visible_height = padded.height.saturating_sub(3) as usize;
    let max_width = padded.width.saturating_sub(7) as usize;
    state.queue_cursor.update_scroll(visible_height);
    let selected = state.queue_cursor.selected;
    let current = player.index();

    let mut lines: Vec<Line> = vec![header, Line::default()];
    for (i, track) in playlist
        .tracks()
        .iter()
        .enumerate()
        .skip(state.queue_cursor.scroll_offset)
        .take(visible_height)
    {
        let is_current = current == Some(i);
        let prefix = if is_current { format!("{} ", icons.play) } else { "  ".to_string() };

        let style = if i == selected {
            Style::default()
                .fg(theme.palette.fg_primary)
                .bg(theme.palette.bg_highlight)
                .add_modifier(Modifier::BOLD)
        } else if is_current {
            theme.focus()
        } else {
            theme.text()
        };
        let prefix_style = if is_current { theme.title() } else { theme.dim() };

        lines.push(Line::from(vec![
            Span::styled(prefix, prefix_style),
            Span::styled(format!("{:>3}. ", i + 1), theme.dim()),
            Span::styled(truncate_str(&track.display(), max_width), style),
        ]));
    }

    let remaining = (padded.height as usize).saturating_sub(lines.len());
    if remaining > 0 {
        lines.extend(std::iter::repeat_n(Line::default(), remaining - 1));
        lines.push(Line::from(Span::styled(
            "Enter: Play  d: Remove  m: Mode  n/p: Next/Prev",
            theme.dim(),
        )));
    }

    frame.render_widget(Paragraph::new(lines), padded);
}
