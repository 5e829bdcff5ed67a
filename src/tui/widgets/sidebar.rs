use crate::app::state::{AppState, Screen};
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::truncate_str;

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(theme.border())
        .title(" Menu ")
        .title_style(theme.title());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let items: Vec<ListItem> = Screen::ALL
        .iter()
        .enumerate()
        .map(|(i, screen)| {
            let is_selected = *screen == state.screen;
            let (style, icon_style) = if is_selected {
                (theme.focus(), theme.title())
            } else {
                (theme.text(), theme.dim())
            };
            let prefix = if is_selected { icons.selected } else { " " };
            ListItem::new(Line::from(vec![
                Span::styled(prefix, icon_style),
                Span::raw(" "),
                Span::styled(icons.screen(*screen), icon_style),
                Span::raw(" "),
                Span::styled(format!("{} {}", i + 1, screen.title()), style),
            ]))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(state.screen.position()));
    frame.render_stateful_widget(List::new(items).highlight_symbol(""), parts[0], &mut list_state);

    let who = match &state.profile {
        Some(p) => format!("{} {}", icons.user, p.nickname),
        None => format!("{} guest", icons.user),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(truncate_str(&who, parts[1].width as usize), theme.dim()))),
        parts[1],
    );
}
