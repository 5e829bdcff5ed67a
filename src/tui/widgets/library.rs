//! Library screen: the logged-in user's playlists, or the tracks of the one opened.

use crate::app::state::AppState;
use crate::tui::theme::{LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{List, ListItem, ListState, Paragraph},
};

use super::track_list::{self, ListView};
use super::truncate_str;

pub fn render(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let theme = get_theme();
    let tick = state.tick;

    if let Some(open) = &mut state.library.open {
        track_list::render(
            frame,
            &mut open.list,
            ListView {
                empty: "This playlist is empty",
                highlight: None,
                has_more: false,
                tick,
            },
            area,
        );
        return;
    }

    let library = &mut state.library;
    if library.loading {
        let loading = Paragraph::new(Line::from(format!("{} Loading playlists...", LoadingSpinner::frame(tick))))
            .style(theme.dim());
        frame.render_widget(loading, area);
        return;
    }

    if library.playlists.is_empty() {
        let msg = if state.profile.is_none() {
            "Not logged in. Run `tonearm login` to see your playlists."
        } else if library.loaded {
            "No playlists yet."
        } else {
            "Press F5 to load playlists"
        };
        frame.render_widget(Paragraph::new(Line::from(msg)).style(theme.dim()), area);
        return;
    }

    let visible_height = area.height as usize;
    library.cursor.update_scroll(visible_height);
    let scroll_offset = library.cursor.scroll_offset;
    let selected = library.cursor.selected;
    let width = (area.width as usize).saturating_sub(4);

    let items: Vec<ListItem> = library
        .playlists
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, p)| {
            let style = if i == selected { theme.focus() } else { theme.text() };
            let label = format!("{} {}  ({})", theme.icons.playlist, p.name, p.creator_name);
            ListItem::new(Line::from(Span::styled(truncate_str(&label, width), style)))
        })
        .collect();

    let mut list_state = ListState::default();
    list_state.select(Some(selected.saturating_sub(scroll_offset)));
    let list = List::new(items)
        .highlight_style(theme.highlight())
        .highlight_symbol("\u{f054} ");
    frame.render_stateful_widget(list, area, &mut list_state);

    if library.playlists.len() > visible_height {
        track_list::render_position(frame, &theme, selected, library.playlists.len(), area);
    }
}
