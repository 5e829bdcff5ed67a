//! Track list widget - renders lists of tracks with virtual scrolling

use crate::app::state::{AppState, SearchFocus, TrackList};
use crate::tui::theme::{LoadingSpinner, Theme, get_theme};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use super::clock;

/// How to present one list.
pub struct ListView<'a> {
    pub empty: &'a str,
    /// Words to mark in each row.
    pub highlight: Option<&'a str>,
    pub has_more: bool,
    pub tick: u64,
}

pub fn render_search_box(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let is_focused = state.search_focus == SearchFocus::Input;
    let border = if is_focused {
        Style::default().fg(theme.palette.accent)
    } else {
        theme.border()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(border)
        .title(" Query ")
        .title_style(theme.title());

    let prompt = if state.search.results.loading {
        format!("{} {}", state.search.query, LoadingSpinner::frame(state.tick))
    } else {
        let cursor = if is_focused { "▏" } else { "" };
        format!("{}{}", state.search.query, cursor)
    };

    let mut spans = vec![Span::styled(prompt, theme.text())];
    if state.search.total > 0 {
        spans.push(Span::styled(
            format!("  ({} of {})", state.search.results.tracks.len(), state.search.total),
            theme.dim(),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

pub fn render(frame: &mut Frame, list: &mut TrackList, view: ListView<'_>, area: Rect) {
    let theme = get_theme();

    if list.loading && list.tracks.is_empty() {
        let loading = Paragraph::new(Line::from(format!("{} Loading...", LoadingSpinner::frame(view.tick))))
            .style(theme.dim());
        frame.render_widget(loading, area);
        return;
    }

    if list.tracks.is_empty() {
        frame.render_widget(Paragraph::new(Line::from(view.empty)).style(theme.dim()), area);
        return;
    }

    let visible_height = area.height as usize;
    list.cursor.update_scroll(visible_height);
    let scroll_offset = list.cursor.scroll_offset;
    let selected = list.cursor.selected;
    let highlight = view.highlight.map(str::to_lowercase);
    let dur_width = 6usize;
    let text_width = (area.width as usize).saturating_sub(dur_width + 3);

    let mut items: Vec<ListItem> = list
        .tracks
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, t)| {
            let style = if i == selected { theme.focus() } else { theme.text() };
            let display = super::truncate_str(&t.display(), text_width);
            let mut spans = match &highlight {
                Some(q) => highlight_text(display, q, style, &theme),
                None => vec![Span::styled(display, style)],
            };
            spans.push(Span::styled(
                format!(" {:>w$}", clock(t.duration as f64 / 1000.0), w = dur_width - 1),
                theme.dim(),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let at_end = scroll_offset + visible_height >= list.tracks.len();
    if at_end && list.loading {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("  {} Loading more...", LoadingSpinner::frame(view.tick)),
            theme.dim(),
        ))));
    } else if at_end && view.has_more {
        items.push(ListItem::new(Line::from(Span::styled("  ↓ Scroll for more", theme.dim()))));
    }

    let mut ratatui_state = ListState::default();
    ratatui_state.select(Some(selected.saturating_sub(scroll_offset)));

    let list_widget = List::new(items)
        .highlight_style(theme.highlight())
        .highlight_symbol("\u{f054} ");
    frame.render_stateful_widget(list_widget, area, &mut ratatui_state);

    if list.tracks.len() > visible_height {
        render_position(frame, &theme, selected, list.tracks.len(), area);
    }
}

/// `n/total` in the top-right corner.
pub(crate) fn render_position(frame: &mut Frame, theme: &Theme, selected: usize, total: usize, area: Rect) {
    let pos_text = format!("{}/{}", selected + 1, total);
    let pos_len = pos_text.len() as u16;
    let pos_x = area.x + area.width.saturating_sub(pos_len);
    if pos_x > area.x {
        frame.render_widget(
            Paragraph::new(pos_text).style(theme.dim()),
            Rect::new(pos_x, area.y, pos_len, 1),
        );
    }
}

/// Split `text` so every occurrence of a query word gets the alternate background.
fn highlight_text(text: String, query: &str, base: Style, theme: &Theme) -> Vec<Span<'static>> {
    let marked = base.bg(theme.palette.bg_highlight);
    let lower = text.to_lowercase();
    // Lowercasing can change byte lengths; fall back to plain text then.
    if lower.len() != text.len() {
        return vec![Span::styled(text, base)];
    }

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for word in query.split_whitespace() {
        let mut from = 0;
        while let Some(at) = lower[from..].find(word) {
            let start = from + at;
            ranges.push((start, start + word.len()));
            from = start + word.len();
        }
    }
    ranges.sort_unstable();

    let mut spans = Vec::new();
    let mut last = 0;
    for (start, end) in ranges {
        if start < last {
            continue;
        }
        if start > last {
            spans.push(Span::styled(text[last..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), marked));
        last = end;
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), base));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces(spans: &[Span<'_>]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn marks_each_query_word() {
        let theme = get_theme();
        let spans = highlight_text("Blue Moon - Artist".into(), "moon blue", Style::default(), &theme);
        assert_eq!(pieces(&spans), vec!["Blue", " ", "Moon", " - Artist"]);
    }

    #[test]
    fn no_match_keeps_whole_text() {
        let theme = get_theme();
        let spans = highlight_text("Sunny".into(), "rain", Style::default(), &theme);
        assert_eq!(pieces(&spans), vec!["Sunny"]);
    }
}
