//! Full-screen lyric scroller. The active line stays centred.

use crate::app::state::AppState;
use crate::tui::theme::{LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::truncate_str;

pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let Some(view) = &state.lyrics else {
        let p = Paragraph::new(Line::from(Span::styled("Nothing playing", theme.dim())))
            .alignment(Alignment::Center);
        frame.render_widget(p, area);
        return;
    };

    let width = area.width.saturating_sub(2) as usize;
    let mut rows: Vec<Line> = Vec::new();
    if view.loading {
        rows.push(Line::from(Span::styled(
            format!("{} Loading lyrics...", LoadingSpinner::frame(state.tick)),
            theme.dim(),
        )));
    } else if let Some(notice) = view.notice {
        rows.push(Line::from(Span::styled(notice.message(), theme.dim())));
    }
    let header = rows.len();

    // Translations take a row of their own, so count rows rather than lines when centring.
    let lines = view.sync.lines();
    let rows_per_line = if lines.iter().any(|l| l.translation.is_some()) { 2 } else { 1 };
    let visible_lines = (area.height as usize).saturating_sub(header) / rows_per_line;
    let start = view.sync.scroll_offset(visible_lines);
    let active = view.sync.active();

    for (i, line) in lines.iter().enumerate().skip(start).take(visible_lines) {
        let style = if i == active { theme.focus() } else { theme.dim() };
        rows.push(Line::from(Span::styled(truncate_str(&line.text, width), style)));
        if rows_per_line == 2 {
            let tr = line.translation.as_deref().unwrap_or("");
            rows.push(Line::from(Span::styled(truncate_str(tr, width), theme.dim())));
        }
    }

    frame.render_widget(Paragraph::new(rows).alignment(Alignment::Center), area);
}
