//! Root layout widget

use crate::app::state::{AppState, Screen, SearchFocus};
use crate::player::Player;
use crate::tui::theme::get_theme;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{help, library, lyrics, now_playing, queue, sidebar, track_list, truncate_str};

/// ┌──────────┬─────────────────────────────────────────┐
/// │  Menu    │           Main Content                  │
/// │          │   (Search/Queue/Lyrics/Daily/...)       │
/// ├──────────┴─────────┬───────────────────────────────┤
/// │      Player        │       Current lyric           │
/// └────────────────────┴───────────────────────────────┘
pub fn render(frame: &mut Frame, state: &mut AppState, player: &Player) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(frame.area());

    let top_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(40)])
        .split(rows[0]);

    let bottom_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    sidebar::render(frame, state, top_cols[0]);
    render_main_content(frame, state, player, top_cols[1]);
    now_playing::render(frame, state, player, bottom_cols[0]);
    render_lyric_strip(frame, state, bottom_cols[1]);
}

fn render_main_content(frame: &mut Frame, state: &mut AppState, player: &Player, area: Rect) {
    let theme = get_theme();
    let screen = state.screen;

    let title = match screen {
        Screen::Library => match &state.library.open {
            Some(open) => format!(" {} {} ", theme.icons.playlist, open.name),
            None => format!(" {} Library ", theme.icons.library),
        },
        _ => format!(" {} {} ", theme.icons.screen(screen), screen.title()),
    };

    let main = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(theme.border())
        .title(title)
        .title_style(theme.title());
    let inner = main.inner(area);
    frame.render_widget(main, area);

    match screen {
        Screen::Search => {
            let sub = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(3), Constraint::Min(3)])
                .split(inner);
            track_list::render_search_box(frame, state, sub[0]);
            let highlight = (state.search_focus == SearchFocus::Results)
                .then(|| state.search.last_query.clone())
                .flatten();
            let more = state.search.has_more();
            track_list::render(
                frame,
                &mut state.search.results,
                track_list::ListView {
                    empty: "Type a query and press Enter",
                    highlight: highlight.as_deref(),
                    has_more: more,
                    tick: state.tick,
                },
                sub[1],
            );
        }
        Screen::Queue => queue::render(frame, state, player, inner),
        Screen::Lyrics => lyrics::render(frame, state, inner),
        Screen::Daily => {
            let tick = state.tick;
            track_list::render(
                frame,
                &mut state.daily,
                track_list::ListView {
                    empty: "No recommendations (daily picks need a login)",
                    highlight: None,
                    has_more: false,
                    tick,
                },
                inner,
            );
        }
        Screen::Library => library::render(frame, state, inner),
        Screen::Help => help::render(frame, inner),
    }
}

/// The active lyric line with its neighbours, for the bottom bar.
fn render_lyric_strip(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(theme.border())
        .title(format!(" {} Lyrics ", theme.icons.lyrics))
        .title_style(theme.title());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width.saturating_sub(2) as usize;
    let Some(view) = &state.lyrics else {
        let p = Paragraph::new(Line::from(Span::styled("Nothing playing", theme.dim())))
            .alignment(Alignment::Center);
        frame.render_widget(p, inner);
        return;
    };

    let lines = view.sync.lines();
    let active = view.sync.active();
    let mut display: Vec<Line> = Vec::new();
    for i in active.saturating_sub(1)..(active + 2).min(lines.len()) {
        let style = if i == active { theme.focus() } else { theme.dim() };
        display.push(Line::from(Span::styled(truncate_str(&lines[i].text, width), style)));
        if i == active
            && let Some(tr) = &lines[i].translation
        {
            display.push(Line::from(Span::styled(truncate_str(tr, width), theme.dim())));
        }
    }

    let top_padding = (inner.height as usize).saturating_sub(display.len()) / 2;
    let mut centered = vec![Line::default(); top_padding];
    centered.extend(display);
    frame.render_widget(Paragraph::new(centered).alignment(Alignment::Center), inner);
}
