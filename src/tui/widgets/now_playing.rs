//! Now Playing widget - compact player for the bottom bar

use crate::app::state::{AppState, ToastKind};
use crate::player::Player;
use crate::tui::theme::{Icons, LoadingSpinner, get_theme};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::{clock, truncate_str};

pub fn render(frame: &mut Frame, state: &AppState, player: &Player, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(theme.border())
        .title(format!(" {} Player ", icons.music))
        .title_style(theme.title());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let padded = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(1), Constraint::Min(1), Constraint::Length(1)])
        .split(inner)[1];

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(1), // Authors
            Constraint::Length(1), // Progress bar
            Constraint::Length(1), // Time + controls + mode + volume
            Constraint::Length(1), // Error or toast
            Constraint::Min(0),
        ])
        .split(padded);

    let width = padded.width as usize;
    let current = player.current();

    let title = match current {
        Some(t) if player.is_loading() => format!("{} {}", LoadingSpinner::frame(state.tick), t.name),
        Some(t) => t.name.clone(),
        None => "Not playing".to_string(),
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            truncate_str(&title, width),
            theme.text().add_modifier(Modifier::BOLD),
        ))),
        rows[0],
    );

    let authors = current.map(|t| t.authors.join(", ")).unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(truncate_str(&authors, width), theme.dim()))),
        rows[1],
    );

    let ratio = if player.current_url().is_some() && state.duration_secs > 0.0 {
        (state.position_secs / state.duration_secs).clamp(0.0, 1.0)
    } else {
        0.0
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            progress_bar(rows[2].width as usize, ratio, icons),
            Style::default().fg(theme.palette.accent),
        ))),
        rows[2],
    );

    let play_icon = if state.paused { icons.play } else { icons.pause };
    let vol_icon = match state.volume {
        0 => icons.volume_mute,
        1..=49 => icons.volume_low,
        _ => icons.volume_high,
    };
    let mode = player.mode();
    let controls = Line::from(vec![
        Span::styled(
            format!("{}/{}", clock(state.position_secs), clock(state.duration_secs)),
            theme.dim(),
        ),
        Span::raw(" "),
        Span::styled(icons.prev, theme.dim()),
        Span::raw(" "),
        Span::styled(play_icon, theme.title()),
        Span::raw(" "),
        Span::styled(icons.next, theme.dim()),
        Span::raw("  "),
        Span::styled(icons.mode(mode), Style::default().fg(theme.palette.accent_alt)),
        Span::raw(" "),
        Span::styled(mode.label(), theme.dim()),
        Span::raw("  "),
        Span::styled(vol_icon, theme.dim()),
        Span::raw(" "),
        Span::styled(format!("{}%", state.volume), theme.dim()),
    ]);
    frame.render_widget(Paragraph::new(controls), rows[3]);

    // The player's error outlives toasts; it stays until the next request or `x`.
    let status = match (player.last_error(), &state.toast) {
        (Some(err), _) => Some((icons.error, theme.palette.error, err.to_string())),
        (None, Some(toast)) if !toast.is_expired() => Some(match toast.kind {
            ToastKind::Success => (icons.success, theme.palette.accent_alt, toast.message.clone()),
            ToastKind::Error => (icons.error, theme.palette.error, toast.message.clone()),
        }),
        _ => None,
    };
    if let Some((icon, color, message)) = status {
        let line = Line::from(vec![
            Span::styled(format!("{icon} "), Style::default().fg(color)),
            Span::styled(truncate_str(&message, width.saturating_sub(3)), Style::default().fg(color)),
        ]);
        frame.render_widget(Paragraph::new(line), rows[4]);
    }
}

fn progress_bar(width: usize, ratio: f64, icons: &Icons) -> String {
    if width < 3 {
        return String::new();
    }
    let filled = ((width - 1) as f64 * ratio).round() as usize;
    let empty = width.saturating_sub(filled + 1);

    let mut bar = String::with_capacity(width * 3);
    bar.push_str(&icons.progress_full.repeat(filled));
    bar.push_str(icons.progress_head);
    bar.push_str(&icons.progress_empty.repeat(empty));
    bar
}
