use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, Screen, SearchFocus};
use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>, mouse_enabled: bool) {
    tokio::task::spawn_blocking(move || {
        loop {
            if !event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                if tx.is_closed() {
                    break;
                }
                continue;
            }
            let ev = match event::read() {
                Ok(CtEvent::Key(k)) if k.kind == KeyEventKind::Press => InputEvent::Key(k),
                Ok(CtEvent::Mouse(m)) if mouse_enabled => InputEvent::Mouse(m),
                Ok(CtEvent::Resize(_, _)) => InputEvent::Resize,
                _ => continue,
            };
            if tx.blocking_send(Event::Input(ev)).is_err() {
                break;
            }
        }
    });
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ListUp),
            MouseEventKind::ScrollDown => Some(Action::ListDown),
            _ => None,
        },
        InputEvent::Key(k) => {
            if state.screen == Screen::Search && state.search_focus == SearchFocus::Input {
                return handle_search_input(state, k);
            }
            screen_keys(state, k).or_else(|| common_keys(k))
        }
    }
}

/// Typing into the query box; only non-character keys do anything else.
fn handle_search_input(state: &AppState, k: KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Tab => Some(Action::NextScreen),
        KeyCode::BackTab => Some(Action::PrevScreen),
        KeyCode::Enter => Some(Action::StartSearch),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Down if !state.search.results.tracks.is_empty() => {
            Some(Action::SetSearchFocus(SearchFocus::Results))
        }
        KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::ClearInput),
        KeyCode::Char(c) if !k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn screen_keys(state: &AppState, k: KeyEvent) -> Option<Action> {
    match (state.screen, k.code) {
        (Screen::Search, KeyCode::Char('/') | KeyCode::Char('i') | KeyCode::Esc) => {
            Some(Action::SetSearchFocus(SearchFocus::Input))
        }
        (Screen::Queue, KeyCode::Char('d') | KeyCode::Delete) if !k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::RemoveSelected)
        }
        (Screen::Library, KeyCode::Esc | KeyCode::Backspace) if state.library.open.is_some() => {
            Some(Action::CloseCollection)
        }
        (Screen::Search | Screen::Daily | Screen::Library, KeyCode::Char('a')) => Some(Action::Enqueue),
        (Screen::Search | Screen::Daily | Screen::Library, KeyCode::Char('P')) => Some(Action::ReplaceQueue),
        _ => None,
    }
}

fn common_keys(k: KeyEvent) -> Option<Action> {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),

        // Navigation - vim style
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ListUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ListDown),
        KeyCode::Char('g') => Some(Action::GoTop),
        KeyCode::Char('G') => Some(Action::GoBottom),
        KeyCode::Char('d') if ctrl => Some(Action::PageDown),
        KeyCode::Char('u') if ctrl => Some(Action::PageUp),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),

        // Screens
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Some(Action::NextScreen),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => Some(Action::PrevScreen),
        KeyCode::Char(c @ '1'..='6') => {
            let idx = c as usize - '1' as usize;
            Screen::ALL.get(idx).map(|s| Action::SetScreen(*s))
        }
        KeyCode::Char('?') | KeyCode::F(1) => Some(Action::SetScreen(Screen::Help)),

        // Playback
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Char('n') => Some(Action::PlayNext),
        KeyCode::Char('p') => Some(Action::PlayPrev),
        KeyCode::Char('m') => Some(Action::ToggleMode),
        KeyCode::Char(' ') => Some(Action::TogglePause),
        KeyCode::Char('=') | KeyCode::Char('+') => Some(Action::VolumeUp),
        KeyCode::Char('-') | KeyCode::Char('_') => Some(Action::VolumeDown),
        KeyCode::Char(']') => Some(Action::SeekForward),
        KeyCode::Char('[') => Some(Action::SeekBack),
        KeyCode::Char('x') => Some(Action::DismissError),

        KeyCode::Char('r') if ctrl => Some(Action::Refresh),
        KeyCode::F(5) => Some(Action::Refresh),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::OpenCollection;
    use crate::playlist::track;

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> InputEvent {
        InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn on(screen: Screen) -> AppState {
        let mut st = AppState::new();
        st.screen = screen;
        st.search_focus = SearchFocus::Results;
        st
    }

    #[test]
    fn search_box_swallows_letters() {
        let st = AppState::new();
        assert_eq!(map_input_to_action(&st, key(KeyCode::Char('q'))), Some(Action::InputChar('q')));
        assert_eq!(map_input_to_action(&st, key(KeyCode::Enter)), Some(Action::StartSearch));
        assert_eq!(map_input_to_action(&st, ctrl('u')), Some(Action::ClearInput));
        // Nothing to focus yet.
        assert_eq!(map_input_to_action(&st, key(KeyCode::Down)), None);
    }

    #[test]
    fn results_focus_uses_player_keys() {
        let mut st = on(Screen::Search);
        st.search.results.set_tracks(vec![track("1")]);
        assert_eq!(map_input_to_action(&st, key(KeyCode::Char('a'))), Some(Action::Enqueue));
        assert_eq!(map_input_to_action(&st, key(KeyCode::Char('P'))), Some(Action::ReplaceQueue));
        assert_eq!(map_input_to_action(&st, key(KeyCode::Char('m'))), Some(Action::ToggleMode));
        assert_eq!(
            map_input_to_action(&st, key(KeyCode::Char('/'))),
            Some(Action::SetSearchFocus(SearchFocus::Input))
        );
    }

    #[test]
    fn d_removes_only_in_queue() {
        assert_eq!(
            map_input_to_action(&on(Screen::Queue), key(KeyCode::Char('d'))),
            Some(Action::RemoveSelected)
        );
        assert_eq!(map_input_to_action(&on(Screen::Daily), key(KeyCode::Char('d'))), None);
        assert_eq!(map_input_to_action(&on(Screen::Queue), ctrl('d')), Some(Action::PageDown));
    }

    #[test]
    fn escape_closes_open_playlist_before_quitting() {
        let mut st = on(Screen::Library);
        assert_eq!(map_input_to_action(&st, key(KeyCode::Esc)), Some(Action::Quit));
        st.library.open = Some(OpenCollection::default());
        assert_eq!(map_input_to_action(&st, key(KeyCode::Esc)), Some(Action::CloseCollection));
    }

    #[test]
    fn digits_jump_to_screens() {
        let st = on(Screen::Queue);
        assert_eq!(map_input_to_action(&st, key(KeyCode::Char('3'))), Some(Action::SetScreen(Screen::Lyrics)));
        assert_eq!(map_input_to_action(&st, key(KeyCode::Char('7'))), None);
    }
}
