pub mod actions;
pub mod events;
pub mod state;

use crate::config::Config;
use crate::input;
use crate::lyrics;
use crate::player::mpv::MpvHandle;
use crate::player::{Effect, Player, PlayerError, Snapshot, TransportCommand};
use crate::proxy::ProxyClient;
use crate::storage::{PLAYER_KEY, StorageHandle};
use crate::tui::{self, TuiTerminal};
use actions::Action;
use events::{Event, NetworkEvent, PlayerEvent};
use state::{AppState, LyricsView, OpenCollection, Screen, SearchFocus, Toast, TrackList};
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const VOLUME_STEP: u8 = 5;
const SEEK_STEP_SECS: f64 = 10.0;
const PAGE_ROWS: usize = 10;

pub struct App {
    cfg: Config,
    config_path: PathBuf,
    state: AppState,
    player: Player,
    client: ProxyClient,
    store: StorageHandle,
    mpv: Option<MpvHandle>,
}

impl App {
    pub fn new(cfg: Config, config_path: PathBuf, client: ProxyClient, store: StorageHandle) -> Self {
        let mut state = AppState::new();
        state.volume = cfg.player.volume.min(100);
        if let Some(screen) = cfg.ui.last_screen.as_deref().and_then(Screen::from_name) {
            state.screen = screen;
        }
        let player = Player::new(cfg.player.quality.clone());

        Self {
            cfg,
            config_path,
            state,
            player,
            client,
            store,
            mpv: None,
        }
    }

    pub async fn run(&mut self, terminal: &mut TuiTerminal, deep_link: Option<&str>) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        input::spawn_input_task(tx.clone(), self.cfg.input.mouse);

        let mpv_log = self.cfg.paths.mpv_log();
        match MpvHandle::spawn(tx.clone(), self.cfg.player.audio_device.as_deref(), Some(&mpv_log)).await {
            Ok(h) => self.mpv = Some(h),
            Err(e) => {
                warn!("mpv unavailable: {e:#}");
                self.state.toast = Some(Toast::error(format!("mpv disabled: {e:#}")));
            }
        }

        self.restore(deep_link).await;
        self.player.set_volume(self.state.volume);
        self.spawn_load_profile(&tx);
        self.on_screen_enter(&tx);
        self.settle(&tx).await;

        tui::draw(terminal, &mut self.state, &self.player)?;

        // Redraw on input, network and player events only; mpv's time-pos keeps the UI moving.
        while let Some(ev) = rx.recv().await {
            self.handle_event(ev, &tx).await;
            if self.state.should_quit {
                break;
            }
            self.state.tick = self.state.tick.wrapping_add(1);
            tui::draw(terminal, &mut self.state, &self.player)?;
        }

        self.save_state_on_quit();
        Ok(())
    }

    /// Rehydrate the player from the one stored snapshot.
    async fn restore(&mut self, deep_link: Option<&str>) {
        let raw = self
            .store
            .run(|s| s.get(PLAYER_KEY))
            .await
            .unwrap_or_else(|e| {
                warn!("read player snapshot: {e:#}");
                None
            });
        let snapshot = raw.as_deref().and_then(Snapshot::decode);
        self.player.restore(snapshot, deep_link);
    }

    async fn handle_event(&mut self, ev: Event, tx: &mpsc::Sender<Event>) {
        match ev {
            Event::Input(input_ev) => {
                if let Some(action) = input::map_input_to_action(&self.state, input_ev) {
                    self.handle_action(action, tx);
                }
            }
            Event::Player(pe) => self.handle_player(pe),
            Event::Network(ne) => self.handle_network(ne, tx),
        }
        self.settle(tx).await;
    }

    /// Run whatever the player queued, write its snapshot once, and keep lyrics on the
    /// current track.
    async fn settle(&mut self, tx: &mpsc::Sender<Event>) {
        for effect in self.player.take_effects() {
            self.execute(effect, tx).await;
        }
        if let Some(snapshot) = self.player.take_snapshot() {
            self.persist(snapshot).await;
        }
        self.follow_lyrics(tx);
        self.state.queue_cursor.clamp(self.player.playlist().len());
    }

    async fn execute(&mut self, effect: Effect, tx: &mpsc::Sender<Event>) {
        match effect {
            Effect::FetchDetail { id, intent } => {
                self.spawn_request(tx, move |client| async move {
                    let result = client.music_detail(&id).await.map_err(|e| format!("{e:#}"));
                    Ok(NetworkEvent::Detail { intent, result })
                });
            }
            Effect::ResolveStream { generation, track, level } => {
                self.state.duration_secs = track.duration as f64 / 1000.0;
                self.spawn_request(tx, move |client| async move {
                    let result = client
                        .music_link(&track.id, &level)
                        .await
                        .map_err(|e| format!("{e:#}"));
                    Ok(NetworkEvent::Stream { generation, result })
                });
            }
            Effect::Transport(cmd) => {
                if cmd == TransportCommand::Stop {
                    self.state.set_position(0.0);
                }
                let Some(mpv) = &self.mpv else {
                    debug!(?cmd, "no audio output");
                    return;
                };
                if let Err(e) = mpv.execute(&cmd).await {
                    warn!(?cmd, "mpv command failed: {e:#}");
                    self.state.toast = Some(Toast::error(format!("mpv error: {e:#}")));
                }
            }
        }
    }

    async fn persist(&self, snapshot: Snapshot) {
        let raw = match snapshot.encode() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("encode player snapshot: {e:#}");
                return;
            }
        };
        if let Err(e) = self.store.run(move |s| s.set(PLAYER_KEY, &raw)).await {
            warn!("write player snapshot: {e:#}");
        }
    }

    fn follow_lyrics(&mut self, tx: &mpsc::Sender<Event>) {
        let current = self.player.current().map(|t| t.id.clone());
        let shown = self.state.lyrics.as_ref().map(|v| v.track_id.as_str());
        if current.as_deref() == shown {
            return;
        }
        let Some(track_id) = current else {
            self.state.lyrics = None;
            return;
        };

        self.state.lyrics = Some(LyricsView::loading(track_id.clone()));
        let store = self.store.clone();
        self.spawn_request(tx, move |client| async move {
            Ok(match lyrics::load(&client, &store, &track_id).await {
                Ok(lyrics) => NetworkEvent::LyricsLoaded { track_id, lyrics },
                Err(e) => NetworkEvent::LyricsFailed {
                    track_id,
                    message: format!("{e:#}"),
                },
            })
        });
    }

    fn handle_player(&mut self, pe: PlayerEvent) {
        match pe {
            PlayerEvent::Started => self.state.paused = false,
            PlayerEvent::Paused => self.state.paused = true,
            PlayerEvent::Position { seconds } => self.state.set_position(seconds),
            PlayerEvent::Duration { seconds } => {
                if seconds > 0.0 {
                    self.state.duration_secs = seconds;
                }
            }
            PlayerEvent::Transport(ev) => self.player.on_transport(ev),
        }
    }

    fn handle_network(&mut self, ne: NetworkEvent, tx: &mpsc::Sender<Event>) {
        match ne {
            NetworkEvent::Error(e) => {
                warn!("request failed: {e}");
                self.state.stop_loading();
                self.state.toast = Some(Toast::error(e));
            }
            NetworkEvent::Detail { intent, result } => self.player.on_detail(intent, result),
            NetworkEvent::Stream { generation, result } => self.player.on_stream(generation, result),
            NetworkEvent::SearchResults { query, page, tracks, total } => {
                let search = &mut self.state.search;
                if search.last_query.as_deref() != Some(query.as_str()) {
                    debug!(%query, "dropping results for an old query");
                    return;
                }
                search.page = page;
                search.total = total;
                if page == 0 {
                    search.results.set_tracks(tracks);
                    if !search.results.tracks.is_empty() {
                        self.state.search_focus = SearchFocus::Results;
                    }
                } else {
                    search.results.append_tracks(tracks);
                }
            }
            NetworkEvent::DailyLoaded { tracks } => self.state.daily.set_tracks(tracks),
            NetworkEvent::ProfileLoaded { profile } => {
                if let Some(p) = &profile {
                    info!(uid = p.uid, "logged in as {}", p.nickname);
                }
                self.state.profile = profile;
                self.on_screen_enter(tx);
            }
            NetworkEvent::PlaylistsLoaded { playlists } => {
                let library = &mut self.state.library;
                library.playlists = playlists;
                library.cursor.reset();
                library.loading = false;
                library.loaded = true;
            }
            NetworkEvent::CollectionLoaded { name, tracks } => {
                if let Some(open) = &mut self.state.library.open {
                    open.name = name;
                    open.list.set_tracks(tracks);
                }
            }
            NetworkEvent::LyricsLoaded { track_id, lyrics } => {
                if self.lyrics_pending_for(&track_id) {
                    self.state.lyrics = Some(LyricsView::ready(track_id, lyrics, self.state.position_secs));
                }
            }
            NetworkEvent::LyricsFailed { track_id, message } => {
                if self.lyrics_pending_for(&track_id) {
                    warn!(%track_id, "lyrics failed: {message}");
                    if let Some(view) = &mut self.state.lyrics {
                        view.loading = false;
                    }
                    self.state.toast = Some(Toast::error(format!("Lyrics: {message}")));
                }
            }
        }
    }

    fn lyrics_pending_for(&self, track_id: &str) -> bool {
        self.state
            .lyrics
            .as_ref()
            .is_some_and(|v| v.loading && v.track_id == track_id)
    }

    fn handle_action(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::NextScreen => self.set_screen(self.state.screen.next(), tx),
            Action::PrevScreen => self.set_screen(self.state.screen.prev(), tx),
            Action::SetScreen(screen) => self.set_screen(screen, tx),
            Action::SetSearchFocus(focus) => self.state.search_focus = focus,
            Action::ListUp
            | Action::ListDown
            | Action::GoTop
            | Action::GoBottom
            | Action::PageUp
            | Action::PageDown => self.move_cursor(action, tx),
            Action::Refresh => self.refresh(tx),
            Action::Resize => {}

            Action::InputChar(c) => self.state.search.query.push(c),
            Action::Backspace => {
                self.state.search.query.pop();
            }
            Action::ClearInput => self.state.search.query.clear(),
            Action::StartSearch => self.spawn_search(0, tx),

            Action::Activate => self.activate(tx),
            Action::Enqueue => {
                if let Some(track) = self.state.active_tracks().and_then(TrackList::selected_track) {
                    let (id, name) = (track.id.clone(), track.display());
                    self.player.play_and_enqueue(&id, false);
                    self.state.toast = Some(Toast::success(format!("Queued {name}")));
                }
            }
            Action::ReplaceQueue => {
                let tracks = self
                    .state
                    .active_tracks()
                    .map(|l| l.tracks.clone())
                    .unwrap_or_default();
                if !tracks.is_empty() {
                    let n = tracks.len();
                    self.player.replace_playlist(tracks);
                    self.state.queue_cursor.reset();
                    self.state.toast = Some(Toast::success(format!("Queue replaced ({n} tracks)")));
                }
            }
            Action::RemoveSelected => {
                if self.state.screen == Screen::Queue {
                    self.player.remove_at(self.state.queue_cursor.selected);
                }
            }
            Action::CloseCollection => self.state.library.open = None,

            Action::PlayNext => self.player.play_next(),
            Action::PlayPrev => self.player.play_previous(),
            Action::ToggleMode => {
                self.player.toggle_mode();
                self.state.toast = Some(Toast::success(format!("Mode: {}", self.player.mode().label())));
            }
            Action::TogglePause => {
                if self.player.last_error().is_some_and(PlayerError::needs_manual_start) {
                    self.player.clear_error();
                }
                self.player.toggle_pause();
            }
            Action::VolumeUp => {
                self.state.volume = self.state.volume.saturating_add(VOLUME_STEP).min(100);
                self.player.set_volume(self.state.volume);
            }
            Action::VolumeDown => {
                self.state.volume = self.state.volume.saturating_sub(VOLUME_STEP);
                self.player.set_volume(self.state.volume);
            }
            Action::SeekForward => self.player.seek_by(SEEK_STEP_SECS),
            Action::SeekBack => self.player.seek_by(-SEEK_STEP_SECS),
            Action::DismissError => self.player.clear_error(),
        }
    }

    fn set_screen(&mut self, screen: Screen, tx: &mpsc::Sender<Event>) {
        self.state.screen = screen;
        self.on_screen_enter(tx);
    }

    fn on_screen_enter(&mut self, tx: &mpsc::Sender<Event>) {
        match self.state.screen {
            Screen::Daily if !self.state.daily.loaded && !self.state.daily.loading => self.spawn_load_daily(tx),
            Screen::Library if !self.state.library.loaded && !self.state.library.loading => {
                self.spawn_load_playlists(tx)
            }
            _ => {}
        }
    }

    fn refresh(&mut self, tx: &mpsc::Sender<Event>) {
        match self.state.screen {
            Screen::Search => self.spawn_search(0, tx),
            Screen::Daily => self.spawn_load_daily(tx),
            Screen::Library => {
                self.state.library.open = None;
                self.state.library.loaded = false;
                self.spawn_load_profile(tx);
            }
            _ => {}
        }
    }

    fn move_cursor(&mut self, action: Action, tx: &mpsc::Sender<Event>) {
        let (cursor, len) = match self.state.screen {
            Screen::Queue => (&mut self.state.queue_cursor, self.player.playlist().len()),
            Screen::Library if self.state.library.open.is_none() => {
                let library = &mut self.state.library;
                (&mut library.cursor, library.playlists.len())
            }
            _ => match self.state.active_tracks_mut() {
                Some(list) => {
                    let len = list.tracks.len();
                    (&mut list.cursor, len)
                }
                None => return,
            },
        };
        match action {
            Action::ListUp => cursor.up(),
            Action::ListDown => cursor.down(len),
            Action::GoTop => cursor.top(),
            Action::GoBottom => cursor.bottom(len),
            Action::PageUp => cursor.page_up(PAGE_ROWS),
            Action::PageDown => cursor.page_down(PAGE_ROWS, len),
            _ => {}
        }

        if self.state.screen == Screen::Search && self.state.search.should_load_more() {
            self.spawn_search(self.state.search.page + 1, tx);
        }
    }

    fn activate(&mut self, tx: &mpsc::Sender<Event>) {
        match self.state.screen {
            Screen::Search if self.state.search_focus == SearchFocus::Input => self.spawn_search(0, tx),
            Screen::Queue => self.player.play_at(self.state.queue_cursor.selected),
            Screen::Library if self.state.library.open.is_none() => self.open_selected_playlist(tx),
            _ => {
                let id = self
                    .state
                    .active_tracks()
                    .and_then(TrackList::selected_track)
                    .map(|t| t.id.clone());
                if let Some(id) = id {
                    self.player.play_and_enqueue(&id, true);
                }
            }
        }
    }

    fn spawn_request<F, Fut>(&self, tx: &mpsc::Sender<Event>, request: F)
    where
        F: FnOnce(ProxyClient) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<NetworkEvent>> + Send + 'static,
    {
        let client = self.client.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let ev = request(client)
                .await
                .unwrap_or_else(|e| NetworkEvent::Error(format!("{e:#}")));
            let _ = tx.send(Event::Network(ev)).await;
        });
    }

    fn spawn_search(&mut self, page: u32, tx: &mpsc::Sender<Event>) {
        let search = &mut self.state.search;
        if page == 0 {
            let query = search.query.trim().to_string();
            if query.is_empty() {
                self.state.toast = Some(Toast::error("Type a query first"));
                return;
            }
            search.last_query = Some(query);
        } else if search.results.loading {
            return;
        }
        let Some(query) = search.last_query.clone() else {
            return;
        };
        search.results.loading = true;
        debug!(%query, page, "searching");

        self.spawn_request(tx, move |client| async move {
            let found = client.search_music(&query, page).await?;
            Ok(NetworkEvent::SearchResults {
                query,
                page,
                tracks: found.songs,
                total: found.song_count,
            })
        });
    }

    fn spawn_load_daily(&mut self, tx: &mpsc::Sender<Event>) {
        self.state.daily.loading = true;
        self.spawn_request(tx, |client| async move {
            let tracks = client.daily_recommendation().await?;
            Ok(NetworkEvent::DailyLoaded { tracks })
        });
    }

    fn spawn_load_profile(&self, tx: &mpsc::Sender<Event>) {
        self.spawn_request(tx, |client| async move {
            let profile = client.login_status().await?;
            Ok(NetworkEvent::ProfileLoaded { profile })
        });
    }

    /// Needs a logged-in profile; retried when the profile arrives.
    fn spawn_load_playlists(&mut self, tx: &mpsc::Sender<Event>) {
        let Some(uid) = self.state.profile.as_ref().map(|p| p.uid.to_string()) else {
            return;
        };
        self.state.library.loading = true;
        self.spawn_request(tx, move |client| async move {
            let playlists = client.user_playlists(&uid, 0).await?;
            Ok(NetworkEvent::PlaylistsLoaded { playlists })
        });
    }

    fn open_selected_playlist(&mut self, tx: &mpsc::Sender<Event>) {
        let Some(playlist) = self.state.library.selected_playlist().cloned() else {
            return;
        };
        self.state.library.open = Some(OpenCollection {
            name: playlist.name.clone(),
            list: TrackList {
                loading: true,
                ..TrackList::default()
            },
        });
        self.spawn_request(tx, move |client| async move {
            let detail = client.playlist(&playlist.id).await?;
            Ok(NetworkEvent::CollectionLoaded {
                name: detail.name,
                tracks: detail.songs,
            })
        });
    }

    fn save_state_on_quit(&mut self) {
        self.cfg.player.volume = self.state.volume;
        self.cfg.ui.last_screen = Some(self.state.screen.name().to_string());
        if let Err(e) = crate::config::save(&self.cfg, Some(&self.config_path)) {
            warn!("save config: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{DetailIntent, PlayMode};
    use crate::playlist::track;
    use crate::storage::Storage;
    use std::time::Duration;

    // Nothing listens on the discard port, so every request fails fast.
    fn app() -> (App, StorageHandle) {
        let store = StorageHandle::new(Storage::open_in_memory().unwrap());
        let client = ProxyClient::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let path = std::env::temp_dir().join("tonearm-app-test.toml");
        (App::new(Config::default(), path, client, store.clone()), store)
    }

    fn stored_snapshot(store: &StorageHandle) -> Option<Snapshot> {
        store
            .blocking(|s| s.get(PLAYER_KEY))
            .unwrap()
            .as_deref()
            .and_then(Snapshot::decode)
    }

    async fn next_network(rx: &mut mpsc::Receiver<Event>, want: impl Fn(&NetworkEvent) -> bool) -> Event {
        loop {
            let ev = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("event in time")
                .expect("channel open");
            if let Event::Network(ne) = &ev
                && want(ne)
            {
                return ev;
            }
        }
    }

    #[tokio::test]
    async fn mode_change_is_persisted_once_settled() {
        let (mut app, store) = app();
        let (tx, _rx) = mpsc::channel(16);
        app.handle_action(Action::ToggleMode, &tx);
        assert!(stored_snapshot(&store).is_none());
        app.settle(&tx).await;
        let snap = stored_snapshot(&store).unwrap();
        assert_eq!(snap.play_mode, PlayMode::Shuffle);
        assert_eq!(snap.current_play_index, -1);
    }

    #[tokio::test]
    async fn enqueued_track_lands_in_snapshot() {
        let (mut app, store) = app();
        let (tx, _rx) = mpsc::channel(16);
        app.handle_network(
            NetworkEvent::Detail {
                intent: DetailIntent::Enqueue { from_browse: true },
                result: Ok(track("11")),
            },
            &tx,
        );
        app.settle(&tx).await;
        let snap = stored_snapshot(&store).unwrap();
        assert_eq!(snap.play_list.len(), 1);
        assert_eq!(snap.current_play_index, 0);
        assert_eq!(app.state.lyrics.as_ref().map(|v| v.track_id.as_str()), Some("11"));
    }

    #[tokio::test]
    async fn unreachable_stream_becomes_player_error() {
        let (mut app, _store) = app();
        let (tx, mut rx) = mpsc::channel(16);
        app.handle_network(
            NetworkEvent::Detail {
                intent: DetailIntent::Preview,
                result: Ok(track("5")),
            },
            &tx,
        );
        app.settle(&tx).await;
        assert!(app.player.is_loading());

        let ev = next_network(&mut rx, |ne| matches!(ne, NetworkEvent::Stream { .. })).await;
        app.handle_event(ev, &tx).await;
        assert!(matches!(app.player.last_error(), Some(PlayerError::NoStream { .. })));
        assert!(app.player.current_url().is_none());
    }

    #[tokio::test]
    async fn restore_keeps_playlist_and_previews_deep_link() {
        let (mut app, store) = app();
        let snap = Snapshot {
            play_list: vec![track("1"), track("2")],
            current_play_index: 1,
            play_mode: PlayMode::Reverse,
        };
        let raw = snap.encode().unwrap();
        store.blocking(|s| s.set(PLAYER_KEY, &raw)).unwrap();

        app.restore(Some("99")).await;
        assert_eq!(app.player.playlist().len(), 2);
        assert_eq!(app.player.index(), Some(1));
        assert_eq!(app.player.mode(), PlayMode::Reverse);
        let effects = app.player.take_effects();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::FetchDetail { id, intent: DetailIntent::Preview } if id == "99"
        )));
    }

    #[tokio::test]
    async fn results_for_an_old_query_are_dropped() {
        let (mut app, _store) = app();
        let (tx, _rx) = mpsc::channel(16);
        app.state.search.last_query = Some("new".into());
        app.handle_network(
            NetworkEvent::SearchResults {
                query: "old".into(),
                page: 0,
                tracks: vec![track("1")],
                total: 1,
            },
            &tx,
        );
        assert!(app.state.search.results.tracks.is_empty());
        app.handle_network(
            NetworkEvent::SearchResults {
                query: "new".into(),
                page: 0,
                tracks: vec![track("2")],
                total: 1,
            },
            &tx,
        );
        assert_eq!(app.state.search.results.tracks.len(), 1);
        assert_eq!(app.state.search_focus, SearchFocus::Results);
    }

    #[tokio::test]
    async fn queue_removal_keeps_cursor_in_range() {
        let (mut app, _store) = app();
        let (tx, _rx) = mpsc::channel(16);
        app.player.replace_playlist(vec![track("1"), track("2")]);
        app.state.screen = Screen::Queue;
        app.handle_action(Action::GoBottom, &tx);
        assert_eq!(app.state.queue_cursor.selected, 1);
        app.handle_action(Action::RemoveSelected, &tx);
        app.settle(&tx).await;
        assert_eq!(app.player.playlist().len(), 1);
        assert_eq!(app.state.queue_cursor.selected, 0);
    }

    #[tokio::test]
    async fn stale_lyrics_are_ignored() {
        let (mut app, _store) = app();
        let (tx, _rx) = mpsc::channel(16);
        app.state.lyrics = Some(LyricsView::loading("2"));
        app.handle_network(
            NetworkEvent::LyricsLoaded {
                track_id: "1".into(),
                lyrics: lyrics::Lyrics::from_payload("[00:01.00]old", ""),
            },
            &tx,
        );
        assert!(app.state.lyrics.as_ref().unwrap().loading);
        app.handle_network(
            NetworkEvent::LyricsFailed {
                track_id: "2".into(),
                message: "boom".into(),
            },
            &tx,
        );
        assert!(!app.state.lyrics.as_ref().unwrap().loading);
        assert!(app.state.toast.is_some());
    }
}
