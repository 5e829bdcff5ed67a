use crate::lyrics::{LyricSync, Lyrics, LyricsNotice};
use crate::netease::models::{PlaylistSummary, Profile, Track};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Search,
    Queue,
    Lyrics,
    Daily,
    Library,
    Help,
}

impl Screen {
    /// Sidebar order.
    pub const ALL: [Screen; 6] = [
        Screen::Search,
        Screen::Queue,
        Screen::Lyrics,
        Screen::Daily,
        Screen::Library,
        Screen::Help,
    ];

    pub fn position(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Screen::Search => "search",
            Screen::Queue => "queue",
            Screen::Lyrics => "lyrics",
            Screen::Daily => "daily",
            Screen::Library => "library",
            Screen::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Search => "Search",
            Screen::Queue => "Queue",
            Screen::Lyrics => "Lyrics",
            Screen::Daily => "Daily",
            Screen::Library => "Library",
            Screen::Help => "Help",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Input,
    Results,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub created_at: std::time::Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Success,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            created_at: std::time::Instant::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > std::time::Duration::from_secs(3)
    }
}

/// A cursor over a list of rows with virtual scrolling.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    pub selected: usize,
    pub scroll_offset: usize,
}

impl Cursor {
    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self, len: usize) {
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn top(&mut self) {
        self.selected = 0;
    }

    pub fn bottom(&mut self, len: usize) {
        self.selected = len.saturating_sub(1);
    }

    pub fn page_up(&mut self, page: usize) {
        self.selected = self.selected.saturating_sub(page);
    }

    pub fn page_down(&mut self, page: usize, len: usize) {
        if len > 0 {
            self.selected = (self.selected + page).min(len - 1);
        }
    }

    /// Keep the selection inside a list that may have shrunk.
    pub fn clamp(&mut self, len: usize) {
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn update_scroll(&mut self, visible_height: usize) {
        if visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + visible_height {
            self.scroll_offset = self.selected - visible_height + 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackList {
    pub tracks: Vec<Track>,
    pub cursor: Cursor,
    pub loading: bool,
    pub loaded: bool,
}

impl TrackList {
    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.cursor.selected)
    }

    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        self.cursor.reset();
        self.loaded = true;
        self.loading = false;
    }

    pub fn append_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks.extend(tracks);
        self.loading = false;
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchState {
    pub query: String,
    /// Query the current results belong to.
    pub last_query: Option<String>,
    pub page: u32,
    pub total: u64,
    pub results: TrackList,
}

impl SearchState {
    pub fn has_more(&self) -> bool {
        (self.results.tracks.len() as u64) < self.total
    }

    /// Near enough to the end of the results to fetch the next page.
    pub fn should_load_more(&self) -> bool {
        !self.results.loading
            && self.has_more()
            && self.results.cursor.selected + 5 >= self.results.tracks.len()
    }
}

/// The user's playlists, and the tracks of the one opened.
#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    pub playlists: Vec<PlaylistSummary>,
    pub cursor: Cursor,
    pub loading: bool,
    pub loaded: bool,
    pub open: Option<OpenCollection>,
}

#[derive(Debug, Clone, Default)]
pub struct OpenCollection {
    pub name: String,
    pub list: TrackList,
}

impl LibraryState {
    pub fn selected_playlist(&self) -> Option<&PlaylistSummary> {
        self.playlists.get(self.cursor.selected)
    }
}

/// Lyrics for the track that is current in the player.
#[derive(Debug, Clone)]
pub struct LyricsView {
    pub track_id: String,
    pub sync: LyricSync,
    pub notice: Option<LyricsNotice>,
    pub loading: bool,
}

impl LyricsView {
    pub fn loading(track_id: impl Into<String>) -> Self {
        let placeholder = Lyrics::placeholder();
        Self {
            track_id: track_id.into(),
            sync: placeholder.into_sync(),
            notice: None,
            loading: true,
        }
    }

    pub fn ready(track_id: impl Into<String>, lyrics: Lyrics, position_secs: f64) -> Self {
        let notice = lyrics.notice;
        let mut sync = lyrics.into_sync();
        sync.update(position_secs);
        Self {
            track_id: track_id.into(),
            sync,
            notice,
            loading: false,
        }
    }
}

pub struct AppState {
    pub should_quit: bool,
    pub tick: u64,
    pub screen: Screen,

    pub search: SearchState,
    pub search_focus: SearchFocus,
    pub daily: TrackList,
    pub library: LibraryState,
    pub queue_cursor: Cursor,

    // Playback display
    pub paused: bool,
    pub position_secs: f64,
    pub duration_secs: f64,
    pub volume: u8,

    pub lyrics: Option<LyricsView>,
    pub profile: Option<Profile>,
    pub toast: Option<Toast>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            tick: 0,
            screen: Screen::Search,
            search: SearchState::default(),
            search_focus: SearchFocus::Input,
            daily: TrackList::default(),
            library: LibraryState::default(),
            queue_cursor: Cursor::default(),
            paused: false,
            position_secs: 0.0,
            duration_secs: 0.0,
            volume: 80,
            lyrics: None,
            profile: None,
            toast: None,
        }
    }

    /// The track list shown on the current screen, if it shows one.
    pub fn active_tracks(&self) -> Option<&TrackList> {
        match self.screen {
            Screen::Search => Some(&self.search.results),
            Screen::Daily => Some(&self.daily),
            Screen::Library => self.library.open.as_ref().map(|c| &c.list),
            _ => None,
        }
    }

    pub fn active_tracks_mut(&mut self) -> Option<&mut TrackList> {
        match self.screen {
            Screen::Search => Some(&mut self.search.results),
            Screen::Daily => Some(&mut self.daily),
            Screen::Library => self.library.open.as_mut().map(|c| &mut c.list),
            _ => None,
        }
    }

    /// A request failed; nothing is in flight that will clear these.
    pub fn stop_loading(&mut self) {
        self.search.results.loading = false;
        self.daily.loading = false;
        self.library.loading = false;
        if let Some(open) = &mut self.library.open {
            open.list.loading = false;
        }
    }

    /// Move playback display to a new position and advance the lyric cursor with it.
    pub fn set_position(&mut self, seconds: f64) {
        self.position_secs = seconds;
        if let Some(view) = &mut self.lyrics {
            view.sync.update(seconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::track;

    #[test]
    fn screens_cycle_in_sidebar_order() {
        assert_eq!(Screen::Search.next(), Screen::Queue);
        assert_eq!(Screen::Help.next(), Screen::Search);
        assert_eq!(Screen::Search.prev(), Screen::Help);
        for s in Screen::ALL {
            assert_eq!(Screen::from_name(s.name()), Some(s));
        }
        assert_eq!(Screen::from_name("history"), None);
    }

    #[test]
    fn cursor_stays_in_bounds() {
        let mut c = Cursor::default();
        c.up();
        assert_eq!(c.selected, 0);
        c.down(3);
        c.down(3);
        c.down(3);
        assert_eq!(c.selected, 2);
        c.clamp(1);
        assert_eq!(c.selected, 0);
        c.page_down(10, 4);
        assert_eq!(c.selected, 3);
        c.down(0);
        assert_eq!(c.selected, 3);
    }

    #[test]
    fn scroll_follows_selection() {
        let mut c = Cursor::default();
        c.bottom(20);
        c.update_scroll(5);
        assert_eq!(c.scroll_offset, 15);
        c.top();
        c.update_scroll(5);
        assert_eq!(c.scroll_offset, 0);
    }

    #[test]
    fn search_pages_until_total() {
        let mut s = SearchState::default();
        s.results.set_tracks((0..30).map(|i| track(&i.to_string())).collect());
        s.total = 45;
        assert!(s.has_more());
        assert!(!s.should_load_more());
        s.results.cursor.bottom(30);
        assert!(s.should_load_more());
        s.results.append_tracks((30..45).map(|i| track(&i.to_string())).collect());
        assert!(!s.has_more());
    }

    #[test]
    fn active_tracks_follow_screen() {
        let mut st = AppState::new();
        st.daily.set_tracks(vec![track("1")]);
        st.screen = Screen::Daily;
        assert_eq!(st.active_tracks().and_then(TrackList::selected_track).map(|t| t.id.as_str()), Some("1"));
        st.screen = Screen::Library;
        assert!(st.active_tracks().is_none());
        st.library.open = Some(OpenCollection::default());
        assert!(st.active_tracks().is_some());
        st.screen = Screen::Queue;
        assert!(st.active_tracks_mut().is_none());
    }

    #[test]
    fn position_drives_lyrics() {
        let mut st = AppState::new();
        let lyrics = Lyrics::from_payload("[00:01.00]one\n[00:04.00]two", "");
        st.lyrics = Some(LyricsView::ready("7", lyrics, 0.0));
        st.set_position(4.5);
        let view = st.lyrics.as_ref().unwrap();
        assert_eq!(view.sync.active_line().unwrap().text, "two");
        assert!(!view.loading);
    }
}
