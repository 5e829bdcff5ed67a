use crate::lyrics::Lyrics;
use crate::netease::models::{PlaylistSummary, Profile, Track};
use crate::player::{DetailIntent, TransportEvent};

#[derive(Debug, Clone)]
pub enum Event {
    Input(InputEvent),
    Player(PlayerEvent),
    Network(NetworkEvent),
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Key(crossterm::event::KeyEvent),
    Mouse(crossterm::event::MouseEvent),
    Resize,
}

/// What the mpv reader reports. `Transport` is forwarded to the player; the rest is display state.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    Started,
    Paused,
    Position { seconds: f64 },
    Duration { seconds: f64 },
    Transport(TransportEvent),
}

#[derive(Debug, Clone)]
pub enum NetworkEvent {
    Error(String),
    Detail { intent: DetailIntent, result: Result<Track, String> },
    Stream { generation: u64, result: Result<String, String> },
    SearchResults { query: String, page: u32, tracks: Vec<Track>, total: u64 },
    DailyLoaded { tracks: Vec<Track> },
    ProfileLoaded { profile: Option<Profile> },
    PlaylistsLoaded { playlists: Vec<PlaylistSummary> },
    CollectionLoaded { name: String, tracks: Vec<Track> },
    LyricsLoaded { track_id: String, lyrics: Lyrics },
    LyricsFailed { track_id: String, message: String },
}
