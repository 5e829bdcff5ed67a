//! The player state machine.
//!
//! [`Player`] owns the playlist, the play mode, the current track and its stream URL, and the
//! last error. It performs no I/O: operations queue [`Effect`]s that the event loop executes,
//! and results come back through `on_detail`, `on_stream` and `on_transport`.
//!
//! Every "play track" bumps a generation counter. Stream resolutions carry the generation they
//! were issued under and are dropped when a newer play has started since.

pub mod error;
pub mod mode;
pub mod mpv;
pub mod snapshot;

pub use error::{PlaybackRejection, PlayerError};
pub use mode::PlayMode;
pub use snapshot::Snapshot;

use crate::netease::Track;
use crate::playlist::{Playlist, Removal};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

/// Why a track detail was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailIntent {
    /// Play it without touching the playlist.
    Preview,
    /// Add it to the playlist, playing it when `from_browse`, when the playlist was empty, or
    /// when it was already there.
    Enqueue { from_browse: bool },
}

/// Commands for the audio output. Only the player issues these.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCommand {
    /// Stop and drop the loaded source.
    Stop,
    Load(String),
    Play,
    TogglePause,
    /// Relative seek in seconds.
    Seek(f64),
    Volume(u8),
}

/// Events from the audio output the player reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Ended,
    Failed(String),
    PlayRejected(PlaybackRejection),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchDetail { id: String, intent: DetailIntent },
    ResolveStream { generation: u64, track: Track, level: String },
    Transport(TransportCommand),
}

pub struct Player {
    playlist: Playlist,
    mode: PlayMode,
    current: Option<Track>,
    current_url: Option<String>,
    last_error: Option<PlayerError>,
    generation: u64,
    quality: String,
    dirty: bool,
    effects: Vec<Effect>,
    rng: StdRng,
}

impl Player {
    pub fn new(quality: impl Into<String>) -> Self {
        Self::with_rng(quality, StdRng::from_os_rng())
    }

    pub fn with_rng(quality: impl Into<String>, rng: StdRng) -> Self {
        Self {
            playlist: Playlist::new(),
            mode: PlayMode::default(),
            current: None,
            current_url: None,
            last_error: None,
            generation: 0,
            quality: quality.into(),
            dirty: false,
            effects: Vec::new(),
            rng,
        }
    }

    /// Startup rehydration. Called once with the single snapshot read.
    ///
    /// A deep-linked track is previewed and leaves the restored playlist alone; otherwise a
    /// non-empty playlist resumes at its index (or the head when nothing was focused).
    pub fn restore(&mut self, snapshot: Option<Snapshot>, deep_link: Option<&str>) {
        if let Some((playlist, mode)) = snapshot.and_then(Snapshot::into_parts) {
            info!(tracks = playlist.len(), index = ?playlist.index(), mode = mode.label(), "restored player");
            self.playlist = playlist;
            self.mode = mode;
            if deep_link.is_none() && !self.playlist.is_empty() {
                self.play_at(self.playlist.index().unwrap_or(0));
            }
        }
        if let Some(id) = deep_link {
            self.play_by_id(id);
        }
    }

    /// Play a track without adding it to the playlist.
    pub fn play_by_id(&mut self, id: &str) {
        self.fetch_detail(id, DetailIntent::Preview);
    }

    pub fn play_and_enqueue(&mut self, id: &str, from_browse: bool) {
        self.fetch_detail(id, DetailIntent::Enqueue { from_browse });
    }

    pub fn play_next(&mut self) {
        self.step(true);
    }

    pub fn play_previous(&mut self) {
        self.step(false);
    }

    /// Out of range is a no-op.
    pub fn play_at(&mut self, index: usize) {
        let Some(track) = self.playlist.focus(index).cloned() else {
            debug!(index, len = self.playlist.len(), "play_at out of range");
            return;
        };
        self.dirty = true;
        self.play_track(track);
    }

    /// Removing the focused track plays whatever now sits in its slot (wrapping to the head),
    /// whatever the play mode.
    pub fn remove_at(&mut self, index: usize) {
        let Some((removed, outcome)) = self.playlist.remove(index) else {
            return;
        };
        self.dirty = true;
        debug!(index, id = %removed.id, ?outcome, "removed from playlist");
        match outcome {
            Removal::Unfocused => {}
            Removal::FocusMoved(next) => {
                if let Some(track) = self.playlist.get(next).cloned() {
                    self.play_track(track);
                }
            }
            Removal::Emptied => self.stop_and_clear(),
        }
    }

    /// Replace the playlist and play its head. An empty list does not stop playback.
    pub fn replace_playlist(&mut self, tracks: Vec<Track>) {
        self.playlist.replace(tracks);
        self.dirty = true;
        if let Some(first) = self.playlist.current().cloned() {
            self.play_track(first);
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.cycle();
        self.dirty = true;
        info!(mode = self.mode.label(), "play mode");
    }

    pub fn toggle_pause(&mut self) {
        if self.current_url.is_some() {
            self.effects.push(Effect::Transport(TransportCommand::TogglePause));
        }
    }

    pub fn seek_by(&mut self, seconds: f64) {
        if self.current_url.is_some() {
            self.effects.push(Effect::Transport(TransportCommand::Seek(seconds)));
        }
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.effects.push(Effect::Transport(TransportCommand::Volume(volume.min(100))));
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn on_detail(&mut self, intent: DetailIntent, result: Result<Track, String>) {
        let track = match result {
            Ok(t) => t,
            Err(msg) => {
                warn!(?intent, "track detail failed: {msg}");
                self.last_error = Some(PlayerError::Upstream(msg));
                return;
            }
        };
        match intent {
            DetailIntent::Preview => self.play_track(track),
            DetailIntent::Enqueue { from_browse } => {
                let was_empty = self.playlist.is_empty();
                let (pos, existed) = self.playlist.insert(track);
                if !existed {
                    self.dirty = true;
                }
                if from_browse || was_empty || existed {
                    self.play_at(pos);
                } else {
                    debug!(pos, "enqueued without playing");
                }
            }
        }
    }

    pub fn on_stream(&mut self, generation: u64, result: Result<String, String>) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale stream resolution");
            return;
        }
        match result {
            Ok(url) => {
                info!(generation, "stream resolved");
                self.current_url = Some(url.clone());
                self.effects.push(Effect::Transport(TransportCommand::Load(url)));
                self.effects.push(Effect::Transport(TransportCommand::Play));
            }
            Err(reason) => {
                let name = self.current.as_ref().map(Track::display).unwrap_or_default();
                warn!(generation, "no stream for {name}: {reason}");
                self.last_error = Some(PlayerError::NoStream { name, reason });
            }
        }
    }

    pub fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Ended => {
                if self.playlist.is_empty() {
                    self.stop_and_clear();
                } else {
                    self.play_next();
                }
            }
            TransportEvent::Failed(msg) => {
                warn!("transport failed: {msg}");
                self.last_error = Some(PlayerError::Transport(msg));
            }
            TransportEvent::PlayRejected(r) => {
                self.last_error = Some(PlayerError::Playback(r));
            }
        }
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// The snapshot to persist, once per batch of mutations.
    pub fn take_snapshot(&mut self) -> Option<Snapshot> {
        if !std::mem::replace(&mut self.dirty, false) {
            return None;
        }
        Some(Snapshot::capture(&self.playlist, self.mode))
    }

    pub fn current(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn index(&self) -> Option<usize> {
        self.playlist.index()
    }

    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    pub fn last_error(&self) -> Option<&PlayerError> {
        self.last_error.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A track is set but its stream has not resolved yet.
    pub fn is_loading(&self) -> bool {
        self.current.is_some() && self.current_url.is_none() && self.last_error.is_none()
    }

    fn fetch_detail(&mut self, id: &str, intent: DetailIntent) {
        let id = id.trim();
        if id.is_empty() {
            self.last_error = Some(PlayerError::MissingArgument("track id"));
            return;
        }
        self.last_error = None;
        self.effects.push(Effect::FetchDetail {
            id: id.to_string(),
            intent,
        });
    }

    fn step(&mut self, forward: bool) {
        let len = self.playlist.len();
        let current = self.playlist.index();
        let target = if forward {
            self.mode.next_index(current, len, &mut self.rng)
        } else {
            self.mode.prev_index(current, len, &mut self.rng)
        };
        match target {
            Some(i) => self.play_at(i),
            None => self.stop_and_clear(),
        }
    }

    fn play_track(&mut self, track: Track) {
        self.generation += 1;
        self.last_error = None;
        self.current_url = None;
        info!(generation = self.generation, id = %track.id, index = ?self.playlist.index(), "play");
        self.effects.push(Effect::Transport(TransportCommand::Stop));
        self.effects.push(Effect::ResolveStream {
            generation: self.generation,
            track: track.clone(),
            level: self.quality.clone(),
        });
        self.current = Some(track);
    }

    fn stop_and_clear(&mut self) {
        // Invalidate any resolution still in flight.
        self.generation += 1;
        self.current = None;
        self.current_url = None;
        self.effects.push(Effect::Transport(TransportCommand::Stop));
    }
}
