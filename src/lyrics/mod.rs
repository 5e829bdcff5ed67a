//! Timed lyrics: parsing, translation merge, playback sync, and loading through the proxy.

pub mod merge;
pub mod parser;
pub mod sync;

pub use merge::MergedLine;
pub use parser::LyricLine;
pub use sync::LyricSync;

use crate::netease::models::LyricsPayload;
use crate::proxy::ProxyClient;
use crate::storage::StorageHandle;
use tracing::{debug, warn};

/// Something the viewer should tell the user alongside the lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsNotice {
    NoLyrics,
    TranslationOnly,
}

impl LyricsNotice {
    pub fn message(self) -> &'static str {
        match self {
            LyricsNotice::NoLyrics => "No lyrics for this track",
            LyricsNotice::TranslationOnly => "Only translated lyrics available",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lyrics {
    pub lines: Vec<MergedLine>,
    pub notice: Option<LyricsNotice>,
}

impl Lyrics {
    pub fn placeholder() -> Self {
        Self::from_payload("", "")
    }

    /// Both empty gives the placeholder; a lone translation becomes the primary text.
    pub fn from_payload(lrc: &str, sub_lrc: &str) -> Self {
        let primary = parser::parse_lrc(lrc);
        let secondary = parser::parse_lrc(sub_lrc);
        match (primary.is_empty(), secondary.is_empty()) {
            (true, true) => Self {
                lines: merge::merge(&parser::parse_or_placeholder(""), &[]),
                notice: Some(LyricsNotice::NoLyrics),
            },
            (true, false) => Self {
                lines: merge::merge(&secondary, &[]),
                notice: Some(LyricsNotice::TranslationOnly),
            },
            _ => Self {
                lines: merge::merge(&primary, &secondary),
                notice: None,
            },
        }
    }

    pub fn into_sync(self) -> LyricSync {
        LyricSync::new(self.lines)
    }
}

/// Lyrics for a track, from the local cache or the proxy. Fetched documents are cached.
pub async fn load(client: &ProxyClient, store: &StorageHandle, track_id: &str) -> anyhow::Result<Lyrics> {
    let id = track_id.to_string();
    let cached = store.run(move |s| s.cached_lyrics(&id)).await.unwrap_or_else(|e| {
        warn!("lyrics cache read failed: {e:#}");
        None
    });
    if let Some((lrc, sub_lrc)) = cached {
        debug!(track_id, "lyrics from cache");
        return Ok(Lyrics::from_payload(&lrc, &sub_lrc));
    }

    let LyricsPayload { lrc, sub_lrc } = client.lyrics(track_id).await?;
    let lyrics = Lyrics::from_payload(&lrc, &sub_lrc);
    let id = track_id.to_string();
    if let Err(e) = store.run(move |s| s.cache_lyrics(&id, &lrc, &sub_lrc)).await {
        warn!("lyrics cache write failed: {e:#}");
    }
    Ok(lyrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use std::time::Duration;

    #[test]
    fn empty_payload_is_placeholder() {
        let l = Lyrics::from_payload("", "");
        assert_eq!(l.notice, Some(LyricsNotice::NoLyrics));
        assert_eq!(l.lines.len(), 1);
        assert_eq!(l.lines[0].text, parser::PLACEHOLDER);
        assert_eq!(l.lines[0].time_ms, 0);
    }

    #[test]
    fn translation_only_is_promoted() {
        let l = Lyrics::from_payload("", "[00:01.00]bonjour");
        assert_eq!(l.notice, Some(LyricsNotice::TranslationOnly));
        assert_eq!(l.lines[0].text, "bonjour");
        assert_eq!(l.lines[0].translation, None);
    }

    #[test]
    fn both_present_are_merged() {
        let l = Lyrics::from_payload("[00:01.00]hello\n[00:05.00]bye", "[00:01.20]salut");
        assert_eq!(l.notice, None);
        assert_eq!(l.lines[0].translation.as_deref(), Some("salut"));
        assert_eq!(l.lines[1].translation, None);
    }

    #[tokio::test]
    async fn cached_lyrics_skip_the_network() {
        let store = StorageHandle::new(Storage::open_in_memory().unwrap());
        store
            .run(|s| s.cache_lyrics("42", "[00:02.00]cached", ""))
            .await
            .unwrap();
        // Nothing listens here; a network call would fail the test.
        let client = ProxyClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let lyrics = load(&client, &store, "42").await.unwrap();
        assert_eq!(lyrics.lines[0].text, "cached");
    }
}
