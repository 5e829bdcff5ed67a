use crate::netease::Track;
use crate::player::PlayMode;
use crate::playlist::Playlist;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Durable player state: `{ playList, currentPlayIndex, playMode }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub play_list: Vec<Track>,
    /// `-1` when nothing is focused.
    pub current_play_index: i64,
    pub play_mode: PlayMode,
}

impl Snapshot {
    pub fn capture(playlist: &Playlist, mode: PlayMode) -> Self {
        Self {
            play_list: playlist.tracks().to_vec(),
            current_play_index: playlist.index().map_or(-1, |i| i as i64),
            play_mode: mode,
        }
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Anything unreadable is no saved state.
    pub fn decode(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("ignoring unreadable player snapshot: {e}");
                None
            }
        }
    }

    /// Validated playlist and mode. An index outside the list or a repeated track id makes the
    /// whole snapshot invalid.
    pub fn into_parts(self) -> Option<(Playlist, PlayMode)> {
        let index = match self.current_play_index {
            -1 => None,
            i if i >= 0 => Some(i as usize),
            i => {
                warn!(index = i, "ignoring player snapshot with negative index");
                return None;
            }
        };
        let len = self.play_list.len();
        match Playlist::from_parts(self.play_list, index) {
            Some(pl) => Some((pl, self.play_mode)),
            None => {
                warn!(index = self.current_play_index, len, "ignoring malformed player snapshot");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlist::track;

    #[test]
    fn wire_format_field_names() {
        let mut pl = Playlist::new();
        pl.replace(vec![track("1"), track("2")]);
        let raw = Snapshot::capture(&pl, PlayMode::Shuffle).encode().unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["currentPlayIndex"], 0);
        assert_eq!(v["playMode"], "shuffle");
        assert_eq!(v["playList"][1]["id"], "2");
        assert_eq!(v["playList"][1]["albumPic"], "");
    }

    #[test]
    fn empty_playlist_captures_minus_one() {
        let snap = Snapshot::capture(&Playlist::new(), PlayMode::Sequential);
        assert_eq!(snap.current_play_index, -1);
        let (pl, mode) = snap.into_parts().unwrap();
        assert!(pl.is_empty());
        assert_eq!(mode, PlayMode::Sequential);
    }

    #[test]
    fn garbage_is_absent() {
        assert!(Snapshot::decode("not json").is_none());
        assert!(Snapshot::decode(r#"{"playList": []}"#).is_none());
        assert!(Snapshot::decode(r#"{"playList":[],"currentPlayIndex":-1,"playMode":"loop"}"#).is_none());
    }

    #[test]
    fn out_of_range_index_is_absent() {
        let raw = r#"{"playList":[{"id":"1","name":"a","duration":1,"authors":[],"albumPic":""}],"currentPlayIndex":3,"playMode":"sequence"}"#;
        assert!(Snapshot::decode(raw).unwrap().into_parts().is_none());
        let raw = raw.replace("\"currentPlayIndex\":3", "\"currentPlayIndex\":-4");
        assert!(Snapshot::decode(&raw).unwrap().into_parts().is_none());
    }

    #[test]
    fn repeated_track_id_is_absent() {
        let snap = Snapshot {
            play_list: vec![track("a"), track("b"), track("a"), track("c")],
            current_play_index: 2,
            play_mode: PlayMode::Sequential,
        };
        assert!(snap.into_parts().is_none());
    }

    #[test]
    fn accepts_numeric_ids_from_older_writers() {
        let raw = r#"{"playList":[{"id":5,"name":"a","duration":1,"authors":["x"],"albumPic":""}],"currentPlayIndex":0,"playMode":"reverse"}"#;
        let (pl, mode) = Snapshot::decode(raw).unwrap().into_parts().unwrap();
        assert_eq!(pl.current().unwrap().id, "5");
        assert_eq!(mode, PlayMode::Reverse);
    }
}
