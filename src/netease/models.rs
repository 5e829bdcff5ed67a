use serde::{Deserialize, Deserializer, Serialize};

/// A playable song, already shaped by the upstream adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Milliseconds.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub album_pic: String,
}

impl Track {
    /// "Name - Author A, Author B"
    pub fn display(&self) -> String {
        if self.authors.is_empty() {
            self.name.clone()
        } else {
            format!("{} - {}", self.name, self.authors.join(", "))
        }
    }
}

/// Playlist or album detail; both share one shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollectionDetail {
    pub creator_name: String,
    pub name: String,
    /// `YYYY-MM-DD`, empty when unknown.
    pub create_time: String,
    pub description: String,
    pub songs: Vec<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub album_pic: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SongSearch {
    pub songs: Vec<Track>,
    pub song_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaylistSearch {
    pub playlists: Vec<PlaylistSummary>,
    pub playlist_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlbumSearch {
    pub albums: Vec<AlbumSummary>,
    pub album_count: u64,
}

/// Raw timed-text documents for one track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricsPayload {
    pub lrc: String,
    pub sub_lrc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QrStatus {
    Waiting,
    Expired,
    Success,
    Unknown,
}

impl QrStatus {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(801) | Some(802) => QrStatus::Waiting,
            Some(800) => QrStatus::Expired,
            Some(803) => QrStatus::Success,
            _ => QrStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub uid: u64,
    #[serde(default)]
    pub nickname: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub avatar_url: String,
}

fn id_from_string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(u64),
        Float(f64),
    }

    Ok(match Id::deserialize(de)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(f) => format!("{f:.0}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_accepts_numeric_ids() {
        let t: Track = serde_json::from_str(
            r#"{"id":186016,"name":"Sunny","duration":240000,"authors":["A"],"albumPic":""}"#,
        )
        .unwrap();
        assert_eq!(t.id, "186016");
        assert_eq!(t.display(), "Sunny - A");
    }

    #[test]
    fn track_serializes_camel_case() {
        let t = Track {
            id: "1".into(),
            name: "x".into(),
            duration: 1,
            authors: vec![],
            album_pic: "http://pic".into(),
        };
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v["albumPic"], "http://pic");
        assert_eq!(t.display(), "x");
    }

    #[test]
    fn qr_codes() {
        assert_eq!(QrStatus::from_code(Some(801)), QrStatus::Waiting);
        assert_eq!(QrStatus::from_code(Some(800)), QrStatus::Expired);
        assert_eq!(QrStatus::from_code(Some(803)), QrStatus::Success);
        assert_eq!(QrStatus::from_code(None), QrStatus::Unknown);
    }
}
