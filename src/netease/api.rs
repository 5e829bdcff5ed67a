use crate::netease::cookies::CookieJar;
use crate::netease::models::{
    AlbumSearch, AlbumSummary, CollectionDetail, LyricsPayload, PlaylistSearch, PlaylistSummary,
    Profile, QrStatus, SongSearch, Track,
};
use anyhow::Context;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, REFERER, SET_COOKIE, USER_AGENT};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Items per search page.
const PAGE_SIZE: u32 = 30;
const USER_PLAYLIST_LIMIT: u32 = 1000;

const SEARCH_MUSIC: u32 = 1;
const SEARCH_ALBUM: u32 = 10;
const SEARCH_PLAYLIST: u32 = 1000;

/// Result of one upstream call: shaped data plus the cookie jar after the call.
#[derive(Debug, Clone)]
pub struct Upstream<T> {
    pub data: T,
    pub cookies: Vec<String>,
}

#[derive(Debug)]
struct Inner {
    http: reqwest::Client,
    base_url: String,
    app_version: String,
}

#[derive(Debug, Clone)]
pub struct NeteaseClient {
    inner: Arc<Inner>,
}

impl NeteaseClient {
    pub fn new(base_url: &str, app_version: &str, timeout: Duration) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://music.163.com"));
        let ua = format!(
            "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Safari/537.36 Chrome/91.0.4472.164 NeteaseMusicDesktop/{app_version}"
        );
        headers.insert(USER_AGENT, HeaderValue::from_str(&ua)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                app_version: app_version.to_string(),
            }),
        })
    }

    pub async fn music_link(
        &self,
        id: &str,
        level: &str,
        cookies: &[String],
    ) -> anyhow::Result<Upstream<Option<String>>> {
        let path = format!(
            "/api/song/enhance/player/url/v1?encodeType=mp3&ids=%5B{}%5D&level={}",
            urlencoding::encode(id),
            urlencoding::encode(level)
        );
        let (v, jar) = self.get(&path, cookies).await.context("music link")?;
        let url = v
            .pointer("/data/0/url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(Upstream { data: url, cookies: jar.into_pairs() })
    }

    pub async fn music_detail(&self, id: &str, cookies: &[String]) -> anyhow::Result<Upstream<Track>> {
        let c = format!(r#"[{{"id": {id}}}]"#);
        let path = format!("/api/v3/song/detail?c={}", urlencoding::encode(&c));
        let (v, jar) = self.get(&path, cookies).await.context("music detail")?;
        let song = v
            .pointer("/songs/0")
            .with_context(|| format!("no song with id {id}"))?;
        let mut track = track_from_raw(song, None);
        track.id = id.to_string();
        Ok(Upstream { data: track, cookies: jar.into_pairs() })
    }

    pub async fn lyrics(&self, id: &str, cookies: &[String]) -> anyhow::Result<Upstream<LyricsPayload>> {
        let path = format!("/api/song/lyric?id={}&lv=0&tv=0", urlencoding::encode(id));
        let (v, jar) = self.get(&path, cookies).await.context("lyrics")?;
        let text = |ptr: &str| {
            v.pointer(ptr)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let data = LyricsPayload {
            lrc: text("/lrc/lyric"),
            sub_lrc: text("/tlyric/lyric"),
        };
        Ok(Upstream { data, cookies: jar.into_pairs() })
    }

    /// Returns the login URL to be rendered as a QR code; it embeds the `codekey`.
    pub async fn qr_code_url(&self, cookies: &[String]) -> anyhow::Result<Upstream<String>> {
        let (v, jar) = self
            .get("/api/login/qrcode/unikey?type=1", cookies)
            .await
            .context("qr unikey")?;
        let key = v.get("unikey").and_then(Value::as_str).unwrap_or("null");
        let data = format!("http://music.163.com/login?codekey={key}");
        Ok(Upstream { data, cookies: jar.into_pairs() })
    }

    pub async fn qr_code_status(&self, uni_key: &str, cookies: &[String]) -> anyhow::Result<Upstream<QrStatus>> {
        let path = format!(
            "/api/login/qrcode/client/login?type=1&key={}",
            urlencoding::encode(uni_key)
        );
        let (v, jar) = self.get(&path, cookies).await.context("qr status")?;
        let status = QrStatus::from_code(v.get("code").and_then(Value::as_i64));
        Ok(Upstream { data: status, cookies: jar.into_pairs() })
    }

    pub async fn playlist(&self, id: &str, cookies: &[String]) -> anyhow::Result<Upstream<CollectionDetail>> {
        let path = format!("/api/v6/playlist/detail?id={}&n=10000", urlencoding::encode(id));
        let (v, jar) = self.get(&path, cookies).await.context("playlist detail")?;
        let pl = v.get("playlist").cloned().unwrap_or(Value::Null);
        let songs = pl
            .get("tracks")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(|t| track_from_raw(t, None)).collect())
            .unwrap_or_default();
        let data = CollectionDetail {
            creator_name: str_at(&pl, "/creator/nickname"),
            name: str_at(&pl, "/name"),
            create_time: pl.get("createTime").and_then(Value::as_i64).map(format_date).unwrap_or_default(),
            description: str_at(&pl, "/description"),
            songs,
        };
        Ok(Upstream { data, cookies: jar.into_pairs() })
    }

    pub async fn album(&self, id: &str, cookies: &[String]) -> anyhow::Result<Upstream<CollectionDetail>> {
        let path = format!("/api/v1/album/{}", urlencoding::encode(id));
        let (v, jar) = self.get(&path, cookies).await.context("album detail")?;
        let album = v.get("album").cloned().unwrap_or(Value::Null);
        let pic = str_at(&album, "/picUrl");
        let songs = v
            .get("songs")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(|t| track_from_raw(t, Some(&pic))).collect())
            .unwrap_or_default();
        let data = CollectionDetail {
            creator_name: str_at(&album, "/artist/name"),
            name: str_at(&album, "/name"),
            create_time: album.get("publishTime").and_then(Value::as_i64).map(format_date).unwrap_or_default(),
            description: str_at(&album, "/description"),
            songs,
        };
        Ok(Upstream { data, cookies: jar.into_pairs() })
    }

    pub async fn search_music(&self, keyword: &str, page: u32, cookies: &[String]) -> anyhow::Result<Upstream<SongSearch>> {
        let (v, jar) = self.search(keyword, page, SEARCH_MUSIC, cookies).await?;
        let songs = v
            .pointer("/result/songs")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(|t| track_from_raw(t, None)).collect())
            .unwrap_or_default();
        let song_count = v.pointer("/result/songCount").and_then(Value::as_u64).unwrap_or(0);
        Ok(Upstream { data: SongSearch { songs, song_count }, cookies: jar.into_pairs() })
    }

    pub async fn search_playlist(&self, keyword: &str, page: u32, cookies: &[String]) -> anyhow::Result<Upstream<PlaylistSearch>> {
        let (v, jar) = self.search(keyword, page, SEARCH_PLAYLIST, cookies).await?;
        let playlists = v
            .pointer("/result/playlists")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(playlist_summary_from_raw).collect())
            .unwrap_or_default();
        let playlist_count = v.pointer("/result/playlistCount").and_then(Value::as_u64).unwrap_or(0);
        Ok(Upstream {
            data: PlaylistSearch { playlists, playlist_count },
            cookies: jar.into_pairs(),
        })
    }

    pub async fn search_album(&self, keyword: &str, page: u32, cookies: &[String]) -> anyhow::Result<Upstream<AlbumSearch>> {
        let (v, jar) = self.search(keyword, page, SEARCH_ALBUM, cookies).await?;
        let albums = v
            .pointer("/result/albums")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .map(|a| AlbumSummary {
                        id: id_of(a),
                        name: str_at(a, "/name"),
                        creator_name: str_at(a, "/artist/name"),
                        album_pic: str_at(a, "/picUrl"),
                    })
                    .collect()
            })
            .unwrap_or_default();
        let album_count = v.pointer("/result/albumCount").and_then(Value::as_u64).unwrap_or(0);
        Ok(Upstream { data: AlbumSearch { albums, album_count }, cookies: jar.into_pairs() })
    }

    pub async fn daily_recommendation(&self, cookies: &[String]) -> anyhow::Result<Upstream<Vec<Track>>> {
        let (v, jar) = self
            .post_json("/api/v3/discovery/recommend/songs", json!({}), cookies)
            .await
            .context("daily recommendation")?;
        let tracks = v
            .pointer("/data/dailySongs")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(|t| track_from_raw(t, None)).collect())
            .unwrap_or_default();
        Ok(Upstream { data: tracks, cookies: jar.into_pairs() })
    }

    /// `None` when the session is anonymous.
    pub async fn login_status(&self, cookies: &[String]) -> anyhow::Result<Upstream<Option<Profile>>> {
        let (account, jar) = self
            .post_json("/api/w/nuser/account/get", json!({}), cookies)
            .await
            .context("account")?;
        let uid = match (account.get("account"), account.pointer("/profile/userId")) {
            (Some(a), Some(uid)) if !a.is_null() => uid.as_u64(),
            _ => None,
        };
        let Some(uid) = uid else {
            return Ok(Upstream { data: None, cookies: jar.into_pairs() });
        };

        let pairs = jar.into_pairs();
        let (detail, jar) = self
            .post_json(&format!("/api/v1/user/detail/{uid}"), json!({}), &pairs)
            .await
            .context("user detail")?;
        let profile = detail.get("profile").cloned().unwrap_or(Value::Null);
        let default_avatar = profile.get("defaultAvatar").and_then(Value::as_bool).unwrap_or(false);
        let data = Profile {
            uid,
            nickname: str_at(&profile, "/nickname"),
            signature: str_at(&profile, "/signature"),
            avatar_url: if default_avatar { String::new() } else { str_at(&profile, "/avatarUrl") },
        };
        Ok(Upstream { data: Some(data), cookies: jar.into_pairs() })
    }

    pub async fn user_playlists(&self, uid: &str, page: u32, cookies: &[String]) -> anyhow::Result<Upstream<Vec<PlaylistSummary>>> {
        let form = [
            ("uid", uid.to_string()),
            ("limit", USER_PLAYLIST_LIMIT.to_string()),
            ("offset", (PAGE_SIZE * page).to_string()),
            ("includeVideo", "true".to_string()),
        ];
        let (v, jar) = self
            .post_form("/api/user/playlist", &form, cookies)
            .await
            .context("user playlists")?;
        let playlists = v
            .get("playlist")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().map(playlist_summary_from_raw).collect())
            .unwrap_or_default();
        Ok(Upstream { data: playlists, cookies: jar.into_pairs() })
    }

    /// Always ends with an empty jar, whatever the upstream answered.
    pub async fn logout(&self, cookies: &[String]) -> anyhow::Result<Upstream<String>> {
        self.get("/api/user/logout", cookies).await.context("logout")?;
        Ok(Upstream { data: "ok".to_string(), cookies: Vec::new() })
    }

    async fn search(&self, keyword: &str, page: u32, kind: u32, cookies: &[String]) -> anyhow::Result<(Value, CookieJar)> {
        let form = [
            ("s", keyword.to_string()),
            ("offset", (PAGE_SIZE * page).to_string()),
            ("limit", PAGE_SIZE.to_string()),
            ("type", kind.to_string()),
            ("total", "true".to_string()),
        ];
        self.post_form("/api/cloudsearch/pc/", &form, cookies)
            .await
            .with_context(|| format!("search type {kind}"))
    }

    async fn get(&self, path: &str, cookies: &[String]) -> anyhow::Result<(Value, CookieJar)> {
        let req = self.inner.http.get(self.url(path));
        self.send(req, cookies).await
    }

    async fn post_json(&self, path: &str, body: Value, cookies: &[String]) -> anyhow::Result<(Value, CookieJar)> {
        let req = self.inner.http.post(self.url(path)).json(&body);
        self.send(req, cookies).await
    }

    async fn post_form(&self, path: &str, form: &[(&str, String)], cookies: &[String]) -> anyhow::Result<(Value, CookieJar)> {
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let req = self
            .inner
            .http
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        self.send(req, cookies).await
    }

    async fn send(&self, req: reqwest::RequestBuilder, cookies: &[String]) -> anyhow::Result<(Value, CookieJar)> {
        let mut jar = CookieJar::from_pairs(cookies).with_client_defaults(&self.inner.app_version);
        let resp = req
            .header(COOKIE, jar.header_value())
            .send()
            .await
            .context("send upstream request")?
            .error_for_status()
            .context("upstream http status")?;

        jar.merge_set_cookie(resp.headers().get_all(SET_COOKIE).iter().filter_map(|h| h.to_str().ok()));
        let v: Value = resp.json().await.context("parse upstream json")?;
        debug!(code = ?v.get("code"), "upstream reply");
        Ok((v, jar))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }
}

fn id_of(v: &Value) -> String {
    match v.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn str_at(v: &Value, ptr: &str) -> String {
    v.pointer(ptr)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Shape an upstream song object; `pic` overrides the per-song cover (album listings).
fn track_from_raw(v: &Value, pic: Option<&str>) -> Track {
    let authors = v
        .get("ar")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Track {
        id: id_of(v),
        name: str_at(v, "/name"),
        duration: v.get("dt").and_then(Value::as_u64).unwrap_or(0),
        authors,
        album_pic: match pic {
            Some(p) => p.to_string(),
            None => str_at(v, "/al/picUrl"),
        },
    }
}

fn playlist_summary_from_raw(v: &Value) -> PlaylistSummary {
    PlaylistSummary {
        id: id_of(v),
        name: str_at(v, "/name"),
        creator_name: str_at(v, "/creator/nickname"),
    }
}

/// Millisecond epoch to `YYYY-MM-DD` (UTC).
fn format_date(ms: i64) -> String {
    match time::OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000) {
        Ok(dt) => format!("{:04}-{:02}-{:02}", dt.year(), u8::from(dt.month()), dt.day()),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_song_objects() {
        let raw = json!({
            "id": 33894312,
            "name": "Song",
            "dt": 215000,
            "ar": [{"name": "First"}, {"name": "Second"}],
            "al": {"picUrl": "http://p/1.jpg"}
        });
        let t = track_from_raw(&raw, None);
        assert_eq!(t.id, "33894312");
        assert_eq!(t.duration, 215000);
        assert_eq!(t.authors, vec!["First", "Second"]);
        assert_eq!(t.album_pic, "http://p/1.jpg");

        let t = track_from_raw(&raw, Some("http://album"));
        assert_eq!(t.album_pic, "http://album");
    }

    #[test]
    fn missing_fields_fall_back_to_empty() {
        let t = track_from_raw(&json!({"id": "7"}), None);
        assert_eq!(t.id, "7");
        assert!(t.name.is_empty());
        assert!(t.authors.is_empty());
        assert_eq!(t.duration, 0);
    }

    #[test]
    fn dates_are_utc_days() {
        assert_eq!(format_date(0), "1970-01-01");
        assert_eq!(format_date(1_700_000_000_000), "2023-11-14");
    }
}
