use crate::netease::models::{
    AlbumSearch, CollectionDetail, LyricsPayload, PlaylistSearch, PlaylistSummary, Profile, QrStatus,
    SongSearch, Track,
};
use crate::proxy::Envelope;
use crate::proxy::session::{self, SESSION_COOKIE};
use crate::storage::{SESSION_KEY, StorageHandle};
use anyhow::{Context, anyhow, bail};
use reqwest::header::{COOKIE, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

struct Inner {
    http: reqwest::Client,
    endpoint: String,
    session: Mutex<Option<String>>,
    store: Option<StorageHandle>,
}

/// Client for the proxy endpoint. Holds the session cookie like a browser would.
#[derive(Clone)]
pub struct ProxyClient {
    inner: Arc<Inner>,
}

impl ProxyClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::build(base_url, timeout, None, None)
    }

    /// A client whose session survives restarts through `store`.
    pub async fn with_store(base_url: &str, timeout: Duration, store: StorageHandle) -> anyhow::Result<Self> {
        let session = store.run(|s| s.get(SESSION_KEY)).await?;
        Self::build(base_url, timeout, session, Some(store))
    }

    fn build(
        base_url: &str,
        timeout: Duration,
        session: Option<String>,
        store: Option<StorageHandle>,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build reqwest client")?;
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                endpoint: format!("{}/api/netease", base_url.trim_end_matches('/')),
                session: Mutex::new(session),
                store,
            }),
        })
    }

    pub fn has_session(&self) -> bool {
        self.session().is_some()
    }

    fn session(&self) -> Option<String> {
        self.inner.session.lock().ok().and_then(|s| s.clone())
    }

    /// Call one proxy operation and return its `data`.
    pub async fn invoke(&self, app: &str, args: Value) -> anyhow::Result<Value> {
        let mut body = match args {
            Value::Object(m) => m,
            Value::Null => Map::new(),
            other => bail!("arguments for {app} must be an object, got {other}"),
        };
        body.insert("app".to_string(), Value::String(app.to_string()));

        let mut req = self.inner.http.post(&self.inner.endpoint).json(&body);
        if let Some(payload) = self.session() {
            req = req.header(COOKIE, format!("{SESSION_COOKIE}={payload}"));
        }
        let resp = req.send().await.with_context(|| format!("call {app}"))?;
        let status = resp.status();

        let update = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .find_map(session::payload_from_set_cookie);
        if let Some(update) = update {
            self.update_session(update).await;
        }

        let envelope: Envelope = resp
            .json()
            .await
            .with_context(|| format!("{app}: unreadable reply (http {status})"))?;
        if !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("{app} failed with http {status}"));
            return Err(anyhow!(message));
        }
        debug!(app, "proxy call ok");
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    async fn call<T: DeserializeOwned>(&self, app: &str, args: Value) -> anyhow::Result<T> {
        let data = self.invoke(app, args).await?;
        serde_json::from_value(data).with_context(|| format!("decode {app} reply"))
    }

    async fn update_session(&self, next: Option<String>) {
        {
            let Ok(mut current) = self.inner.session.lock() else {
                return;
            };
            if *current == next {
                return;
            }
            *current = next.clone();
        }
        let Some(store) = &self.inner.store else {
            return;
        };
        let res = store
            .run(move |s| match next {
                Some(v) => s.set(SESSION_KEY, &v),
                None => s.remove(SESSION_KEY),
            })
            .await;
        if let Err(e) = res {
            warn!("persist session failed: {e:#}");
        }
    }

    /// Resolve a playable URL; a track without one is an error.
    pub async fn music_link(&self, id: &str, level: &str) -> anyhow::Result<String> {
        let url: Option<String> = self
            .call("getMusicLink", json!({ "id": id, "level": level }))
            .await?;
        url.filter(|u| !u.is_empty())
            .ok_or_else(|| anyhow!("no playable source"))
    }

    /// A reply without a song is an error.
    pub async fn music_detail(&self, id: &str) -> anyhow::Result<Track> {
        let track: Option<Track> = self.call("getMusicDetail", json!({ "id": id })).await?;
        track.ok_or_else(|| anyhow!("track {id} not found"))
    }

    pub async fn lyrics(&self, id: &str) -> anyhow::Result<LyricsPayload> {
        self.call("getLyrics", json!({ "id": id })).await
    }

    pub async fn qr_code_url(&self) -> anyhow::Result<String> {
        self.call("getQRCodeUrl", Value::Null).await
    }

    pub async fn qr_code_status(&self, uni_key: &str) -> anyhow::Result<QrStatus> {
        self.call("getQRCodeStatus", json!({ "uniKey": uni_key })).await
    }

    pub async fn playlist(&self, id: &str) -> anyhow::Result<CollectionDetail> {
        self.call("getPlaylist", json!({ "id": id })).await
    }

    pub async fn album(&self, id: &str) -> anyhow::Result<CollectionDetail> {
        self.call("getAlbum", json!({ "id": id })).await
    }

    pub async fn search_music(&self, keyword: &str, page: u32) -> anyhow::Result<SongSearch> {
        self.call("searchMusic", json!({ "keyword": keyword, "page": page }))
            .await
    }

    pub async fn search_playlist(&self, keyword: &str, page: u32) -> anyhow::Result<PlaylistSearch> {
        self.call("searchPlaylist", json!({ "keyword": keyword, "page": page }))
            .await
    }

    pub async fn search_album(&self, keyword: &str, page: u32) -> anyhow::Result<AlbumSearch> {
        self.call("searchAlbum", json!({ "keyword": keyword, "page": page }))
            .await
    }

    pub async fn daily_recommendation(&self) -> anyhow::Result<Vec<Track>> {
        self.call("getDailyRecommendation", Value::Null).await
    }

    /// `None` when not logged in.
    pub async fn login_status(&self) -> anyhow::Result<Option<Profile>> {
        self.call("getLoginStatus", Value::Null).await
    }

    pub async fn user_playlists(&self, uid: &str, page: u32) -> anyhow::Result<Vec<PlaylistSummary>> {
        self.call("getUserPlaylists", json!({ "uid": uid, "page": page }))
            .await
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        self.invoke("logout", Value::Null).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netease::NeteaseClient;
    use crate::proxy::server::{self, ProxyContext};
    use crate::storage::Storage;
    use axum::{Json, Router, http::header, routing::get, routing::post};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn start(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    async fn proxy_over_fake_upstream() -> SocketAddr {
        let upstream = Router::new()
            .route(
                "/api/song/enhance/player/url/v1",
                get(|| async { Json(json!({"code": 200, "data": [{"url": null}]})) }),
            )
            .route(
                "/api/login/qrcode/client/login",
                get(|| async {
                    (
                        [(header::SET_COOKIE, "MUSIC_U=granted; Path=/")],
                        Json(json!({"code": 803})),
                    )
                }),
            )
            .route(
                "/api/user/logout",
                get(|| async { Json(json!({"code": 200})) }),
            )
            .route(
                "/api/w/nuser/account/get",
                post(|headers: axum::http::HeaderMap| async move {
                    let cookie = headers
                        .get(header::COOKIE)
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    if cookie.contains("MUSIC_U=granted") {
                        Json(json!({"account": {"id": 9}, "profile": {"userId": 9}}))
                    } else {
                        Json(json!({"account": null, "profile": null}))
                    }
                }),
            )
            .route(
                "/api/v1/user/detail/9",
                post(|| async { Json(json!({"profile": {"nickname": "nine", "defaultAvatar": true}})) }),
            );
        let upstream_addr = start(upstream).await;
        let ctx = ProxyContext {
            upstream: NeteaseClient::new(&format!("http://{upstream_addr}"), "3.1.11", Duration::from_secs(5))
                .unwrap(),
        };
        start(server::router(ctx)).await
    }

    #[tokio::test]
    async fn session_flows_from_login_to_logout() {
        let proxy = proxy_over_fake_upstream().await;
        let store = StorageHandle::new(Storage::open_in_memory().unwrap());
        let client = ProxyClient::with_store(&format!("http://{proxy}"), Duration::from_secs(5), store.clone())
            .await
            .unwrap();

        assert!(client.login_status().await.unwrap().is_none());
        assert!(!client.has_session());

        assert_eq!(client.qr_code_status("key").await.unwrap(), QrStatus::Success);
        assert!(client.has_session());
        assert!(store.run(|s| s.get(SESSION_KEY)).await.unwrap().is_some());

        let profile = client.login_status().await.unwrap().unwrap();
        assert_eq!(profile.uid, 9);
        assert_eq!(profile.nickname, "nine");
        assert_eq!(profile.avatar_url, "");

        client.logout().await.unwrap();
        assert!(!client.has_session());
        assert!(store.run(|s| s.get(SESSION_KEY)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_link_is_no_playable_source() {
        let proxy = proxy_over_fake_upstream().await;
        let client = ProxyClient::new(&format!("http://{proxy}"), Duration::from_secs(5)).unwrap();
        let err = client.music_link("1", "lossless").await.unwrap_err();
        assert_eq!(err.to_string(), "no playable source");
    }

    #[tokio::test]
    async fn empty_detail_is_track_not_found() {
        let proxy = start(Router::new().route(
            "/api/netease",
            post(|| async { Json(json!({"success": true, "data": null})) }),
        ))
        .await;
        let client = ProxyClient::new(&format!("http://{proxy}"), Duration::from_secs(5)).unwrap();
        let err = client.music_detail("42").await.unwrap_err();
        assert_eq!(err.to_string(), "track 42 not found");
    }

    #[tokio::test]
    async fn failure_message_is_surfaced() {
        let proxy = proxy_over_fake_upstream().await;
        let client = ProxyClient::new(&format!("http://{proxy}"), Duration::from_secs(5)).unwrap();
        let err = client.invoke("getMusicDetail", Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing id");
        let err = client.invoke("bogus", Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown app: bogus");
    }
}
