//! The proxy boundary between the player and the upstream service.
//!
//! A request names a logical operation (`app`) plus its arguments; the reply is always an
//! [`Envelope`]. The server side lives in [`server`], the client side in [`client`].

pub mod client;
pub mod server;
pub mod session;

pub use client::ProxyClient;

use crate::netease::{NeteaseClient, Upstream};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalized reply of every proxy call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), message: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, message: Some(message.into()) }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Invalid JSON body")]
    InvalidBody,
    #[error("Missing or invalid \"app\" parameter")]
    MissingApp,
    #[error("{0}")]
    MissingArgument(&'static str),
    #[error("Unknown app: {0}")]
    UnknownApp(String),
    #[error("{0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl ProxyError {
    /// Argument problems are the caller's fault; everything else is ours.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ProxyError::Upstream(_))
    }
}

/// One logical upstream operation with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    MusicLink { id: String, level: String },
    MusicDetail { id: String },
    Lyrics { id: String },
    QrCodeUrl,
    QrCodeStatus { uni_key: String },
    Playlist { id: String },
    Album { id: String },
    SearchMusic { keyword: String, page: u32 },
    SearchPlaylist { keyword: String, page: u32 },
    SearchAlbum { keyword: String, page: u32 },
    DailyRecommendation,
    LoginStatus,
    UserPlaylists { uid: String, page: u32 },
    Logout,
}

impl ApiCall {
    /// Validate a request body `{ app, ...args }`.
    pub fn from_body(body: &Value) -> Result<Self, ProxyError> {
        let args = body.as_object().ok_or(ProxyError::MissingApp)?;
        let app = match args.get("app") {
            Some(Value::String(s)) if !s.is_empty() => s.as_str(),
            _ => return Err(ProxyError::MissingApp),
        };

        let need = |key: &str, msg: &'static str| arg(args, key).ok_or(ProxyError::MissingArgument(msg));

        let call = match app {
            "getMusicLink" => {
                let (Some(id), Some(level)) = (arg(args, "id"), arg(args, "level")) else {
                    return Err(ProxyError::MissingArgument("Missing id or level"));
                };
                ApiCall::MusicLink { id, level }
            }
            "getMusicDetail" => ApiCall::MusicDetail { id: need("id", "Missing id")? },
            "getLyrics" => ApiCall::Lyrics { id: need("id", "Missing id")? },
            "getQRCodeUrl" => ApiCall::QrCodeUrl,
            "getQRCodeStatus" => ApiCall::QrCodeStatus { uni_key: need("uniKey", "Missing uniKey")? },
            "getPlaylist" => ApiCall::Playlist { id: need("id", "Missing id")? },
            "getAlbum" => ApiCall::Album { id: need("id", "Missing id")? },
            "searchMusic" => ApiCall::SearchMusic {
                keyword: need("keyword", "Missing keyword")?,
                page: page(args),
            },
            "searchPlaylist" => ApiCall::SearchPlaylist {
                keyword: need("keyword", "Missing keyword")?,
                page: page(args),
            },
            "searchAlbum" => ApiCall::SearchAlbum {
                keyword: need("keyword", "Missing keyword")?,
                page: page(args),
            },
            "getDailyRecommendation" => ApiCall::DailyRecommendation,
            "getLoginStatus" => ApiCall::LoginStatus,
            "getUserPlaylists" => ApiCall::UserPlaylists {
                uid: need("uid", "Missing uid")?,
                page: page(args),
            },
            "logout" => ApiCall::Logout,
            other => return Err(ProxyError::UnknownApp(other.to_string())),
        };
        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApiCall::MusicLink { .. } => "getMusicLink",
            ApiCall::MusicDetail { .. } => "getMusicDetail",
            ApiCall::Lyrics { .. } => "getLyrics",
            ApiCall::QrCodeUrl => "getQRCodeUrl",
            ApiCall::QrCodeStatus { .. } => "getQRCodeStatus",
            ApiCall::Playlist { .. } => "getPlaylist",
            ApiCall::Album { .. } => "getAlbum",
            ApiCall::SearchMusic { .. } => "searchMusic",
            ApiCall::SearchPlaylist { .. } => "searchPlaylist",
            ApiCall::SearchAlbum { .. } => "searchAlbum",
            ApiCall::DailyRecommendation => "getDailyRecommendation",
            ApiCall::LoginStatus => "getLoginStatus",
            ApiCall::UserPlaylists { .. } => "getUserPlaylists",
            ApiCall::Logout => "logout",
        }
    }

    /// Run the call against the upstream with the caller's session cookies.
    pub async fn dispatch(&self, upstream: &NeteaseClient, cookies: &[String]) -> anyhow::Result<Upstream<Value>> {
        match self {
            ApiCall::MusicLink { id, level } => shaped(upstream.music_link(id, level, cookies).await?),
            ApiCall::MusicDetail { id } => shaped(upstream.music_detail(id, cookies).await?),
            ApiCall::Lyrics { id } => shaped(upstream.lyrics(id, cookies).await?),
            ApiCall::QrCodeUrl => shaped(upstream.qr_code_url(cookies).await?),
            ApiCall::QrCodeStatus { uni_key } => shaped(upstream.qr_code_status(uni_key, cookies).await?),
            ApiCall::Playlist { id } => shaped(upstream.playlist(id, cookies).await?),
            ApiCall::Album { id } => shaped(upstream.album(id, cookies).await?),
            ApiCall::SearchMusic { keyword, page } => shaped(upstream.search_music(keyword, *page, cookies).await?),
            ApiCall::SearchPlaylist { keyword, page } => {
                shaped(upstream.search_playlist(keyword, *page, cookies).await?)
            }
            ApiCall::SearchAlbum { keyword, page } => shaped(upstream.search_album(keyword, *page, cookies).await?),
            ApiCall::DailyRecommendation => shaped(upstream.daily_recommendation(cookies).await?),
            ApiCall::LoginStatus => shaped(upstream.login_status(cookies).await?),
            ApiCall::UserPlaylists { uid, page } => shaped(upstream.user_playlists(uid, *page, cookies).await?),
            ApiCall::Logout => shaped(upstream.logout(cookies).await?),
        }
    }
}

fn shaped<T: Serialize>(u: Upstream<T>) -> anyhow::Result<Upstream<Value>> {
    Ok(Upstream {
        data: serde_json::to_value(u.data)?,
        cookies: u.cookies,
    })
}

/// A required argument: absent, null, empty, zero and false all count as missing.
fn arg(args: &Map<String, Value>, key: &str) -> Option<String> {
    match args.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn page(args: &Map<String, Value>) -> u32 {
    match args.get("page") {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as u32,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_calls_and_stringifies_ids() {
        let call = ApiCall::from_body(&json!({"app": "getMusicLink", "id": 123, "level": "lossless"})).unwrap();
        assert_eq!(
            call,
            ApiCall::MusicLink { id: "123".into(), level: "lossless".into() }
        );
        let call = ApiCall::from_body(&json!({"app": "searchMusic", "keyword": "x", "page": "2"})).unwrap();
        assert_eq!(call, ApiCall::SearchMusic { keyword: "x".into(), page: 2 });
        assert_eq!(call.name(), "searchMusic");
    }

    #[test]
    fn falsy_arguments_are_missing() {
        for id in [json!(null), json!(""), json!(0), json!(false)] {
            let err = ApiCall::from_body(&json!({"app": "getMusicDetail", "id": id})).unwrap_err();
            assert_eq!(err.to_string(), "Missing id");
            assert!(err.is_client_error());
        }
        let err = ApiCall::from_body(&json!({"app": "getMusicLink", "id": "1"})).unwrap_err();
        assert_eq!(err.to_string(), "Missing id or level");
    }

    #[test]
    fn app_name_is_validated() {
        let err = ApiCall::from_body(&json!({"id": 1})).unwrap_err();
        assert_eq!(err.to_string(), "Missing or invalid \"app\" parameter");
        let err = ApiCall::from_body(&json!({"app": 5})).unwrap_err();
        assert!(matches!(err, ProxyError::MissingApp));
        let err = ApiCall::from_body(&json!({"app": "dance"})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown app: dance");
    }

    #[test]
    fn argless_calls() {
        assert_eq!(ApiCall::from_body(&json!({"app": "logout"})).unwrap(), ApiCall::Logout);
        assert_eq!(
            ApiCall::from_body(&json!({"app": "getUserPlaylists", "uid": 42})).unwrap(),
            ApiCall::UserPlaylists { uid: "42".into(), page: 0 }
        );
    }
}
