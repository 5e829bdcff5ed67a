//! HTTP side of the proxy: one `POST /api/netease` route.

use crate::netease::{NeteaseClient, Upstream};
use crate::proxy::session::{self, SESSION_COOKIE};
use crate::proxy::{ApiCall, Envelope, ProxyError};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct ProxyContext {
    pub upstream: NeteaseClient,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(Envelope::failure(self.to_string()))).into_response()
    }
}

pub fn router(ctx: ProxyContext) -> Router {
    Router::new()
        .route("/api/netease", post(netease))
        .with_state(ctx)
}

/// Serve until the listener fails.
pub async fn serve(listener: TcpListener, ctx: ProxyContext) -> anyhow::Result<()> {
    info!("proxy listening on {}", listener.local_addr()?);
    axum::serve(listener, router(ctx)).await?;
    Ok(())
}

/// Bind `addr` and serve in the background. Returns the bound address (useful with port 0).
pub async fn spawn(addr: SocketAddr, ctx: ProxyContext) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = serve(listener, ctx).await {
            error!("proxy stopped: {e:#}");
        }
    });
    Ok(local)
}

async fn netease(State(ctx): State<ProxyContext>, headers: HeaderMap, body: Bytes) -> Result<Response, ProxyError> {
    let body: Value = serde_json::from_slice(&body).map_err(|_| ProxyError::InvalidBody)?;
    let call = ApiCall::from_body(&body)?;
    let cookies = session_cookies(&headers);
    debug!(app = call.name(), authenticated = !cookies.is_empty(), "proxy call");

    let Upstream { data, cookies } = call.dispatch(&ctx.upstream, &cookies).await.map_err(|e| {
        warn!(app = call.name(), "upstream failed: {e:#}");
        ProxyError::Upstream(e)
    })?;

    let mut resp = Json(Envelope::ok(data)).into_response();
    let payload = session::encode_payload(&cookies);
    if let Ok(v) = HeaderValue::from_str(&session::set_cookie_header(payload.as_deref())) {
        resp.headers_mut().insert(header::SET_COOKIE, v);
    }
    Ok(resp)
}

fn session_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(|h| session::parse_cookie_header(h).remove(SESSION_COOKIE))
        .map(|payload| session::decode_payload(&payload))
        .unwrap_or_default()
}
