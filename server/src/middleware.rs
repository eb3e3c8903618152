//! Request middleware: caller identification and request statistics.

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response
};
use gw_core::ClientId;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::state::AppState;

pub const CLIENT_ID_HEADER: &str = "x-client-id";
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// Identity signals gathered from the transport before the body is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerHints {
    pub header_id: Option<String>,
    pub forwarded_for: Option<String>,
    pub peer: Option<String>
}

impl CallerHints {
    pub fn from_request(request: &Request) -> Self {
        let headers = request.headers();
        Self {
            header_id: header_value(headers, CLIENT_ID_HEADER),
            forwarded_for: header_value(headers, FORWARDED_FOR_HEADER).and_then(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .find(|hop| !hop.is_empty())
                    .map(str::to_string)
            }),
            peer: request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        }
    }

    /// Picks the caller identity: explicit header, then the body's
    /// `clientId`/`user_id`, then the first forwarded hop, then the peer
    /// address.
    pub fn resolve(&self, body: &Value) -> ClientId {
        self.header_id
            .clone()
            .or_else(|| body_client_id(body))
            .or_else(|| self.forwarded_for.clone())
            .or_else(|| self.peer.clone())
            .map_or_else(ClientId::anonymous, ClientId::new)
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn body_client_id(body: &Value) -> Option<String> {
    ["clientId", "user_id"]
        .iter()
        .filter_map(|key| body.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None
        })
}

pub async fn caller_hints(mut request: Request, next: Next) -> Response {
    let hints = CallerHints::from_request(&request);
    request.extensions_mut().insert(hints);
    next.run(request).await
}

pub async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next
) -> Response {
    let endpoint = request.extensions().get::<MatchedPath>().map_or_else(
        || request.uri().path().to_string(),
        |path| path.as_str().to_string()
    );
    let started = Instant::now();

    let response = next.run(request).await;

    state
        .stats
        .record(endpoint, response.status().as_u16(), started.elapsed());
    response
}
