//! HTTP routes

use axum::extract::{ConnectInfo, Extension, Query};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use chatgate_core::WhitelistPolicy;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::client_ip::client_ip;
use crate::error::ApiError;
use crate::generation::GenerationClient;

/// Path of the chat route
pub const CHAT_PATH: &str = "/dduoai/chat";

/// Shared, read-only request state
#[derive(Debug)]
pub struct AppState {
    /// Whitelist consulted before every generation call
    pub policy: WhitelistPolicy,
    /// Generation API client
    pub generator: GenerationClient,
}

#[derive(Debug, Deserialize)]
struct ChatQuery {
    message: String,
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(CHAT_PATH, get(chat))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ChatQuery>,
) -> Result<String, ApiError> {
    let addr = client_ip(&headers, peer.ip());

    // Hostname rules may block on a lookup
    let allowed = {
        let state = Arc::clone(&state);
        let addr = addr.clone();
        tokio::task::spawn_blocking(move || state.policy.is_allowed(&addr))
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "Whitelist check aborted");
                false
            })
    };
    if !allowed {
        return Err(ApiError::AccessDenied { addr });
    }

    info!(addr = %addr, length = query.message.len(), "Forwarding chat message");
    let reply = state.generator.generate(&query.message).await?;
    Ok(reply)
}
