use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::Response,
};

/// Network-observable client address used as the rate-limit key.
/// Resolved before identity is known to exist, which is why quota is keyed
/// by address and not by account.
#[derive(Debug, Clone)]
pub struct ClientAddr(pub String);

/// Resolve the client address and stash it as a request extension:
/// first hop of `X-Forwarded-For` when present (reverse-proxy deployments),
/// otherwise the peer address from `ConnectInfo`.
pub async fn resolve_client_addr(mut req: Request, next: Next) -> Response {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    let addr = forwarded
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    tracing::debug!(client_addr = %addr, uri = %req.uri().path(), "Resolved client address");

    req.extensions_mut().insert(ClientAddr(addr));
    next.run(req).await
}
