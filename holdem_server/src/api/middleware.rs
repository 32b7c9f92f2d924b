//! Player identification for player-scoped endpoints.
//!
//! Authentication happens in front of this server; whatever sits there
//! forwards the authenticated player in the `x-player-id` header. The
//! middleware parses it and injects the [`PlayerId`] into request extensions
//! for downstream handlers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! use holdem_server::api::middleware::player_middleware;
//! # async fn handler() {}
//!
//! let routes: Router = Router::new()
//!     .route("/api/v1/wallet", get(handler))
//!     .layer(middleware::from_fn(player_middleware));
//! # let _ = routes;
//! ```
//!
//! In handler functions, extract the player ID from request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use holdem_engine::game::entities::PlayerId;
//!
//! async fn handler(Extension(player_id): Extension<PlayerId>) -> String {
//!     format!("Acting as player {}", player_id)
//! }
//! # let _ = handler;
//! ```

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use holdem_engine::game::entities::PlayerId;

pub const PLAYER_ID_HEADER: &str = "x-player-id";

fn player_id(headers: &HeaderMap) -> Option<PlayerId> {
    headers
        .get(PLAYER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .filter(|id: &PlayerId| *id > 0)
}

pub async fn player_middleware(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    match player_id(request.headers()) {
        Some(player_id) => {
            request.extensions_mut().insert(player_id);
            Ok(next.run(request).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_player_id_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(player_id(&headers), None);

        headers.insert(PLAYER_ID_HEADER, HeaderValue::from_static("42"));
        assert_eq!(player_id(&headers), Some(42));

        headers.insert(PLAYER_ID_HEADER, HeaderValue::from_static("0"));
        assert_eq!(player_id(&headers), None);

        headers.insert(PLAYER_ID_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(player_id(&headers), None);
    }
}
