//! Bearer-token authentication for the SSE transport: a static configured
//! allow-list of bearer tokens, compared on every `GET /sse`. The stdio
//! transport has no network surface and performs no auth.

use axum::http::HeaderMap;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Checks an `Authorization: Bearer <token>` header against a configured
/// allow-list.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    tokens: Vec<String>,
}

impl BearerAuth {
    /// An empty allow-list disables auth entirely: every request passes.
    /// This matches local/demo operation where `auth_tokens` is left
    /// unset.
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn is_enabled(&self) -> bool {
        !self.tokens.is_empty()
    }

    /// `true` if the request should be let through: auth disabled, or the
    /// `Authorization` header carries a bearer token in the allow-list.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let Some(header) = headers.get("authorization").or_else(|| headers.get("Authorization")) else {
            warn!("SSE connection rejected: missing Authorization header");
            return false;
        };
        let Ok(header) = header.to_str() else {
            warn!("SSE connection rejected: non-UTF8 Authorization header");
            return false;
        };
        let Some(token) = header.strip_prefix("Bearer ") else {
            warn!("SSE connection rejected: Authorization header is not a Bearer token");
            return false;
        };

        let presented = token.trim().as_bytes();
        let matched = self
            .tokens
            .iter()
            .any(|candidate| bool::from(candidate.as_bytes().ct_eq(presented)));

        if matched {
            true
        } else {
            warn!("SSE connection rejected: bearer token not in allow-list");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn disabled_auth_allows_everything() {
        let auth = BearerAuth::disabled();
        assert!(auth.authorize(&HeaderMap::new()));
    }

    #[test]
    fn missing_header_is_rejected_when_enabled() {
        let auth = BearerAuth::new(["secret-token".to_string()]);
        assert!(!auth.authorize(&HeaderMap::new()));
    }

    #[test]
    fn token_in_allow_list_is_accepted() {
        let auth = BearerAuth::new(["secret-token".to_string()]);
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret-token"));
        assert!(auth.authorize(&headers));
    }

    #[test]
    fn token_not_in_allow_list_is_rejected() {
        let auth = BearerAuth::new(["secret-token".to_string()]);
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer wrong-token"));
        assert!(!auth.authorize(&headers));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let auth = BearerAuth::new(["secret-token".to_string()]);
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(!auth.authorize(&headers));
    }
}
