//! Admin authentication extractor.
//!
//! Handlers that mutate content take an [`AdminSession`] argument. The token
//! comes from `Authorization: Bearer <token>`, or from a `token` query
//! parameter for clients that cannot set headers (file pickers, links).

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use serde::Deserialize;

use crate::error::AppError;
use crate::services::auth::AdminClaims;
use crate::state::AppState;

/// Proof that the request carried a valid admin token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: AdminClaims,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .or_else(|| query_token(parts))
            .ok_or(AppError::Unauthorized("Missing token"))?;

        let claims = state.auth().verify(&token)?;
        Ok(Self { claims })
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

fn query_token(parts: &Parts) -> Option<String> {
    let Query(query) = Query::<TokenQuery>::try_from_uri(&parts.uri).ok()?;
    query.token.filter(|token| !token.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn reads_bearer_header_any_case() {
        assert_eq!(
            bearer_token(&parts("/", Some("Bearer abc.def"))).as_deref(),
            Some("abc.def")
        );
        assert_eq!(
            bearer_token(&parts("/", Some("bearer abc"))).as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn ignores_other_schemes_and_blank_tokens() {
        assert!(bearer_token(&parts("/", Some("Basic dXNlcjpwdw=="))).is_none());
        assert!(bearer_token(&parts("/", Some("Bearer  "))).is_none());
        assert!(bearer_token(&parts("/", None)).is_none());
    }

    #[test]
    fn reads_token_query_parameter() {
        assert_eq!(
            query_token(&parts("/upload?x=1&token=abc", None)).as_deref(),
            Some("abc")
        );
        assert!(query_token(&parts("/upload?token=", None)).is_none());
        assert!(query_token(&parts("/upload?tokens=abc", None)).is_none());
        assert!(query_token(&parts("/upload", None)).is_none());
    }

    #[test]
    fn query_token_is_percent_decoded() {
        assert_eq!(
            query_token(&parts("/leads?token=ab%2Ecd%3D&page=2", None)).as_deref(),
            Some("ab.cd=")
        );
    }
}
