//! The `authToken` cookie that carries the backend session.

use crate::errors::AppError;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use url::form_urlencoded;

pub const AUTH_COOKIE: &str = "authToken";

/// Sessions issued by the backend last a week.
pub const SESSION_MAX_AGE_SECS: u64 = 7 * 24 * 60 * 60;

const LOGIN_PATH: &str = "/auth/login";
const DEFAULT_AFTER_LOGIN: &str = "/calendar";

/// Bearer token of the logged-in visitor. Rejects with a redirect to the
/// login page when the cookie is missing.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match cookie_value(&parts.headers, AUTH_COOKIE) {
            Some(token) if !token.is_empty() => Ok(Self(token.to_string())),
            _ => Err(AppError::unauthenticated(parts.uri.path())),
        }
    }
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"'))
}

pub fn session_cookie(token: &str) -> String {
    format!("{AUTH_COOKIE}={token}; Path=/; Max-Age={SESSION_MAX_AGE_SECS}; HttpOnly; SameSite=Lax")
}

/// Expires the session cookie.
pub const CLEAR_COOKIE: &str = "authToken=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax";

/// Login page URL that returns to `path` once logged in.
pub fn login_path(path: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{LOGIN_PATH}?redirect={encoded}")
}

/// Where to go after logging in. Only local paths are honoured.
pub fn after_login(redirect: Option<&str>) -> &str {
    match redirect {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => {
            path
        }
        _ => DEFAULT_AFTER_LOGIN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; authToken=abc123; lang=da"),
        );
        assert_eq!(cookie_value(&headers, AUTH_COOKIE), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn reads_multiple_cookie_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("authToken=\"xyz\""));
        assert_eq!(cookie_value(&headers, AUTH_COOKIE), Some("xyz"));
    }

    #[test]
    fn cookies_have_a_week_or_nothing() {
        assert_eq!(
            session_cookie("t"),
            "authToken=t; Path=/; Max-Age=604800; HttpOnly; SameSite=Lax"
        );
        assert!(CLEAR_COOKIE.starts_with(&format!("{AUTH_COOKIE}=;")));
        assert!(CLEAR_COOKIE.contains("Max-Age=0"));
    }

    #[test]
    fn login_path_encodes_return_path() {
        assert_eq!(login_path("/calendar/2026-01-05"), "/auth/login?redirect=%2Fcalendar%2F2026-01-05");
    }

    #[test]
    fn after_login_only_follows_local_paths() {
        assert_eq!(after_login(Some("/admin")), "/admin");
        assert_eq!(after_login(Some("//evil.example")), "/calendar");
        assert_eq!(after_login(Some("https://evil.example")), "/calendar");
        assert_eq!(after_login(None), "/calendar");
    }
}
