/// Credential extraction and cookie helpers
use axum::http::HeaderMap;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}

/// Extract a named cookie value from request headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(name)
        .map(|c| c.value().to_string())
}

/// Locate the access credential: cookie first, then bearer header
pub fn extract_access_token(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, ACCESS_TOKEN_COOKIE).or_else(|| extract_bearer_token(headers))
}

/// Locate a presented refresh token from the cookie, if any
pub fn extract_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    extract_cookie(headers, REFRESH_TOKEN_COOKIE)
}

/// Build an http-only auth cookie
pub fn auth_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::seconds(max_age_secs))
        .build()
}

/// Build a removal cookie that clears a previously set auth cookie
pub fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::ZERO)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_bearer_token(&headers), Some("abc123".to_string()));

        let mut bare = HeaderMap::new();
        bare.insert("authorization", HeaderValue::from_static("abc123"));
        assert_eq!(extract_bearer_token(&bare), None);
    }

    #[test]
    fn test_cookie_takes_priority_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("accessToken=from-cookie"),
        );
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            extract_access_token(&headers),
            Some("from-cookie".to_string())
        );
    }

    #[test]
    fn test_header_used_when_cookie_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(
            extract_access_token(&headers),
            Some("from-header".to_string())
        );
    }

    #[test]
    fn test_no_credential_is_none() {
        assert_eq!(extract_access_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie(ACCESS_TOKEN_COOKIE, "tok".into(), 900, true);
        assert_eq!(cookie.name(), "accessToken");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }
}
