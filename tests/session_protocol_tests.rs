/// Tests for the session token protocol
///
/// Note: These verify the wire-level protocol the server implements:
/// HS256 token shapes, dual-secret separation, and the envelope format.
/// The store-backed flows are covered by the unit tests in src/.

use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessClaims {
    sub: String,
    email: String,
    username: String,
    display_name: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct RefreshClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

const ACCESS_SECRET: &[u8] = b"test-access-secret-test-access-secret";
const REFRESH_SECRET: &[u8] = b"test-refresh-secret-test-refresh-sec";

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[test]
fn test_access_token_claims_decode_to_identity() {
    let claims = AccessClaims {
        sub: "acct-42".into(),
        email: "user@example.com".into(),
        username: "user".into(),
        display_name: "User".into(),
        iat: now(),
        exp: now() + 900,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(ACCESS_SECRET),
    )
    .unwrap();

    let decoded = decode::<AccessClaims>(
        &token,
        &DecodingKey::from_secret(ACCESS_SECRET),
        &Validation::new(Algorithm::HS256),
    )
    .unwrap();

    assert_eq!(decoded.claims.sub, "acct-42");
    assert_eq!(decoded.claims.username, "user");
}

#[test]
fn test_refresh_token_rejected_by_access_secret() {
    let claims = RefreshClaims {
        sub: "acct-42".into(),
        iat: now(),
        exp: now() + 864000,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(REFRESH_SECRET),
    )
    .unwrap();

    // Separate secrets mean a refresh token can never pass as an access token
    let result = decode::<RefreshClaims>(
        &token,
        &DecodingKey::from_secret(ACCESS_SECRET),
        &Validation::new(Algorithm::HS256),
    );
    assert!(result.is_err());
}

#[test]
fn test_expired_token_rejected() {
    let claims = RefreshClaims {
        sub: "acct-42".into(),
        iat: now() - 7200,
        exp: now() - 3600,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(REFRESH_SECRET),
    )
    .unwrap();

    let result = decode::<RefreshClaims>(
        &token,
        &DecodingKey::from_secret(REFRESH_SECRET),
        &Validation::new(Algorithm::HS256),
    );
    assert!(result.is_err());
}

#[test]
fn test_error_envelope_shape() {
    let envelope = serde_json::json!({
        "statusCode": 401,
        "data": null,
        "message": "Invalid credentials",
        "success": false,
        "errors": []
    });

    assert_eq!(envelope["success"], false);
    assert!(envelope["data"].is_null());
    assert!(envelope["errors"].as_array().unwrap().is_empty());
}

#[test]
fn test_bearer_header_parsing() {
    let auth_header = "Bearer abc123token";
    assert_eq!(auth_header.strip_prefix("Bearer "), Some("abc123token"));

    let invalid_header = "abc123token";
    assert_eq!(invalid_header.strip_prefix("Bearer "), None);
}
