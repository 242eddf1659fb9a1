/// Session extraction for protected routes
use crate::{
    account::AccountView,
    api::middleware::extract_access_token,
    context::AppContext,
    error::ApiError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated session - extracts and verifies the access token, then
/// resolves the acting account
///
/// The credential is taken from the `accessToken` cookie first, then from
/// the `Authorization: Bearer` header. Extraction never mutates state; it
/// only reads and attaches the resolved account projection.
#[derive(Debug, Clone)]
pub struct Authed {
    pub account: AccountView,
}

#[async_trait]
impl FromRequestParts<AppContext> for Authed {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_access_token(&parts.headers)
            .ok_or_else(|| ApiError::Authentication("Unauthorized request".to_string()))?;

        let claims = state.token_service.verify_access(&token)?;

        // The token may outlive the account; re-resolve on every request
        let account = state
            .account_store
            .find_by_id(&claims.sub)
            .await
            .map_err(|_| ApiError::Authentication("Invalid access token".to_string()))?;

        Ok(Authed {
            account: account.into(),
        })
    }
}
