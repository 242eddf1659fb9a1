/// Account lifecycle endpoints under /api/v1/users
use crate::{
    account::{
        AccountView, ChangePasswordRequest, LoginRequest, LoginResponse, NewAccount,
        RefreshRequest, RefreshResponse, UpdateProfileRequest, WatchHistoryItem,
    },
    api::{
        middleware::{
            auth_cookie, expired_cookie, extract_refresh_cookie, ACCESS_TOKEN_COOKIE,
            REFRESH_TOKEN_COOKIE,
        },
        response::ApiResponse,
    },
    auth::Authed,
    config::ServiceConfig,
    context::AppContext,
    error::{ApiError, ApiResult},
    media::{MultipartForm, StagedFile},
};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;

/// Build user routes
///
/// Multipart routes carry the larger upload body limit; everything else
/// inherits the global JSON limit.
pub fn routes(service: &ServiceConfig) -> Router<AppContext> {
    let uploads = Router::new()
        .route("/api/v1/users/register", post(register))
        .route("/api/v1/users/avatar", patch(update_avatar))
        .route("/api/v1/users/cover-image", patch(update_cover))
        .layer(DefaultBodyLimit::max(service.upload_limit));

    Router::new()
        .route("/api/v1/users/login", post(login))
        .route("/api/v1/users/logout", post(logout))
        .route("/api/v1/users/refresh-token", post(refresh_token))
        .route("/api/v1/users/change-password", post(change_password))
        .route("/api/v1/users/current-user", get(current_user))
        .route("/api/v1/users/update-account", patch(update_account))
        .route("/api/v1/users/c/:username", get(channel_profile))
        .route("/api/v1/users/history", get(watch_history))
        .merge(uploads)
}

/// Required text fields of the registration form
struct RegisterFields {
    display_name: String,
    email: String,
    username: String,
    password: String,
}

fn parse_register_fields(form: &MultipartForm) -> ApiResult<RegisterFields> {
    let display_name = form.require_text("displayName")?;
    let email = form.require_text("email")?;
    let username = form.require_text("username")?;
    let password = form.require_text("password")?;

    Ok(RegisterFields {
        display_name,
        email,
        username,
        password,
    })
}

/// Register endpoint
///
/// Multipart form: displayName, email, username, password, plus a required
/// `avatar` file and an optional `coverImage` file.
async fn register(
    State(ctx): State<AppContext>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form =
        MultipartForm::stage(&mut multipart, &ctx.config.storage.staging_directory).await?;

    // Validate before anything is uploaded; staged files are cleaned up on
    // every rejection path
    let fields = match parse_register_fields(&form) {
        Ok(fields) => fields,
        Err(e) => {
            form.discard_files().await;
            return Err(e);
        }
    };

    let username = crate::account::normalize_identifier(&fields.username);
    let email = crate::account::normalize_identifier(&fields.email);

    if let Err(e) = ctx.account_store.ensure_available(&username, &email).await {
        form.discard_files().await;
        return Err(e);
    }

    let Some(avatar) = form.take_file("avatar") else {
        form.discard_files().await;
        return Err(ApiError::Validation("Avatar file is required".to_string()));
    };

    // Avatar must yield a usable reference; registration fails without one
    let avatar_url = match ctx.media_store.upload(&avatar).await {
        Ok(upload) => upload.url,
        Err(e) => {
            tracing::warn!("avatar upload failed during registration: {}", e);
            avatar.discard().await;
            form.discard_files().await;
            return Err(ApiError::Validation("Avatar upload failed".to_string()));
        }
    };

    // Cover upload failure is tolerated; the account is created without one
    let cover_image_url = match form.take_file("coverImage") {
        Some(cover) => match ctx.media_store.upload(&cover).await {
            Ok(upload) => Some(upload.url),
            Err(e) => {
                tracing::warn!("cover upload failed during registration: {}", e);
                cover.discard().await;
                None
            }
        },
        None => None,
    };

    let account = ctx
        .account_store
        .create(
            NewAccount {
                username,
                email,
                display_name: fields.display_name,
                avatar_url,
                cover_image_url,
            },
            &fields.password,
        )
        .await?;

    tracing::info!(username = %account.username, "account registered");

    Ok(ApiResponse::created(
        AccountView::from(account),
        "User registered successfully",
    ))
}

/// Login endpoint
///
/// Tokens are delivered twice: as http-only cookies for browser clients and
/// in the body for programmatic ones.
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let identifier = req
        .username
        .as_deref()
        .or(req.email.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("Username or email is required".to_string()))?;

    let account = ctx.account_store.find_by_username_or_email(identifier).await?;

    if !ctx.account_store.verify_password(&account, &req.password).await? {
        return Err(ApiError::Authentication("Invalid credentials".to_string()));
    }

    let access_token = ctx.token_service.issue_access_token(&account)?;
    let refresh_token = ctx.token_service.issue_refresh_token(&account)?;
    ctx.account_store
        .set_refresh_token(&account.id, Some(&refresh_token))
        .await?;

    let auth = &ctx.config.authentication;
    let jar = jar
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            auth.access_token_ttl_secs,
            auth.secure_cookies,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            auth.refresh_token_ttl_secs,
            auth.secure_cookies,
        ));

    tracing::info!(username = %account.username, "login");

    Ok((
        jar,
        ApiResponse::ok(
            LoginResponse {
                user: AccountView::from(account),
                access_token,
                refresh_token,
            },
            "User logged in successfully",
        ),
    ))
}

/// Logout endpoint; clears the stored refresh token and both cookies
async fn logout(
    State(ctx): State<AppContext>,
    authed: Authed,
    jar: CookieJar,
) -> ApiResult<impl IntoResponse> {
    ctx.account_store
        .set_refresh_token(&authed.account.id, None)
        .await?;

    let secure = ctx.config.authentication.secure_cookies;
    let jar = jar
        .add(expired_cookie(ACCESS_TOKEN_COOKIE, secure))
        .add(expired_cookie(REFRESH_TOKEN_COOKIE, secure));

    Ok((jar, ApiResponse::ok((), "User logged out")))
}

/// Refresh endpoint
///
/// Accepts the presented token from the cookie or the body, then runs the
/// rotation protocol: verify, resolve the account, and compare-and-swap the
/// stored token for a fresh one. A superseded token loses the swap and is
/// rejected.
async fn refresh_token(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> ApiResult<impl IntoResponse> {
    let presented = extract_refresh_cookie(&headers)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .ok_or_else(|| ApiError::Authentication("Refresh token is required".to_string()))?;

    let claims = ctx.token_service.verify_refresh(&presented)?;

    let account = ctx
        .account_store
        .find_by_id(&claims.sub)
        .await
        .map_err(|_| ApiError::Authentication("Invalid refresh token".to_string()))?;

    let access_token = ctx.token_service.issue_access_token(&account)?;
    let refresh_token = ctx.token_service.issue_refresh_token(&account)?;

    let rotated = ctx
        .account_store
        .rotate_refresh_token(&account.id, &presented, &refresh_token)
        .await?;
    if !rotated {
        return Err(ApiError::Authentication(
            "Refresh token is expired or has been used".to_string(),
        ));
    }

    let auth = &ctx.config.authentication;
    let jar = jar
        .add(auth_cookie(
            ACCESS_TOKEN_COOKIE,
            access_token.clone(),
            auth.access_token_ttl_secs,
            auth.secure_cookies,
        ))
        .add(auth_cookie(
            REFRESH_TOKEN_COOKIE,
            refresh_token.clone(),
            auth.refresh_token_ttl_secs,
            auth.secure_cookies,
        ));

    Ok((
        jar,
        ApiResponse::ok(
            RefreshResponse {
                access_token,
                refresh_token,
            },
            "Access token refreshed",
        ),
    ))
}

/// Change password endpoint
async fn change_password(
    State(ctx): State<AppContext>,
    authed: Authed,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = ctx.account_store.find_by_id(&authed.account.id).await?;

    if !ctx
        .account_store
        .verify_password(&account, &req.old_password)
        .await?
    {
        return Err(ApiError::Validation("Old password is incorrect".to_string()));
    }

    ctx.account_store
        .update_password(&account.id, &req.new_password)
        .await?;

    Ok(ApiResponse::ok((), "Password changed successfully"))
}

/// Current user endpoint; returns the already-resolved session account
async fn current_user(authed: Authed) -> ApiResult<impl IntoResponse> {
    Ok(ApiResponse::ok(authed.account, "Current user fetched"))
}

/// Update display name and email; both fields are required
async fn update_account(
    State(ctx): State<AppContext>,
    authed: Authed,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let display_name = req
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let email = req.email.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let (Some(display_name), Some(email)) = (display_name, email) else {
        return Err(ApiError::Validation(
            "Display name and email are required".to_string(),
        ));
    };

    let account = ctx
        .account_store
        .update_profile(&authed.account.id, display_name, email)
        .await?;

    Ok(ApiResponse::ok(
        AccountView::from(account),
        "Account details updated",
    ))
}

/// Pull the single expected file out of a staged form
async fn take_single_file(
    form: &mut MultipartForm,
    field: &str,
    missing_message: &str,
) -> ApiResult<StagedFile> {
    match form.take_file(field) {
        Some(staged) => {
            form.discard_files().await;
            Ok(staged)
        }
        None => {
            form.discard_files().await;
            Err(ApiError::Validation(missing_message.to_string()))
        }
    }
}

/// Update avatar endpoint; single `avatar` file
async fn update_avatar(
    State(ctx): State<AppContext>,
    authed: Authed,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form =
        MultipartForm::stage(&mut multipart, &ctx.config.storage.staging_directory).await?;
    let staged = take_single_file(&mut form, "avatar", "Avatar file is required").await?;

    let upload = match ctx.media_store.upload(&staged).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::warn!("avatar upload failed: {}", e);
            staged.discard().await;
            return Err(ApiError::Validation("Avatar upload failed".to_string()));
        }
    };

    let account = ctx
        .account_store
        .update_avatar(&authed.account.id, &upload.url)
        .await?;

    Ok(ApiResponse::ok(
        AccountView::from(account),
        "Avatar updated",
    ))
}

/// Update cover image endpoint; single `coverImage` file
async fn update_cover(
    State(ctx): State<AppContext>,
    authed: Authed,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut form =
        MultipartForm::stage(&mut multipart, &ctx.config.storage.staging_directory).await?;
    let staged = take_single_file(&mut form, "coverImage", "Cover image file is required").await?;

    let upload = match ctx.media_store.upload(&staged).await {
        Ok(upload) => upload,
        Err(e) => {
            tracing::warn!("cover upload failed: {}", e);
            staged.discard().await;
            return Err(ApiError::Validation("Cover image upload failed".to_string()));
        }
    };

    let account = ctx
        .account_store
        .update_cover(&authed.account.id, &upload.url)
        .await?;

    Ok(ApiResponse::ok(
        AccountView::from(account),
        "Cover image updated",
    ))
}

/// Channel profile endpoint; aggregates subscriptions relative to the viewer
async fn channel_profile(
    State(ctx): State<AppContext>,
    authed: Authed,
    Path(username): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = ctx.channels.profile(&username, &authed.account.id).await?;

    Ok(ApiResponse::ok(profile, "Channel profile fetched"))
}

/// Watch history endpoint; ordered content references for the session account
async fn watch_history(
    State(ctx): State<AppContext>,
    authed: Authed,
) -> ApiResult<impl IntoResponse> {
    let items: Vec<WatchHistoryItem> = ctx
        .account_store
        .watch_history(&authed.account.id)
        .await?
        .into_iter()
        .map(|entry| WatchHistoryItem {
            content_id: entry.content_id,
            watched_at: entry.watched_at,
        })
        .collect();

    Ok(ApiResponse::ok(items, "Watch history fetched"))
}
