//! Handlers for account registration, login and the `/auth/user` resource.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use hoshidori_core::error::CoreError;
use hoshidori_core::roles::ROLE_USER;
use hoshidori_core::types::DbId;
use hoshidori_db::models::user::{CreateUser, UpdateUser, UserWithProfile};
use hoshidori_db::models::validators::{blank_or_email, not_blank};
use hoshidori_db::repositories::{is_unique_violation, RoleRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{
    hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH,
};
use crate::error::{AppError, AppResult};
use crate::extract::Json;
use crate::media::{read_form, store_image};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Folder below the media root for profile images.
const PROFILE_IMAGE_FOLDER: &str = "profile_images";

const DUPLICATE_USERNAME: &str = "A user with that username already exists.";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 150), custom(function = "not_blank"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(max = 254), custom(function = "blank_or_email"))]
    pub email: String,
    pub password: String,
}

/// Response of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful authentication response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

/// Public user info embedded in [`LoginResponse`].
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
}

/// Text fields accepted by `PATCH /auth/user`.
#[derive(Debug, Default, Validate)]
struct AccountChanges {
    #[validate(length(max = 150), custom(function = "not_blank"))]
    username: Option<String>,
    #[validate(length(max = 254), custom(function = "blank_or_email"))]
    email: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    input.validate()?;
    validate_password_strength(&input.password, MIN_PASSWORD_LENGTH)
        .map_err(|msg| AppError::field("password", msg))?;

    let username = input.username.trim().to_string();
    if UserRepo::find_by_username(&state.pool, &username).await?.is_some() {
        return Err(AppError::field("username", DUPLICATE_USERNAME));
    }

    let role = RoleRepo::find_by_name(&state.pool, ROLE_USER)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{ROLE_USER}' is not seeded")))?;
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let create = CreateUser {
        username,
        email: input.email.trim().to_string(),
        password_hash,
        role_id: role.id,
    };
    let user = UserRepo::create(&state.pool, &create)
        .await
        .map_err(duplicate_username_or)?;
    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid username or password".into(),
        ))
    };

    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let access_token = generate_access_token(user.id, &role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.config.jwt.expires_in(),
        user: UserInfo {
            id: user.id,
            username: user.username,
            email: user.email,
            role,
        },
    }))
}

/// GET /api/v1/auth/user
pub async fn current_user(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<UserWithProfile>> {
    Ok(Json(load_account(&state, user.user_id).await?))
}

/// PATCH /api/v1/auth/user
///
/// Multipart form with optional `username`, `email` and `profile_image`.
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<UserWithProfile>> {
    let mut form = read_form(multipart).await?;

    let changes = AccountChanges {
        username: form.text("username").map(|s| s.trim().to_string()),
        email: form.text("email").map(|s| s.trim().to_string()),
    };
    changes.validate()?;

    if let Some(username) = changes.username.as_deref() {
        if let Some(existing) = UserRepo::find_by_username(&state.pool, username).await? {
            if existing.id != user.user_id {
                return Err(AppError::field("username", DUPLICATE_USERNAME));
            }
        }
    }

    // Store the file before touching the row so a bad upload changes nothing.
    let image_path = match form.take_file("profile_image") {
        Some(file) => Some(
            store_image(
                &state.config.media_dir,
                PROFILE_IMAGE_FOLDER,
                "profile_image",
                &file,
            )
            .await?,
        ),
        None => None,
    };

    let update = UpdateUser {
        username: changes.username,
        email: changes.email,
    };
    UserRepo::update(&state.pool, user.user_id, &update)
        .await
        .map_err(duplicate_username_or)?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))?;

    if let Some(path) = image_path {
        UserRepo::set_profile_image(&state.pool, user.user_id, &path).await?;
    }
    tracing::info!(user_id = user.user_id, "Account updated");

    Ok(Json(load_account(&state, user.user_id).await?))
}

/// DELETE /api/v1/auth/user
///
/// Viewing logs go with the account; ratings and created works stay with
/// the user reference cleared.
pub async fn delete_user(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    if UserRepo::delete(&state.pool, user.user_id).await? {
        tracing::info!(user_id = user.user_id, "Account deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_account(state: &AppState, user_id: DbId) -> AppResult<UserWithProfile> {
    UserRepo::find_with_profile(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: user_id,
        }))
}

/// A lost race on the username constraint reads like the pre-check did.
fn duplicate_username_or(err: sqlx::Error) -> AppError {
    if is_unique_violation(&err, "uq_users_username") {
        AppError::field("username", DUPLICATE_USERNAME)
    } else {
        AppError::Database(err)
    }
}
