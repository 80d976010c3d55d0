//! Registration handler.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use common::{AppError, AppResult};
use domain::{AccountDraft, AccountResponse, Password, PasswordCredential};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Account registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Login email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "neo@strafe.chat")]
    pub email: String,
    /// Plain-text password, hashed before it reaches the directory
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    #[schema(example = "SecurePass123!", min_length = 8, max_length = 128)]
    pub password: String,
    /// Handle name
    #[validate(length(min = 1, max = 32, message = "Username must be 1 to 32 characters"))]
    #[schema(example = "neo")]
    pub username: String,
    /// Four-digit suffix; assigned by the directory when omitted
    #[schema(example = "0001")]
    pub discriminator: Option<String>,
    #[schema(example = "Neo")]
    pub display_name: Option<String>,
    #[schema(example = "1990-01-01")]
    pub date_of_birth: NaiveDate,
    #[schema(example = "en-US")]
    pub locale: Option<String>,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/register", post(register))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email or handle already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let RegisterRequest {
        email,
        password,
        username,
        discriminator,
        display_name,
        date_of_birth,
        locale,
    } = payload;

    // Argon2 is CPU bound
    let hash = tokio::task::spawn_blocking(move || Password::new(&password))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))??;

    let draft = AccountDraft {
        email,
        username,
        discriminator,
        password: PasswordCredential::new(hash.into_string()),
        display_name,
        date_of_birth,
        locale,
    };

    let account = state.directory.create_account(draft).await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}
