//! Account lookup and mutation handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use common::AppResult;
use domain::{AccountResponse, IdentifierChange, Presence, ProfilePatch, UserFlags};

use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// Partial profile update. Omitted fields are unchanged; an empty string
/// clears an optional field.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 32, message = "Display name cannot exceed 32 characters"))]
    #[schema(example = "The One")]
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    #[validate(length(max = 190, message = "Bio cannot exceed 190 characters"))]
    pub bio: Option<String>,
    #[validate(length(max = 190, message = "About me cannot exceed 190 characters"))]
    pub about_me: Option<String>,
    #[schema(example = "#5865F2")]
    pub accent_color: Option<String>,
    #[schema(example = "en-GB")]
    pub locale: Option<String>,
    pub presence: Option<Presence>,
    /// Badge bitset; unknown bits are dropped
    #[schema(example = 1)]
    pub flags: Option<u32>,
}

impl From<UpdateProfileRequest> for ProfilePatch {
    fn from(req: UpdateProfileRequest) -> Self {
        Self {
            display_name: req.display_name,
            avatar: req.avatar,
            banner: req.banner,
            bio: req.bio,
            about_me: req.about_me,
            accent_color: req.accent_color,
            locale: req.locale,
            presence: req.presence,
            flags: req.flags.map(UserFlags::from_bits_truncate),
        }
    }
}

/// Identifier change request. At least one field must be present.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateIdentifiersRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "thomas@strafe.chat")]
    pub email: Option<String>,
    #[schema(example = "anderson")]
    pub username: Option<String>,
    #[schema(example = "0042")]
    pub discriminator: Option<String>,
}

impl From<UpdateIdentifiersRequest> for IdentifierChange {
    fn from(req: UpdateIdentifiersRequest) -> Self {
        Self {
            email: req.email,
            username: req.username,
            discriminator: req.discriminator,
        }
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/:id",
            get(get_user).patch(update_profile).delete(delete_user),
        )
        .route("/:id/identifiers", patch(update_identifiers))
        .route("/by-email/:email", get(get_user_by_email))
        .route("/by-handle/:username/:discriminator", get(get_user_by_handle))
}

/// Get account by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.directory.get_by_id(id).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Get account by email
#[utoipa::path(
    get,
    path = "/users/by-email/{email}",
    tag = "Users",
    params(
        ("email" = String, Path, description = "Email address, matched case-insensitively")
    ),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 400, description = "Malformed email"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.directory.get_by_email(&email).await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Get account by handle
#[utoipa::path(
    get,
    path = "/users/by-handle/{username}/{discriminator}",
    tag = "Users",
    params(
        ("username" = String, Path, description = "Handle name"),
        ("discriminator" = String, Path, description = "Four-digit suffix")
    ),
    responses(
        (status = 200, description = "Account", body = AccountResponse),
        (status = 400, description = "Malformed handle"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_user_by_handle(
    State(state): State<AppState>,
    Path((username, discriminator)): Path<(String, String)>,
) -> AppResult<Json<AccountResponse>> {
    let account = state
        .directory
        .get_by_handle(&username, &discriminator)
        .await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Update profile fields
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = AccountResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<AccountResponse>> {
    let account = state
        .directory
        .update_profile(id, ProfilePatch::from(payload))
        .await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Change email and/or handle
#[utoipa::path(
    patch,
    path = "/users/{id}/identifiers",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = UpdateIdentifiersRequest,
    responses(
        (status = 200, description = "Identifiers updated", body = AccountResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Account not found"),
        (status = 409, description = "Email or handle already taken")
    )
)]
pub async fn update_identifiers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateIdentifiersRequest>,
) -> AppResult<Json<AccountResponse>> {
    let account = state
        .directory
        .update_identifiers(id, IdentifierChange::from(payload))
        .await?;
    Ok(Json(AccountResponse::from(account)))
}

/// Delete an account and release its identifiers
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.directory.delete_account(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
