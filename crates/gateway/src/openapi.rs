//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::handlers::auth_handler::RegisterRequest;
use crate::handlers::user_handler::{UpdateIdentifiersRequest, UpdateProfileRequest};
use domain::{AccountResponse, Presence, PresenceStatus, UserFlags};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::auth_handler::register,
        crate::handlers::user_handler::get_user,
        crate::handlers::user_handler::get_user_by_email,
        crate::handlers::user_handler::get_user_by_handle,
        crate::handlers::user_handler::update_profile,
        crate::handlers::user_handler::update_identifiers,
        crate::handlers::user_handler::delete_user,
    ),
    components(
        schemas(
            RegisterRequest,
            UpdateProfileRequest,
            UpdateIdentifiersRequest,
            AccountResponse,
            Presence,
            PresenceStatus,
            UserFlags,
        )
    ),
    tags(
        (name = "Authentication", description = "Account registration"),
        (name = "Users", description = "Account lookup and management"),
    )
)]
pub struct ApiDoc;
