//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for
//! the REST API: every HTTP endpoint from the inbound layer, the DTO
//! schemas, and the session-cookie security scheme. Swagger UI serves the
//! document in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::listings::{
    CreateListingRequestBody, GalleryImageBody, GalleryWarningBody, ImageUploadBody,
    ListingDetailResponseBody, ListingMutationResponseBody, ListingResponseBody,
    UpdateListingRequestBody,
};
use crate::inbound::http::users::{CurrentUserBody, LoginRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Room listing backend API",
        description = "HTTP interface for browsing, searching, and managing rental listings."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::listings::list_listings,
        crate::inbound::http::listings::get_listing,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::update_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::listings::my_listings,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ImageUploadBody,
        CreateListingRequestBody,
        UpdateListingRequestBody,
        ListingResponseBody,
        GalleryImageBody,
        GalleryWarningBody,
        ListingDetailResponseBody,
        ListingMutationResponseBody,
        LoginRequest,
        CurrentUserBody,
    ))
)]
pub struct ApiDoc;
