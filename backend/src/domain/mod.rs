//! Domain primitives, ports, and services.
//!
//! Purpose: define strongly typed listing-domain entities together with the
//! ports (repository, blob store, login) and the orchestration service that
//! uses them. Keep types immutable, validate at construction, and document
//! invariants in each type's Rustdoc. Nothing in this module knows about
//! HTTP or SQL.

pub mod auth;
pub mod error;
pub mod listing;
pub mod listing_service;
pub mod ports;
pub mod search;
pub mod user;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::error::{Error, ErrorCode};
pub use self::listing::{
    City, ImageId, Listing, ListingChanges, ListingDraft, ListingId, ListingImage, ListingRecord,
    ListingValidationError, PropertyType, RoomType,
};
pub use self::listing_service::ListingService;
pub use self::search::SearchFilter;
pub use self::user::{User, UserId, Username};

/// Convenient result alias for fallible domain and handler code.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
