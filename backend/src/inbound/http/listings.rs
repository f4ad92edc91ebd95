//! Listing HTTP handlers.
//!
//! ```text
//! GET    /api/v1/listings?q=&propertyType=   list/search (public)
//! GET    /api/v1/listings/{id}               detail with gallery (public)
//! POST   /api/v1/listings                    create (session required)
//! PUT    /api/v1/listings/{id}               update (owner only)
//! DELETE /api/v1/listings/{id}               delete (owner only)
//! GET    /api/v1/my/listings                 owner dashboard (session required)
//! ```
//!
//! Image bytes travel base64-encoded inside the JSON payload; responses
//! carry absolute public URLs rendered through the blob store.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::listing::{ImageId, Listing, ListingChanges, ListingDraft, ListingId, ListingImage};
use crate::domain::ports::{
    BlobStore, CreateListingRequest, GalleryWarning, ImageBlob, ListingDetail,
    ListingMutationOutcome, UpdateListingRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, decode_base64, parse_city, parse_date, parse_price, parse_property_type,
    parse_room_type,
};

/// One image in an upload payload, base64-encoded.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUploadBody {
    /// Client-suggested file name.
    pub file_name: String,
    /// Base64-encoded image bytes.
    pub content: String,
}

/// Request payload for creating a listing.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequestBody {
    /// Property type wire spelling (`Room`, `Apartment`, `Hostel`).
    pub property_type: String,
    /// Listing headline.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Monthly rent.
    pub price: i64,
    /// City wire spelling.
    pub location: String,
    /// Room type wire spelling (`Single`, …, `1BHK`, `2BHK`, `3BHK`).
    pub room_type: String,
    /// Contact display name.
    pub owner_name: String,
    /// Contact phone number.
    pub contact_number: String,
    /// First availability date, `YYYY-MM-DD`.
    pub available_from: String,
    /// Optional cover photo.
    pub cover_image: Option<ImageUploadBody>,
    /// Gallery photos, in submission order.
    #[serde(default)]
    pub images: Vec<ImageUploadBody>,
}

/// Request payload for updating a listing; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequestBody {
    /// Replacement property type.
    pub property_type: Option<String>,
    /// Replacement headline.
    pub title: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement rent.
    pub price: Option<i64>,
    /// Replacement city.
    pub location: Option<String>,
    /// Replacement room type.
    pub room_type: Option<String>,
    /// Replacement contact display name.
    pub owner_name: Option<String>,
    /// Replacement contact number.
    pub contact_number: Option<String>,
    /// Replacement availability date, `YYYY-MM-DD`.
    pub available_from: Option<String>,
    /// Replacement cover photo.
    pub cover_image: Option<ImageUploadBody>,
    /// Gallery photos to add.
    #[serde(default)]
    pub new_images: Vec<ImageUploadBody>,
    /// Gallery image ids to remove; ids from other listings are ignored.
    #[serde(default)]
    pub delete_image_ids: Vec<i64>,
}

/// Query parameters for the list/search endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSearchQuery {
    /// Free-text query; blank or the literal `None` means no text filter.
    pub q: Option<String>,
    /// Property type wire spelling.
    pub property_type: Option<String>,
}

/// One listing in a response payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponseBody {
    /// System-assigned identifier.
    pub id: i64,
    /// Owning identity.
    pub owner_id: String,
    /// Property type wire spelling.
    pub property_type: String,
    /// Listing headline.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Monthly rent.
    pub price: u32,
    /// City wire spelling.
    pub location: String,
    /// Room type wire spelling.
    pub room_type: String,
    /// Contact display name.
    pub owner_name: String,
    /// Contact phone number.
    pub contact_number: String,
    /// First availability date, `YYYY-MM-DD`.
    pub available_from: String,
    /// Absolute URL of the cover photo, when one is set.
    pub cover_image_url: Option<String>,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

/// One gallery image in a response payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageBody {
    /// System-assigned identifier, used for deletion on update.
    pub id: i64,
    /// Absolute public URL.
    pub url: String,
}

/// One skipped upload in a mutation response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GalleryWarningBody {
    /// Client-suggested name of the skipped image.
    pub file_name: String,
    /// Why the upload was skipped.
    pub reason: String,
}

/// Response payload for a listing detail request.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingDetailResponseBody {
    /// The listing.
    pub listing: ListingResponseBody,
    /// Gallery images in submission order.
    pub images: Vec<GalleryImageBody>,
}

/// Response payload for create and update requests.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListingMutationResponseBody {
    /// The listing after the mutation.
    pub listing: ListingResponseBody,
    /// Final gallery state.
    pub images: Vec<GalleryImageBody>,
    /// Uploads that were skipped; the mutation itself succeeded.
    pub warnings: Vec<GalleryWarningBody>,
}

fn listing_body(listing: &Listing, media: &dyn BlobStore) -> ListingResponseBody {
    ListingResponseBody {
        id: listing.id().get(),
        owner_id: listing.owner().to_string(),
        property_type: listing.property_type().as_str().to_owned(),
        title: listing.title().to_owned(),
        description: listing.description().to_owned(),
        price: listing.price(),
        location: listing.location().as_str().to_owned(),
        room_type: listing.room_type().as_str().to_owned(),
        owner_name: listing.owner_name().to_owned(),
        contact_number: listing.contact_number().to_owned(),
        available_from: listing.available_from().format("%Y-%m-%d").to_string(),
        cover_image_url: listing.cover_image().map(|handle| media.url_for(handle)),
        created_at: listing.created_at().to_rfc3339(),
    }
}

fn gallery_bodies(images: &[ListingImage], media: &dyn BlobStore) -> Vec<GalleryImageBody> {
    images
        .iter()
        .map(|image| GalleryImageBody {
            id: image.id().get(),
            url: media.url_for(image.blob()),
        })
        .collect()
}

fn warning_bodies(warnings: Vec<GalleryWarning>) -> Vec<GalleryWarningBody> {
    warnings
        .into_iter()
        .map(|warning| GalleryWarningBody {
            file_name: warning.file_name,
            reason: warning.reason,
        })
        .collect()
}

fn mutation_body(outcome: ListingMutationOutcome, media: &dyn BlobStore) -> ListingMutationResponseBody {
    ListingMutationResponseBody {
        listing: listing_body(&outcome.listing, media),
        images: gallery_bodies(&outcome.images, media),
        warnings: warning_bodies(outcome.warnings),
    }
}

fn parse_image(body: ImageUploadBody) -> ApiResult<ImageBlob> {
    let bytes = decode_base64(&body.content, FieldName::new("images"))?;
    Ok(ImageBlob {
        file_name: body.file_name,
        bytes,
    })
}

fn parse_images(bodies: Vec<ImageUploadBody>) -> ApiResult<Vec<ImageBlob>> {
    bodies.into_iter().map(parse_image).collect()
}

fn parse_draft(payload: CreateListingRequestBody) -> ApiResult<(ListingDraft, Option<ImageBlob>, Vec<ImageBlob>)> {
    let draft = ListingDraft {
        property_type: parse_property_type(&payload.property_type, FieldName::new("propertyType"))?,
        title: payload.title,
        description: payload.description,
        price: parse_price(payload.price, FieldName::new("price"))?,
        location: parse_city(&payload.location, FieldName::new("location"))?,
        room_type: parse_room_type(&payload.room_type, FieldName::new("roomType"))?,
        owner_name: payload.owner_name,
        contact_number: payload.contact_number,
        available_from: parse_date(&payload.available_from, FieldName::new("availableFrom"))?,
    };
    let cover = payload.cover_image.map(parse_image).transpose()?;
    let images = parse_images(payload.images)?;
    Ok((draft, cover, images))
}

fn parse_changes(payload: UpdateListingRequestBody) -> ApiResult<UpdateListingRequest> {
    let changes = ListingChanges {
        property_type: payload
            .property_type
            .as_deref()
            .map(|value| parse_property_type(value, FieldName::new("propertyType")))
            .transpose()?,
        title: payload.title,
        description: payload.description,
        price: payload
            .price
            .map(|value| parse_price(value, FieldName::new("price")))
            .transpose()?,
        location: payload
            .location
            .as_deref()
            .map(|value| parse_city(value, FieldName::new("location")))
            .transpose()?,
        room_type: payload
            .room_type
            .as_deref()
            .map(|value| parse_room_type(value, FieldName::new("roomType")))
            .transpose()?,
        owner_name: payload.owner_name,
        contact_number: payload.contact_number,
        available_from: payload
            .available_from
            .as_deref()
            .map(|value| parse_date(value, FieldName::new("availableFrom")))
            .transpose()?,
        cover_image: None,
    };
    let cover_image = payload.cover_image.map(parse_image).transpose()?;
    let new_images = parse_images(payload.new_images)?;
    let delete_image_ids = payload
        .delete_image_ids
        .into_iter()
        .map(ImageId::new)
        .collect();
    Ok(UpdateListingRequest {
        changes,
        cover_image,
        new_images,
        delete_image_ids,
    })
}

/// List and search listings; public.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(
        ("q" = Option<String>, Query, description = "Free-text query across title, location, property type, and room type"),
        ("propertyType" = Option<String>, Query, description = "Exact property type filter")
    ),
    responses(
        (status = 200, description = "Matching listings, newest first", body = [ListingResponseBody]),
        (status = 400, description = "Invalid filter", body = crate::domain::Error)
    ),
    tags = ["listings"],
    operation_id = "listListings",
    security([])
)]
#[get("/listings")]
pub async fn list_listings(
    state: web::Data<HttpState>,
    query: web::Query<ListingSearchQuery>,
) -> ApiResult<web::Json<Vec<ListingResponseBody>>> {
    let ListingSearchQuery { q, property_type } = query.into_inner();
    let property_type = property_type
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_property_type(value, FieldName::new("propertyType")))
        .transpose()?;

    let listings = state
        .listing_queries
        .search_listings(q.as_deref(), property_type)
        .await?;
    let bodies = listings
        .iter()
        .map(|listing| listing_body(listing, state.media.as_ref()))
        .collect();
    Ok(web::Json(bodies))
}

/// Fetch a single listing with its gallery; public.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = i64, Path, description = "Listing id")),
    responses(
        (status = 200, description = "The listing", body = ListingDetailResponseBody),
        (status = 404, description = "No such listing", body = crate::domain::Error)
    ),
    tags = ["listings"],
    operation_id = "getListing",
    security([])
)]
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    path: web::Path<i64>,
) -> ApiResult<web::Json<ListingDetailResponseBody>> {
    let id = ListingId::new(path.into_inner());
    let ListingDetail { listing, images } = state.listing_queries.get_listing(id).await?;
    Ok(web::Json(ListingDetailResponseBody {
        listing: listing_body(&listing, state.media.as_ref()),
        images: gallery_bodies(&images, state.media.as_ref()),
    }))
}

/// Create a listing owned by the authenticated user.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = CreateListingRequestBody,
    responses(
        (status = 201, description = "Listing created", body = ListingMutationResponseBody),
        (status = 400, description = "Invalid fields", body = crate::domain::Error),
        (status = 401, description = "Login required", body = crate::domain::Error)
    ),
    tags = ["listings"],
    operation_id = "createListing",
    security(("SessionCookie" = []))
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateListingRequestBody>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (draft, cover_image, images) = parse_draft(payload.into_inner())?;

    let outcome = state
        .listings
        .create_listing(
            &actor,
            CreateListingRequest {
                draft,
                cover_image,
                images,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(mutation_body(outcome, state.media.as_ref())))
}

/// Update the authenticated owner's listing.
#[utoipa::path(
    put,
    path = "/api/v1/listings/{id}",
    params(("id" = i64, Path, description = "Listing id")),
    request_body = UpdateListingRequestBody,
    responses(
        (status = 200, description = "Listing updated", body = ListingMutationResponseBody),
        (status = 400, description = "Invalid fields", body = crate::domain::Error),
        (status = 401, description = "Login required", body = crate::domain::Error),
        (status = 403, description = "Not the owner", body = crate::domain::Error),
        (status = 404, description = "No such listing", body = crate::domain::Error)
    ),
    tags = ["listings"],
    operation_id = "updateListing",
    security(("SessionCookie" = []))
)]
#[put("/listings/{id}")]
pub async fn update_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
    payload: web::Json<UpdateListingRequestBody>,
) -> ApiResult<web::Json<ListingMutationResponseBody>> {
    let actor = session.require_user_id()?;
    let id = ListingId::new(path.into_inner());
    let request = parse_changes(payload.into_inner())?;

    let outcome = state.listings.update_listing(&actor, id, request).await?;
    Ok(web::Json(mutation_body(outcome, state.media.as_ref())))
}

/// Delete the authenticated owner's listing, cascading its gallery.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = i64, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Listing deleted"),
        (status = 401, description = "Login required", body = crate::domain::Error),
        (status = 403, description = "Not the owner", body = crate::domain::Error),
        (status = 404, description = "No such listing", body = crate::domain::Error)
    ),
    tags = ["listings"],
    operation_id = "deleteListing",
    security(("SessionCookie" = []))
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let id = ListingId::new(path.into_inner());
    state.listings.delete_listing(&actor, id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// The authenticated owner's listings, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/my/listings",
    responses(
        (status = 200, description = "The caller's listings", body = [ListingResponseBody]),
        (status = 401, description = "Login required", body = crate::domain::Error)
    ),
    tags = ["listings"],
    operation_id = "myListings",
    security(("SessionCookie" = []))
)]
#[get("/my/listings")]
pub async fn my_listings(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ListingResponseBody>>> {
    let owner = session.require_user_id()?;
    let listings = state.listing_queries.listings_for_owner(&owner).await?;
    let bodies = listings
        .iter()
        .map(|listing| listing_body(listing, state.media.as_ref()))
        .collect();
    Ok(web::Json(bodies))
}

#[cfg(test)]
#[path = "listings_tests.rs"]
mod tests;
