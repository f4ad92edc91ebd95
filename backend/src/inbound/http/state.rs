//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{BlobStore, ListingCommands, ListingQueries, LoginService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Mutating listing use-cases.
    pub listings: Arc<dyn ListingCommands>,
    /// Read-only listing use-cases.
    pub listing_queries: Arc<dyn ListingQueries>,
    /// Credential verification port.
    pub login: Arc<dyn LoginService>,
    /// Blob store, used by DTO mapping to render absolute image URLs.
    pub media: Arc<dyn BlobStore>,
}

impl HttpState {
    /// Bundle the port implementations handlers depend on.
    pub fn new(
        listings: Arc<dyn ListingCommands>,
        listing_queries: Arc<dyn ListingQueries>,
        login: Arc<dyn LoginService>,
        media: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            listings,
            listing_queries,
            login,
            media,
        }
    }
}
