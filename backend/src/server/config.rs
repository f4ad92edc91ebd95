//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::cookie::Key;
use backend::outbound::blobstore::FsBlobStore;
use backend::outbound::persistence::DbPool;

/// Configuration bundle for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) media: FsBlobStore,
}

impl ServerConfig {
    /// Assemble a server configuration from its parts.
    pub fn new(
        key: Key,
        cookie_secure: bool,
        bind_addr: SocketAddr,
        db_pool: DbPool,
        media: FsBlobStore,
    ) -> Self {
        Self {
            key,
            cookie_secure,
            bind_addr,
            db_pool,
            media,
        }
    }
}
