//! Server construction and middleware wiring.
//!
//! Binary-side module: assembles the Actix application from the library's
//! handlers, the cookie-session middleware, and the outbound adapters
//! selected by [`ServerConfig`].

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::SameSite;
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use backend::ApiDoc;
use backend::domain::ListingService;
use backend::inbound::http::health::{HealthState, live, ready};
use backend::inbound::http::listings::{
    create_listing, delete_listing, get_listing, list_listings, my_listings, update_listing,
};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::users::{current_user, login, logout};
use backend::outbound::persistence::{
    DieselListingRepository, DieselLoginService, DieselUserRepository,
};

/// JSON payload ceiling: twelve 5 MiB gallery images plus base64 overhead.
const MAX_JSON_PAYLOAD_BYTES: usize = 96 * 1024 * 1024;

/// Build the HTTP handler state from the configured adapters.
fn build_http_state(config: &ServerConfig) -> HttpState {
    let repository = Arc::new(DieselListingRepository::new(config.db_pool.clone()));
    let media = Arc::new(config.media.clone());
    let service = Arc::new(ListingService::new(repository, Arc::clone(&media)));
    let login_service = Arc::new(DieselLoginService::new(DieselUserRepository::new(
        config.db_pool.clone(),
    )));

    HttpState::new(
        service.clone(),
        service,
        login_service,
        media as Arc<dyn backend::domain::ports::BlobStore>,
    )
}

/// Run the HTTP server until shutdown.
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let http_state = web::Data::new(build_http_state(&config));
    let health_state = web::Data::new(HealthState::new());
    // Clone for the server factory so the readiness probe stays reachable.
    let server_health_state = health_state.clone();
    let key = config.key.clone();
    let cookie_secure = config.cookie_secure;

    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        let api = web::scope("/api/v1")
            .wrap(session)
            .service(login)
            .service(logout)
            .service(current_user)
            .service(list_listings)
            .service(get_listing)
            .service(create_listing)
            .service(update_listing)
            .service(delete_listing)
            .service(my_listings);

        let app = App::new()
            .app_data(http_state.clone())
            .app_data(server_health_state.clone())
            .app_data(web::JsonConfig::default().limit(MAX_JSON_PAYLOAD_BYTES))
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        let app = app
            .service(SwaggerUi::new("/docs/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()));

        app
    })
    .bind(config.bind_addr)?;

    health_state.mark_ready();
    server.run().await
}
