//! Backend entry-point: reads configuration from the environment, builds
//! the outbound adapters, and serves the REST API.

mod server;

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::Key;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::outbound::blobstore::FsBlobStore;
use backend::outbound::persistence::{DbPool, PoolConfig};

use server::ServerConfig;

fn required_env(name: &str) -> std::io::Result<String> {
    env::var(name).map_err(|_| std::io::Error::other(format!("{name} must be set")))
}

fn session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(bytes) => Ok(Key::derive_from(&bytes)),
        Err(e) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %e, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {e}"
                )))
            }
        }
    }
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let key = session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);

    let bind_addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".into())
        .parse()
        .map_err(|e| std::io::Error::other(format!("invalid BIND_ADDR: {e}")))?;

    let database_url = required_env("DATABASE_URL")?;
    let db_pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|e| std::io::Error::other(format!("database pool: {e}")))?;

    let media_root = PathBuf::from(
        env::var("MEDIA_ROOT").unwrap_or_else(|_| "/var/lib/roomfinder/media".into()),
    );
    let public_media_url = required_env("PUBLIC_MEDIA_URL")?;
    let media = FsBlobStore::open(&media_root, &public_media_url)
        .map_err(|e| std::io::Error::other(format!("media store: {e}")))?;

    server::run(ServerConfig::new(
        key,
        cookie_secure,
        bind_addr,
        db_pool,
        media,
    ))
    .await
}
