//! Diesel-backed `LoginService` adapter built on `DieselUserRepository`.
//!
//! Credential verification belongs to the external identity provider; this
//! adapter preserves the fixture login contract while guaranteeing that the
//! authenticated identity has a `users` row for listings to reference.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{LoginService, UserRepository};
use crate::domain::user::{User, UserId, Username};
use crate::domain::{Error, LoginCredentials};

#[cfg(test)]
use crate::domain::ports::UserPersistenceError;

use super::diesel_user_repository::DieselUserRepository;

const FIXTURE_USERNAME: &str = "admin";
const FIXTURE_PASSWORD: &str = "password";
const FIXTURE_USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn map_user_persistence_error(error: crate::domain::ports::UserPersistenceError) -> Error {
    use crate::domain::ports::UserPersistenceError as E;
    match error {
        E::Connection { message } => Error::service_unavailable(message),
        E::Query { message } => Error::internal(message),
    }
}

/// Diesel-backed `LoginService` that preserves fixture-authentication
/// semantics.
#[derive(Clone)]
pub struct DieselLoginService {
    user_repository: Arc<dyn UserRepository>,
}

impl DieselLoginService {
    /// Create a new service backed by a Diesel user repository.
    pub fn new(user_repository: DieselUserRepository) -> Self {
        Self {
            user_repository: Arc::new(user_repository),
        }
    }

    #[cfg(test)]
    fn from_repository(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }

    async fn ensure_user_exists(&self, user_id: &UserId, username: &str) -> Result<(), Error> {
        let existing = self
            .user_repository
            .find_by_id(user_id)
            .await
            .map_err(map_user_persistence_error)?;

        if existing.is_some() {
            return Ok(());
        }

        let username = Username::new(username)
            .map_err(|err| Error::internal(format!("invalid fixture username: {err}")))?;
        let user = User::new(*user_id, username);

        self.user_repository
            .upsert(&user)
            .await
            .map_err(map_user_persistence_error)
    }
}

fn fixture_user_id() -> Result<UserId, Error> {
    UserId::new(FIXTURE_USER_ID)
        .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))
}

#[async_trait]
impl LoginService for DieselLoginService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        if credentials.username() != FIXTURE_USERNAME
            || credentials.password() != FIXTURE_PASSWORD
        {
            return Err(Error::unauthorized("invalid credentials"));
        }

        let user_id = fixture_user_id()?;
        self.ensure_user_exists(&user_id, FIXTURE_USERNAME).await?;
        Ok(user_id)
    }
}
