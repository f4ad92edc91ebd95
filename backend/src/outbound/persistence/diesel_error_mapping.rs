//! Shared pool and Diesel error mapping for the persistence adapters.

use tracing::debug;

use crate::domain::ports::{ListingRepositoryError, UserPersistenceError};

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map common Diesel error variants into query/connection constructors.
pub fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: Fn(&'static str) -> E,
    C: Fn(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::QueryBuilderError(_) => query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection error")
        }
        DieselError::DatabaseError(_, _) => query("database error"),
        _ => query("database error"),
    }
}

impl From<diesel::result::Error> for ListingRepositoryError {
    fn from(error: diesel::result::Error) -> Self {
        map_diesel_error(error, Self::query, Self::connection)
    }
}

impl From<PoolError> for ListingRepositoryError {
    fn from(error: PoolError) -> Self {
        map_pool_error(error, Self::connection)
    }
}

impl From<diesel::result::Error> for UserPersistenceError {
    fn from(error: diesel::result::Error) -> Self {
        map_diesel_error(error, Self::query, Self::connection)
    }
}

impl From<PoolError> for UserPersistenceError {
    fn from(error: PoolError) -> Self {
        map_pool_error(error, Self::connection)
    }
}
