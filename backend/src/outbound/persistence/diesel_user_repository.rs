//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::user::{User, UserId};

use super::models::{NewUserRow, UserRow, user_from_row};
use super::pool::DbPool;
use super::schema::users;

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await?;
        let new_row = NewUserRow {
            id: *user.id().as_uuid(),
            username: user.username().as_str(),
        };

        diesel::insert_into(users::table)
            .values(&new_row)
            .on_conflict(users::id)
            .do_update()
            .set((
                users::username.eq(excluded(users::username)),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await?;
        let row = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()?;
        row.map(user_from_row).transpose()
    }
}
