//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel rows and domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) are implementation details, never exposed to the domain.
//! - **Ownership in the transaction**: mutations lock the listing row with
//!   `SELECT ... FOR UPDATE`, so the ownership check and the write share one
//!   atomic unit.
//! - **Strongly typed errors**: all pool and Diesel errors are mapped to the
//!   domain port error types.

mod diesel_error_mapping;
mod diesel_listing_repository;
mod diesel_login_service;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_listing_repository::DieselListingRepository;
pub use diesel_login_service::DieselLoginService;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
