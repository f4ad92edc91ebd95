//! Room-listing backend library modules.
//!
//! The crate is organised hexagonally: [`domain`] holds entities, ports, and
//! the listing service; [`inbound`] adapts HTTP requests onto the domain
//! driving ports; [`outbound`] implements the driven ports against
//! PostgreSQL and blob storage.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
