//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the feed's driven ports backed by PostgreSQL
//! via `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: implementations only translate between Diesel rows
//!   and domain types. Ordering, scoring and paging live in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Bounded aggregation**: grouped engagement queries are always filtered
//!   to an explicit identifier list.
//! - **Strongly typed errors**: pool and Diesel failures map to each port's
//!   `Connection`/`Query` variants.
//!
//! # Example
//!
//! ```no_run
//! use feed_backend::outbound::persistence::{DbPool, DieselContentCatalogue, PoolConfig};
//!
//! # async fn wire() -> Result<(), feed_backend::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/feed")).await?;
//! let catalogue = DieselContentCatalogue::new(pool);
//! # let _ = catalogue;
//! # Ok(())
//! # }
//! ```

mod diesel_content_catalogue;
mod diesel_engagement_repository;
mod diesel_engagement_statistics;
pub(crate) mod diesel_helpers;
mod engagement_aggregates;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_content_catalogue::DieselContentCatalogue;
pub use diesel_engagement_repository::DieselEngagementRepository;
pub use diesel_engagement_statistics::DieselEngagementStatistics;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
