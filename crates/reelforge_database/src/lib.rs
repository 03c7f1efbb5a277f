//! Story persistence for Reelforge.
//!
//! [`InMemoryStore`] keeps everything in process and applies each multi-record
//! write as a single all-or-nothing transaction. With the `postgres` feature,
//! [`PostgresStore`] provides the same contracts over Diesel.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod memory;
mod snapshot;

#[cfg(feature = "postgres")]
mod connection;
#[cfg(feature = "postgres")]
mod models;
#[cfg(feature = "postgres")]
pub mod schema;
#[cfg(feature = "postgres")]
mod postgres;

pub use memory::InMemoryStore;
pub use snapshot::StoreSnapshot;

#[cfg(feature = "postgres")]
pub use connection::{PgPool, establish_pool, run_migrations};
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
