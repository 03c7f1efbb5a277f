//! PostgreSQL connection pooling and migrations.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use reelforge_error::{DatabaseError, DatabaseErrorKind};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Pool of PostgreSQL connections.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool.
///
/// Uses `database_url` when given, otherwise the `DATABASE_URL` environment variable.
///
/// # Errors
///
/// Returns an error if no URL is available or the pool cannot connect.
pub fn establish_pool(database_url: Option<&str>) -> Result<PgPool, DatabaseError> {
    let url = match database_url {
        Some(url) => url.to_string(),
        None => std::env::var("DATABASE_URL").map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Connection(
                "DATABASE_URL environment variable not set".to_string(),
            ))
        })?,
    };

    Pool::builder()
        .build(ConnectionManager::<PgConnection>::new(url))
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))
}

/// Apply pending schema migrations.
pub fn run_migrations(conn: &mut PgConnection) -> Result<(), DatabaseError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|applied| tracing::info!(count = applied.len(), "Applied migrations"))
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Migration(e.to_string())))
}
