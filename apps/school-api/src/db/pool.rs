use diesel_async::pooled_connection::deadpool::{BuildError, Pool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

pub type DbPool = Pool<AsyncPgConnection>;

/// Build the chat store's connection pool.
///
/// Connections are opened on first use, so a bad URL only surfaces when the
/// first query runs.
pub fn connect(database_url: &str, max_connections: usize) -> Result<DbPool, BuildError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool = Pool::builder(manager).max_size(max_connections).build()?;

    tracing::info!(max_connections, "database pool created");

    Ok(pool)
}
