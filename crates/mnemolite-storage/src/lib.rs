//! Storage (C1): PostgreSQL-backed persistence for chunks, graph, and
//! computed metrics, behind pgvector and pg_trgm.

pub mod chunks;
pub mod error;
pub mod errors;
pub mod graph;
pub mod metrics;
pub mod vector;

pub use chunks::ChunkRepository;
pub use error::StorageError;
pub use errors::{ErrorRepository, IndexingError, IndexingErrorType};
pub use graph::{Direction, GraphRepository};
pub use metrics::MetricsRepository;
pub use vector::{VectorDomain, VectorFilters, VectorHit, VectorSearcher};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connects and runs embedded migrations. Callers own the returned pool and
/// construct the individual repositories from it.
pub async fn connect(database_url: &str) -> Result<PgPool, StorageError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
