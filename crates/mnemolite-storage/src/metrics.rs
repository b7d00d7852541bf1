//! `computed_metrics`/`detailed_metadata`/`edge_weights`: versioned
//! ancillary tables written by the post-graph metrics pass.

use chrono::Utc;
use mnemolite_core::ComputedMetricsPass;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StorageError;

pub struct MetricsRepository {
    pool: PgPool,
}

impl MetricsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn store(&self, pass: &ComputedMetricsPass) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (node_id, metrics) in &pass.per_node {
            sqlx::query(
                "INSERT INTO computed_metrics
                 (node_id, version, afferent_coupling, efferent_coupling, instability, centrality, computed_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (node_id, version) DO UPDATE SET
                   afferent_coupling = EXCLUDED.afferent_coupling,
                   efferent_coupling = EXCLUDED.efferent_coupling,
                   instability = EXCLUDED.instability,
                   centrality = EXCLUDED.centrality,
                   computed_at = EXCLUDED.computed_at",
            )
            .bind(node_id)
            .bind(pass.version as i32)
            .bind(metrics.afferent_coupling as i32)
            .bind(metrics.efferent_coupling as i32)
            .bind(metrics.instability)
            .bind(metrics.centrality)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn latest_version(&self, node_id: Uuid) -> Result<Option<i32>, StorageError> {
        let version: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(version) FROM computed_metrics WHERE node_id = $1",
        )
        .bind(node_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(version)
    }

    /// Persists per-edge call-context weights for the same pass `version`
    /// the centrality/coupling numbers were computed under.
    pub async fn store_edge_weights(&self, version: i32, weights: &[(Uuid, f64)]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;
        for (edge_id, weight) in weights {
            sqlx::query(
                "INSERT INTO edge_weights (edge_id, version, weight)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (edge_id, version) DO UPDATE SET weight = EXCLUDED.weight",
            )
            .bind(edge_id)
            .bind(version)
            .bind(weight)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
