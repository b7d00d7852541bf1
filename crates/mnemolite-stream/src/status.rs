//! Per-repository indexing status hash: `indexing:status:{repository}` in
//! Redis, 24h TTL, mirroring spec's job-tracking contract.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const STATUS_TTL_SECONDS: u64 = 86_400;

fn status_key(repository: &str) -> String {
    format!("indexing:status:{repository}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Partial,
    Failed,
}

impl JobStatus {
    fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Partial => "partial",
            JobStatus::Failed => "failed",
        }
    }

    fn from_str(s: &str) -> Self {
        match s {
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "partial" => JobStatus::Partial,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingStatus {
    pub job_id: String,
    pub total_files: u64,
    pub processed_files: u64,
    pub failed_files: u64,
    pub current_batch: u64,
    pub total_batches: u64,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

pub struct StatusRepository {
    client: redis::Client,
}

impl StatusRepository {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    pub async fn init(
        &self,
        repository: &str,
        job_id: &str,
        total_files: u64,
        total_batches: u64,
    ) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = status_key(repository);
        let now = Utc::now().to_rfc3339();

        let _: () = conn
            .hset_multiple(
                &key,
                &[
                    ("job_id", job_id),
                    ("total_files", &total_files.to_string()),
                    ("total_batches", &total_batches.to_string()),
                    ("processed_files", "0"),
                    ("failed_files", "0"),
                    ("current_batch", "0"),
                    ("status", JobStatus::Pending.as_str()),
                    ("started_at", &now),
                    ("completed_at", ""),
                ],
            )
            .await?;
        let _: () = conn.expire(&key, STATUS_TTL_SECONDS as i64).await?;
        Ok(())
    }

    /// Advances the hash by one completed batch: increments `processed_files`
    /// / `failed_files`, bumps `current_batch`, and on the last batch sets
    /// the terminal `status` and `completed_at`.
    pub async fn record_batch_completion(
        &self,
        repository: &str,
        batch_number: u64,
        total_batches: u64,
        success_count: u64,
        error_count: u64,
    ) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = status_key(repository);

        let _: i64 = conn.hincr(&key, "processed_files", success_count as i64).await?;
        let _: i64 = conn.hincr(&key, "failed_files", error_count as i64).await?;
        let _: () = conn.hset(&key, "current_batch", batch_number).await?;

        if batch_number >= total_batches {
            let failed_files: u64 = conn.hget(&key, "failed_files").await.unwrap_or(0);
            let status = if failed_files > 0 { JobStatus::Partial } else { JobStatus::Completed };
            let _: () = conn.hset(&key, "status", status.as_str()).await?;
            let _: () = conn.hset(&key, "completed_at", Utc::now().to_rfc3339()).await?;
        } else {
            let _: () = conn.hset(&key, "status", JobStatus::Processing.as_str()).await?;
        }
        Ok(())
    }

    pub async fn mark_failed(&self, repository: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = status_key(repository);
        let _: () = conn.hset(&key, "status", JobStatus::Failed.as_str()).await?;
        let _: () = conn.hset(&key, "completed_at", Utc::now().to_rfc3339()).await?;
        Ok(())
    }

    pub async fn get(&self, repository: &str) -> Result<Option<IndexingStatus>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = status_key(repository);
        let map: std::collections::HashMap<String, String> = conn.hgetall(&key).await?;
        if map.is_empty() {
            return Ok(None);
        }

        let get = |k: &str| map.get(k).cloned().unwrap_or_default();
        let completed_at = get("completed_at");

        Ok(Some(IndexingStatus {
            job_id: get("job_id"),
            total_files: get("total_files").parse().unwrap_or(0),
            processed_files: get("processed_files").parse().unwrap_or(0),
            failed_files: get("failed_files").parse().unwrap_or(0),
            current_batch: get("current_batch").parse().unwrap_or(0),
            total_batches: get("total_batches").parse().unwrap_or(0),
            status: JobStatus::from_str(&get("status")),
            started_at: get("started_at").parse().unwrap_or_else(|_| Utc::now()),
            completed_at: if completed_at.is_empty() {
                None
            } else {
                completed_at.parse().ok()
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_key_is_namespaced_by_repository() {
        assert_eq!(status_key("acme/widgets"), "indexing:status:acme/widgets");
    }

    #[test]
    fn job_status_round_trips_through_as_str() {
        for status in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Partial,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_str(status.as_str()), status);
        }
    }
}
