//! Batch indexing consumer (C8): reads batches from a repository's stream as
//! a named consumer in a named group, runs each batch in an isolated
//! subprocess worker, and acknowledges only once that batch is durably
//! recorded.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::error::{Result, StreamError};
use crate::graph_trigger::GraphTrigger;
use crate::status::StatusRepository;

const CONSUMER_GROUP: &str = "indexing-workers";
const BLOCK_MS: usize = 5_000;

fn stream_key(repository: &str) -> String {
    format!("indexing:jobs:{repository}")
}

#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Name of this consumer within the group, e.g. `host-pid`.
    pub consumer_name: String,
    /// Path to the `mnemolite-batch-worker` binary. Defaults to the sibling
    /// of the running executable.
    pub worker_binary: PathBuf,
    pub batch_timeout: Duration,
    pub database_url: String,
    pub redis_url: String,
}

#[derive(Debug, serde::Deserialize)]
struct BatchMessage {
    job_id: String,
    repository: String,
    batch_number: u64,
    total_batches: u64,
    files: String,
}

/// Shared stop flag set by the process's signal handler; checked between
/// batches so an in-flight batch is always allowed to finish.
pub fn shutdown_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

pub struct BatchConsumer {
    client: redis::Client,
    status: StatusRepository,
    graph: GraphTrigger,
    opts: ConsumerOptions,
}

impl BatchConsumer {
    pub fn new(client: redis::Client, graph: GraphTrigger, opts: ConsumerOptions) -> Self {
        Self {
            status: StatusRepository::new(client.clone()),
            client,
            graph,
            opts,
        }
    }

    async fn ensure_group(&self, conn: &mut redis::aio::MultiplexedConnection, repository: &str) -> Result<()> {
        let key = stream_key(repository);
        let created: std::result::Result<(), redis::RedisError> =
            conn.xgroup_create_mkstream(&key, CONSUMER_GROUP, "0").await;
        if let Err(e) = created {
            if !e.to_string().contains("BUSYGROUP") {
                return Err(StreamError::Redis(e));
            }
        }
        Ok(())
    }

    /// Runs the read-dispatch-ack loop for `repository` until `stop` is set.
    /// Each batch's subprocess failure is recorded in the job's status but
    /// does not stop the loop — batches are independent units of work.
    pub async fn run(&self, repository: &str, stop: Arc<AtomicBool>) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        self.ensure_group(&mut conn, repository).await?;
        let key = stream_key(repository);

        while !stop.load(Ordering::Relaxed) {
            let opts = StreamReadOptions::default()
                .group(CONSUMER_GROUP, &self.opts.consumer_name)
                .block(BLOCK_MS)
                .count(1);

            let reply: StreamReadReply = conn.xread_options(&[&key], &[">"], &opts).await?;

            if reply.keys.is_empty() {
                continue;
            }

            for stream_key_entry in reply.keys {
                for stream_id in stream_key_entry.ids {
                    let message: BatchMessage = match parse_fields(&stream_id.map) {
                        Ok(m) => m,
                        Err(e) => {
                            warn!(repository, id = %stream_id.id, error = %e, "dropping malformed batch message");
                            let _: i64 = conn.xack(&key, CONSUMER_GROUP, &[&stream_id.id]).await?;
                            continue;
                        }
                    };

                    self.handle_batch(&mut conn, &key, &stream_id.id, &message).await?;

                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                }
            }
        }

        info!(repository, "consumer loop stopped");
        Ok(())
    }

    async fn handle_batch(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        key: &str,
        stream_id: &str,
        message: &BatchMessage,
    ) -> Result<()> {
        let files: Vec<String> = message.files.split(',').map(|s| s.to_string()).filter(|s| !s.is_empty()).collect();

        let outcome = self.run_subprocess_worker(&message.repository, &files).await;

        let (success_count, error_count) = match outcome {
            Ok(result) => (result.success_count, result.error_count),
            Err(e) => {
                error!(
                    job_id = message.job_id,
                    repository = message.repository,
                    batch = message.batch_number,
                    error = %e,
                    "batch worker failed"
                );
                (0, files.len() as u64)
            }
        };

        self.status
            .record_batch_completion(&message.repository, message.batch_number, message.total_batches, success_count, error_count)
            .await?;

        let _: i64 = conn.xack(key, CONSUMER_GROUP, &[stream_id]).await?;

        if message.batch_number >= message.total_batches {
            if let Err(e) = self.graph.rebuild(&message.repository).await {
                error!(repository = message.repository, error = %e, "graph rebuild failed");
            }
        }

        Ok(())
    }

    /// Launches the batch worker as its own process and parses its last
    /// stdout line as JSON. Enforces `batch_timeout`; a process that does
    /// not exit in time is killed and reported as a timeout.
    async fn run_subprocess_worker(&self, repository: &str, files: &[String]) -> Result<crate::worker::WorkerResult> {
        let mut command = Command::new(&self.opts.worker_binary);
        command
            .arg("--repository")
            .arg(repository)
            .arg("--database-url")
            .arg(&self.opts.database_url)
            .arg("--files")
            .arg(files.join(","))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn()?;

        let output = match timeout(self.opts.batch_timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => return Err(StreamError::WorkerTimeout(self.opts.batch_timeout)),
        };

        if !output.status.success() {
            return Err(StreamError::WorkerFailed(format!(
                "exit status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let last_line = stdout.lines().last().ok_or_else(|| StreamError::WorkerFailed("empty stdout".into()))?;

        Ok(serde_json::from_str(last_line)?)
    }
}

fn parse_fields(map: &std::collections::HashMap<String, redis::Value>) -> Result<BatchMessage> {
    let get = |k: &str| -> Result<String> {
        match map.get(k) {
            Some(redis::Value::BulkString(bytes)) => Ok(String::from_utf8_lossy(bytes).to_string()),
            _ => Err(StreamError::WorkerFailed(format!("missing field {k}"))),
        }
    };
    Ok(BatchMessage {
        job_id: get("job_id")?,
        repository: get("repository")?,
        batch_number: get("batch_number")?.parse().unwrap_or(0),
        total_batches: get("total_batches")?.parse().unwrap_or(0),
        files: get("files")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_key_matches_producer_namespace() {
        assert_eq!(stream_key("acme/widgets"), "indexing:jobs:acme/widgets");
    }

    #[test]
    fn shutdown_flag_starts_cleared() {
        let flag = shutdown_flag();
        assert!(!flag.load(Ordering::Relaxed));
    }
}
