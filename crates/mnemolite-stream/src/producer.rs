//! Batch indexing producer (C7): scans a repository tree, divides it into
//! fixed-size batches, and enqueues one stream message per batch.

use chrono::Utc;
use ignore::WalkBuilder;
use redis::AsyncCommands;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::status::StatusRepository;

pub const DEFAULT_BATCH_SIZE: usize = 40;
pub const STREAM_MAX_LEN: usize = 1000;
pub const HARD_FILE_CAP: usize = 10_000;
pub const SOFT_FILE_WARNING: usize = 5_000;

const EXCLUDED_DIR_FRAGMENTS: &[&str] = &["node_modules", "/dist/", "/build/"];
const EXCLUDED_TEST_DIR_FRAGMENTS: &[&str] = &["__tests__/"];

fn stream_key(repository: &str) -> String {
    format!("indexing:jobs:{repository}")
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub extensions: Vec<String>,
    pub include_tests: bool,
    pub batch_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: vec![
                "py".into(), "js".into(), "mjs".into(), "cjs".into(), "jsx".into(),
                "ts".into(), "tsx".into(), "rs".into(), "go".into(), "c".into(), "h".into(),
                "cpp".into(), "hpp".into(), "cc".into(), "cxx".into(), "cs".into(),
            ],
            include_tests: false,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnqueueReport {
    pub job_id: String,
    pub total_files: usize,
    pub total_batches: usize,
}

fn is_test_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.contains(".spec.") || name.contains(".test.")
}

fn is_excluded(path: &Path, include_tests: bool) -> bool {
    let s = path.to_string_lossy();
    EXCLUDED_DIR_FRAGMENTS.iter().any(|frag| s.contains(frag))
        || (!include_tests && EXCLUDED_TEST_DIR_FRAGMENTS.iter().any(|frag| s.contains(frag)))
}

/// Walks `root`, keeping files whose extension is in `options.extensions`,
/// excluding build/dependency directories and (unless `include_tests`) test
/// files. Returned paths are sorted for reproducible batch numbering.
pub fn scan_files(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.into_path())
        .filter(|path| {
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| options.extensions.iter().any(|want| want == e))
                .unwrap_or(false);
            ext_ok && !is_excluded(path, options.include_tests) && (options.include_tests || !is_test_file(path))
        })
        .collect();
    files.sort();
    files
}

fn make_batches(files: &[PathBuf], batch_size: usize) -> Vec<Vec<PathBuf>> {
    files.chunks(batch_size.max(1)).map(|c| c.to_vec()).collect()
}

pub struct BatchProducer {
    client: redis::Client,
    status: StatusRepository,
}

impl BatchProducer {
    pub fn new(client: redis::Client) -> Self {
        Self {
            status: StatusRepository::new(client.clone()),
            client,
        }
    }

    /// Scans `root`, divides into batches, and enqueues one stream message
    /// per batch with a bounded, approximately-trimmed stream length.
    /// Returns an error if the hard file cap is exceeded; logs a warning at
    /// the soft threshold but still proceeds.
    pub async fn scan_and_enqueue(
        &self,
        root: &Path,
        repository: &str,
        options: &ScanOptions,
    ) -> Result<EnqueueReport> {
        let files = scan_files(root, options);
        if files.len() > HARD_FILE_CAP {
            return Err(crate::error::StreamError::FileCapExceeded {
                cap: HARD_FILE_CAP,
                found: files.len(),
            });
        }
        if files.len() > SOFT_FILE_WARNING {
            warn!(repository, count = files.len(), "file count exceeds soft warning threshold");
        }

        let batches = make_batches(&files, options.batch_size);
        let job_id = Uuid::new_v4().to_string();
        let total_batches = batches.len();

        self.status.init(repository, &job_id, files.len() as u64, total_batches as u64).await?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = stream_key(repository);

        for (i, batch) in batches.iter().enumerate() {
            let batch_number = i + 1;
            let files_csv = batch.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(",");
            let _: String = conn
                .xadd_maxlen(
                    &key,
                    redis::streams::StreamMaxlen::Approx(STREAM_MAX_LEN),
                    "*",
                    &[
                        ("job_id", job_id.as_str()),
                        ("repository", repository),
                        ("batch_number", &batch_number.to_string()),
                        ("total_batches", &total_batches.to_string()),
                        ("files", &files_csv),
                        ("created_at", &Utc::now().to_rfc3339()),
                    ],
                )
                .await?;
        }

        info!(repository, total_files = files.len(), total_batches, "enqueued indexing job");

        Ok(EnqueueReport {
            job_id,
            total_files: files.len(),
            total_batches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_node_modules_and_build_dirs() {
        assert!(is_excluded(Path::new("repo/node_modules/foo.js"), false));
        assert!(is_excluded(Path::new("repo/dist/bundle.js"), false));
        assert!(!is_excluded(Path::new("repo/src/main.rs"), false));
    }

    #[test]
    fn excludes_tests_dir_unless_opted_in() {
        let path = Path::new("repo/__tests__/foo.js");
        assert!(is_excluded(path, false));
        assert!(!is_excluded(path, true));
    }

    #[test]
    fn excludes_test_files_unless_opted_in() {
        assert!(is_test_file(Path::new("foo.spec.ts")));
        assert!(is_test_file(Path::new("foo.test.ts")));
        assert!(!is_test_file(Path::new("foo.ts")));
    }

    #[test]
    fn batches_split_by_fixed_size() {
        let files: Vec<PathBuf> = (0..85).map(|i| PathBuf::from(format!("f{i}.py"))).collect();
        let batches = make_batches(&files, 40);
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 40);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn stream_key_is_namespaced_by_repository() {
        assert_eq!(stream_key("acme/widgets"), "indexing:jobs:acme/widgets");
    }
}
