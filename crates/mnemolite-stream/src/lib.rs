//! Durable batch indexing pipeline (C6-C8): scans a repository into
//! fixed-size batches, enqueues them on a Redis Stream, and processes each
//! batch in an isolated subprocess worker with at-least-once delivery and
//! per-file failure isolation.

pub mod consumer;
pub mod error;
pub mod graph_trigger;
pub mod indexing;
pub mod producer;
pub mod status;
pub mod worker;

pub use consumer::{BatchConsumer, ConsumerOptions};
pub use error::{Result, StreamError};
pub use graph_trigger::GraphTrigger;
pub use indexing::{IndexFileReport, IndexOptions, IndexingService};
pub use producer::{BatchProducer, EnqueueReport, ScanOptions};
pub use status::{IndexingStatus, JobStatus, StatusRepository};
pub use worker::WorkerResult;
