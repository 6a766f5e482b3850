// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod config;
pub mod in_memory_state_store;
pub mod input_split;
pub mod job_error;
pub mod line_splitter;
pub mod map_reduce_job;
pub mod mapper;
pub mod orchestrator;
pub mod partitioner;
pub mod state_store;
pub mod store_error;
pub mod worker_runtime;

pub use config::{Config, ConfigError};
pub use in_memory_state_store::{InMemoryStateStore, StoreConfig};
pub use input_split::{Bucket, InputSplit};
pub use job_error::{BoxError, JobError};
pub use line_splitter::{split_lines, LineSplitParams, SplitError};
pub use map_reduce_job::{MapReduceJob, Reduced};
pub use orchestrator::{
    validate_worker_count, JobReport, JobStage, Orchestrator, MAX_WORKERS, MIN_WORKERS,
};
pub use partitioner::distribute;
pub use state_store::{StateStore, StoreEntry, StoreSnapshot};
pub use store_error::StoreError;
pub use worker_runtime::{RuntimeError, ThreadRuntime, WorkerResult, WorkerRuntime};
