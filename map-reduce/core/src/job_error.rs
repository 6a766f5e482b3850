// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::orchestrator::JobStage;
use crate::store_error::StoreError;
use crate::worker_runtime::RuntimeError;
use thiserror::Error;

/// Error type returned by user callbacks
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("worker count {requested} is outside of {min}..={max}")]
    InvalidWorkerCount {
        requested: usize,
        min: usize,
        max: usize,
    },

    #[error("split failed: {0}")]
    Split(#[source] BoxError),

    #[error(transparent)]
    Spawn(RuntimeError),

    #[error("map worker {worker} failed: {source}")]
    Map {
        worker: usize,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    WorkerPanicked(RuntimeError),

    #[error("store unavailable after map phase: {0}")]
    Store(#[from] StoreError),

    #[error("reduce failed: {0}")]
    Reduce(#[source] BoxError),

    #[error("output failed: {0}")]
    Output(#[source] BoxError),

    #[error("output returned non-zero status {0}")]
    OutputStatus(i32),
}

impl JobError {
    /// The stage the job was in when it failed
    pub fn stage(&self) -> JobStage {
        match self {
            JobError::InvalidWorkerCount { .. } => JobStage::Idle,
            JobError::Split(_) => JobStage::Split,
            JobError::Spawn(_) => JobStage::Mapping,
            JobError::Map { .. } | JobError::WorkerPanicked(_) => JobStage::Barrier,
            JobError::Store(_) | JobError::Reduce(_) => JobStage::Reducing,
            JobError::Output(_) | JobError::OutputStatus(_) => JobStage::Outputting,
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, JobError::InvalidWorkerCount { .. })
    }
}
