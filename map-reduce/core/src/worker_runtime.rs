// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::job_error::BoxError;
use std::any::Any;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// What a map worker returns when it finishes normally
pub type WorkerResult = Result<(), BoxError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to spawn map worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("map worker {worker} panicked: {message}")]
    Panicked { worker: usize, message: String },
}

/// Trait for abstracting how map workers are started and joined
pub trait WorkerRuntime: Send + Sync {
    type Handle: Send;

    /// Start `task` as worker `worker`
    ///
    /// On error the task is dropped without having run.
    fn spawn<F>(&self, worker: usize, task: F) -> Result<Self::Handle, RuntimeError>
    where
        F: FnOnce() -> WorkerResult + Send + 'static;

    /// Block until the worker behind `handle` has finished
    fn join(&self, worker: usize, handle: Self::Handle) -> Result<WorkerResult, RuntimeError>;
}

/// One OS thread per worker
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRuntime;

impl WorkerRuntime for ThreadRuntime {
    type Handle = JoinHandle<WorkerResult>;

    fn spawn<F>(&self, worker: usize, task: F) -> Result<Self::Handle, RuntimeError>
    where
        F: FnOnce() -> WorkerResult + Send + 'static,
    {
        thread::Builder::new()
            .name(format!("map-worker-{worker}"))
            .spawn(task)
            .map_err(|source| RuntimeError::Spawn { worker, source })
    }

    fn join(&self, worker: usize, handle: Self::Handle) -> Result<WorkerResult, RuntimeError> {
        handle.join().map_err(|payload| RuntimeError::Panicked {
            worker,
            message: panic_message(payload.as_ref()),
        })
    }
}

/// Best-effort text of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
