// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::input_split::Bucket;
use crate::map_reduce_job::MapReduceJob;
use crate::state_store::StateStore;
use crate::worker_runtime::WorkerResult;
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything a map worker owns while it runs
pub struct MapperTask<J, S>
where
    J: MapReduceJob,
{
    pub id: usize,
    pub job: Arc<J>,
    pub store: S,
    pub bucket: Bucket<J::Input>,
}

impl<J, S> MapperTask<J, S>
where
    J: MapReduceJob,
    S: StateStore<J::Value>,
{
    pub fn new(job: Arc<J>, store: S, bucket: Bucket<J::Input>) -> Self {
        Self {
            id: bucket.index(),
            job,
            store,
            bucket,
        }
    }

    /// Run the job's map callback over the bucket
    ///
    /// The bucket and the store handle are dropped when this returns.
    pub fn run(self) -> WorkerResult {
        let MapperTask {
            id,
            job,
            store,
            bucket,
        } = self;

        debug!(worker = id, splits = bucket.len(), "mapper started");
        let result = job.map(bucket, &store);
        match &result {
            Ok(()) => debug!(worker = id, "mapper finished"),
            Err(e) => warn!(worker = id, error = %e, "mapper failed"),
        }
        result
    }
}
