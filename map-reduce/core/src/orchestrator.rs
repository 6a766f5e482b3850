// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::in_memory_state_store::{InMemoryStateStore, StoreConfig};
use crate::input_split::Bucket;
use crate::job_error::JobError;
use crate::map_reduce_job::MapReduceJob;
use crate::mapper::MapperTask;
use crate::partitioner::distribute;
use crate::worker_runtime::{RuntimeError, ThreadRuntime, WorkerResult, WorkerRuntime};
use std::fmt;
use std::mem;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::{debug, error, info};

pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 100;

/// Stages a job moves through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStage {
    Idle,
    Split,
    Partitioned,
    Mapping,
    Barrier,
    Reducing,
    Outputting,
    Teardown,
    Done,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Idle => "idle",
            JobStage::Split => "split",
            JobStage::Partitioned => "partitioned",
            JobStage::Mapping => "mapping",
            JobStage::Barrier => "barrier",
            JobStage::Reducing => "reducing",
            JobStage::Outputting => "outputting",
            JobStage::Teardown => "teardown",
            JobStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Summary of a successful job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobReport {
    pub num_workers: usize,
    pub input_units: usize,
    pub distinct_keys: usize,
    pub output_count: usize,
    pub status: i32,
}

/// Everything a job owns between validation and teardown
struct JobResources<J, R>
where
    J: MapReduceJob,
    R: WorkerRuntime,
{
    buckets: Vec<Bucket<J::Input>>,
    store: Option<InMemoryStateStore<J::Value>>,
    handles: Vec<(usize, R::Handle)>,
}

impl<J, R> JobResources<J, R>
where
    J: MapReduceJob,
    R: WorkerRuntime,
{
    fn new() -> Self {
        Self {
            buckets: Vec::new(),
            store: None,
            handles: Vec::new(),
        }
    }
}

/// Orchestrator drives one job at a time through split, map, reduce and output
///
/// Each call to [`Orchestrator::run`] builds its own store, so one
/// orchestrator can be reused for several jobs, sequentially or from
/// several threads.
pub struct Orchestrator<J, R = ThreadRuntime>
where
    J: MapReduceJob,
    R: WorkerRuntime,
{
    job: Arc<J>,
    runtime: R,
    store_config: StoreConfig,
}

impl<J> Orchestrator<J, ThreadRuntime>
where
    J: MapReduceJob,
{
    pub fn new(job: Arc<J>) -> Self {
        Self::with_runtime(job, ThreadRuntime)
    }
}

impl<J, R> Orchestrator<J, R>
where
    J: MapReduceJob,
    R: WorkerRuntime,
{
    pub fn with_runtime(job: Arc<J>, runtime: R) -> Self {
        Self {
            job,
            runtime,
            store_config: StoreConfig::default(),
        }
    }

    pub fn store_config(mut self, store_config: StoreConfig) -> Self {
        self.store_config = store_config;
        self
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Run the complete job
    ///
    /// The worker count is checked before anything is allocated. Past that
    /// point every exit path goes through teardown before returning.
    pub fn run(&self, params: &J::Params, num_workers: usize) -> Result<JobReport, JobError> {
        let num_workers = validate_worker_count(num_workers)?;
        info!(num_workers = num_workers.get(), "job accepted");

        let mut resources = JobResources::<J, R>::new();
        let result = self.execute(params, num_workers, &mut resources);

        enter(JobStage::Teardown);
        self.teardown(resources);
        enter(JobStage::Done);

        match &result {
            Ok(report) => info!(
                distinct_keys = report.distinct_keys,
                output_count = report.output_count,
                "job completed"
            ),
            Err(e) => error!(stage = %e.stage(), error = %e, "job failed"),
        }
        result
    }

    fn execute(
        &self,
        params: &J::Params,
        num_workers: NonZeroUsize,
        resources: &mut JobResources<J, R>,
    ) -> Result<JobReport, JobError> {
        enter(JobStage::Split);
        let splits = self.job.split(params).map_err(JobError::Split)?;
        let input_units = splits.len();
        info!(input_units, "input split");

        enter(JobStage::Partitioned);
        resources.buckets = distribute(splits, num_workers);
        for bucket in &resources.buckets {
            debug!(bucket = bucket.index(), splits = bucket.len(), "bucket assigned");
        }

        enter(JobStage::Mapping);
        let store = InMemoryStateStore::new(self.store_config);
        resources.store = Some(store.clone());
        let spawned = self.spawn_mappers(&store, resources);

        // Workers that did start are joined even if a later spawn failed.
        enter(JobStage::Barrier);
        let outcomes = self.join_mappers(resources);
        spawned?;
        check_outcomes(outcomes)?;

        enter(JobStage::Reducing);
        let snapshot = store.drain_snapshot()?;
        let distinct_keys = snapshot.len();
        info!(distinct_keys, "reducing");
        let reduced = self.job.reduce(snapshot).map_err(JobError::Reduce)?;
        debug!(count = reduced.count, "reduce produced elements");

        enter(JobStage::Outputting);
        let output_count = reduced.count;
        let status = self
            .job
            .output(reduced.payload, reduced.count)
            .map_err(JobError::Output)?;
        if status != 0 {
            return Err(JobError::OutputStatus(status));
        }

        Ok(JobReport {
            num_workers: num_workers.get(),
            input_units,
            distinct_keys,
            output_count,
            status,
        })
    }

    /// Start one mapper per bucket, stopping at the first spawn failure
    ///
    /// Buckets not yet handed to a worker go back into `resources`.
    fn spawn_mappers(
        &self,
        store: &InMemoryStateStore<J::Value>,
        resources: &mut JobResources<J, R>,
    ) -> Result<(), JobError> {
        let mut pending = mem::take(&mut resources.buckets).into_iter();

        while let Some(bucket) = pending.next() {
            let worker = bucket.index();
            let task = MapperTask::new(Arc::clone(&self.job), store.clone(), bucket);

            match self.runtime.spawn(worker, move || task.run()) {
                Ok(handle) => {
                    debug!(worker, "mapper spawned");
                    resources.handles.push((worker, handle));
                }
                Err(e) => {
                    error!(worker, error = %e, "failed to spawn mapper");
                    resources.buckets.extend(pending);
                    return Err(JobError::Spawn(e));
                }
            }
        }

        Ok(())
    }

    fn join_mappers(
        &self,
        resources: &mut JobResources<J, R>,
    ) -> Vec<(usize, Result<WorkerResult, RuntimeError>)> {
        mem::take(&mut resources.handles)
            .into_iter()
            .map(|(worker, handle)| (worker, self.runtime.join(worker, handle)))
            .collect()
    }

    fn teardown(&self, mut resources: JobResources<J, R>) {
        // Normally empty: handles are joined at the barrier.
        for (worker, outcome) in self.join_mappers(&mut resources) {
            if let Err(e) = outcome {
                error!(worker, error = %e, "mapper failed during teardown");
            }
        }

        let unstarted: usize = resources.buckets.iter().map(Bucket::len).sum();
        if unstarted > 0 {
            debug!(splits = unstarted, "releasing splits never handed to a mapper");
        }
        drop(resources.buckets);

        if let Some(store) = resources.store.take() {
            debug!(keys = store.len(), "releasing store");
        }
    }
}

/// Reject worker counts outside of `MIN_WORKERS..=MAX_WORKERS`
pub fn validate_worker_count(num_workers: usize) -> Result<NonZeroUsize, JobError> {
    let invalid = JobError::InvalidWorkerCount {
        requested: num_workers,
        min: MIN_WORKERS,
        max: MAX_WORKERS,
    };
    if num_workers > MAX_WORKERS {
        return Err(invalid);
    }
    NonZeroUsize::new(num_workers).ok_or(invalid)
}

/// Turn join outcomes into the job result, keeping the lowest-indexed failure
fn check_outcomes(
    outcomes: Vec<(usize, Result<WorkerResult, RuntimeError>)>,
) -> Result<(), JobError> {
    let mut first_failure = None;

    for (worker, outcome) in outcomes {
        let failure = match outcome {
            Ok(Ok(())) => continue,
            Ok(Err(source)) => JobError::Map { worker, source },
            Err(e) => JobError::WorkerPanicked(e),
        };
        if first_failure.is_none() {
            first_failure = Some(failure);
        } else {
            error!(worker, error = %failure, "additional mapper failure");
        }
    }

    match first_failure {
        Some(failure) => Err(failure),
        None => Ok(()),
    }
}

fn enter(stage: JobStage) {
    debug!(%stage, "entering stage");
}
