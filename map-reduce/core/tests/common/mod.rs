// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(dead_code)]

use map_reduce_core::worker_runtime::WorkerResult;
use map_reduce_core::{
    BoxError, Bucket, InputSplit, MapReduceJob, Reduced, RuntimeError, StateStore,
    StoreSnapshot, ThreadRuntime, WorkerRuntime,
};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Counts how many tracked values were created and dropped
#[derive(Clone, Default)]
pub struct DropCounter {
    created: Arc<AtomicUsize>,
    dropped: Arc<AtomicUsize>,
}

impl DropCounter {
    pub fn track<T>(&self, value: T) -> Tracked<T> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Tracked {
            value,
            counter: self.clone(),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.created() - self.dropped.load(Ordering::SeqCst)
    }
}

pub struct Tracked<T> {
    pub value: T,
    counter: DropCounter,
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.counter.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Value whose drop panics when armed
pub struct Fuse {
    pub armed: bool,
}

impl Fuse {
    pub fn inert() -> Self {
        Self { armed: false }
    }

    pub fn armed() -> Self {
        Self { armed: true }
    }
}

impl Drop for Fuse {
    fn drop(&mut self) {
        if self.armed {
            panic!("fuse blown");
        }
    }
}

/// Job whose mapper poisons the store lock, then swallows the panic and
/// reports success
///
/// Needs a store whose growth cannot be allocated, so the second key is
/// rejected and its armed value dropped under the lock.
#[derive(Default)]
pub struct PoisoningJob {
    pub reduce_calls: AtomicUsize,
}

impl MapReduceJob for PoisoningJob {
    type Params = ();
    type Input = ();
    type Value = Fuse;
    type Output = ();

    fn split(&self, _params: &()) -> Result<Vec<InputSplit<()>>, BoxError> {
        Ok(vec![InputSplit::new(0, ())])
    }

    fn map<S>(&self, _bucket: Bucket<()>, store: &S) -> Result<(), BoxError>
    where
        S: StateStore<Fuse>,
    {
        store.emit("first", Fuse::inert())?;
        let blown = panic::catch_unwind(AssertUnwindSafe(|| store.emit("second", Fuse::armed())));
        assert!(blown.is_err());
        Ok(())
    }

    fn reduce(&self, _snapshot: StoreSnapshot<Fuse>) -> Result<Reduced<()>, BoxError> {
        self.reduce_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Reduced::new((), 0))
    }

    fn output(&self, _payload: (), _count: usize) -> Result<i32, BoxError> {
        Ok(0)
    }
}

/// Job that records every callback and can be told to fail at any stage
///
/// Input lines are split on whitespace and each word is emitted with value 1.
#[derive(Default)]
pub struct RecordingJob {
    pub inputs: DropCounter,
    pub values: DropCounter,
    pub split_calls: AtomicUsize,
    pub reduce_calls: AtomicUsize,
    pub output_calls: AtomicUsize,
    /// (bucket index, sequence numbers in the order map saw them)
    pub mapped: Mutex<Vec<(usize, Vec<u64>)>>,
    /// Store contents as seen by reduce, in snapshot order
    pub reduced: Mutex<Vec<(String, Vec<u32>)>>,
    pub output: Mutex<Option<(Vec<(String, usize)>, usize)>>,
    pub fail_split: bool,
    pub fail_map_on: Option<usize>,
    pub panic_map_on: Option<usize>,
    pub fail_reduce: bool,
    pub output_status: i32,
    pub map_delay: Option<Duration>,
}

impl RecordingJob {
    pub fn mapped_buckets(&self) -> Vec<(usize, Vec<u64>)> {
        let mut mapped = self.mapped.lock().unwrap().clone();
        mapped.sort();
        mapped
    }

    pub fn reduced(&self) -> Vec<(String, Vec<u32>)> {
        self.reduced.lock().unwrap().clone()
    }
}

pub fn lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

impl MapReduceJob for RecordingJob {
    type Params = Vec<String>;
    type Input = Tracked<String>;
    type Value = Tracked<u32>;
    type Output = Vec<(String, usize)>;

    fn split(&self, params: &Vec<String>) -> Result<Vec<InputSplit<Self::Input>>, BoxError> {
        self.split_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_split {
            return Err("split refused".into());
        }
        Ok(InputSplit::sequence_of(
            params.iter().map(|line| self.inputs.track(line.clone())),
        ))
    }

    fn map<S>(&self, bucket: Bucket<Self::Input>, store: &S) -> Result<(), BoxError>
    where
        S: StateStore<Self::Value>,
    {
        if let Some(delay) = self.map_delay {
            thread::sleep(delay);
        }
        if self.panic_map_on == Some(bucket.index()) {
            panic!("map worker {} exploded", bucket.index());
        }
        if self.fail_map_on == Some(bucket.index()) {
            return Err(format!("map worker {} refused", bucket.index()).into());
        }

        for split in &bucket {
            for word in split.value.value.split_whitespace() {
                store.emit(word, self.values.track(1))?;
            }
        }

        self.mapped
            .lock()
            .unwrap()
            .push((bucket.index(), bucket.sequences()));
        Ok(())
    }

    fn reduce(
        &self,
        snapshot: StoreSnapshot<Self::Value>,
    ) -> Result<Reduced<Self::Output>, BoxError> {
        self.reduce_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reduce {
            return Err("reduce refused".into());
        }

        let seen: Vec<(String, Vec<u32>)> = snapshot
            .entries()
            .iter()
            .map(|entry| {
                let values = entry.values.iter().map(|tracked| tracked.value).collect();
                (entry.key.clone(), values)
            })
            .collect();
        *self.reduced.lock().unwrap() = seen;

        let payload: Vec<(String, usize)> = snapshot
            .into_iter()
            .map(|entry| (entry.key, entry.values.len()))
            .collect();
        let count = payload.len();
        Ok(Reduced::new(payload, count))
    }

    fn output(&self, payload: Self::Output, count: usize) -> Result<i32, BoxError> {
        self.output_calls.fetch_add(1, Ordering::SeqCst);
        *self.output.lock().unwrap() = Some((payload, count));
        Ok(self.output_status)
    }
}

/// Thread runtime that refuses to spawn one chosen worker
#[derive(Default)]
pub struct FailingRuntime {
    pub fail_at: usize,
    pub spawned: AtomicUsize,
    pub joined: AtomicUsize,
}

impl FailingRuntime {
    pub fn failing_at(fail_at: usize) -> Self {
        Self {
            fail_at,
            ..Default::default()
        }
    }

    pub fn spawned(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn joined(&self) -> usize {
        self.joined.load(Ordering::SeqCst)
    }
}

impl WorkerRuntime for FailingRuntime {
    type Handle = JoinHandle<WorkerResult>;

    fn spawn<F>(&self, worker: usize, task: F) -> Result<Self::Handle, RuntimeError>
    where
        F: FnOnce() -> WorkerResult + Send + 'static,
    {
        if worker == self.fail_at {
            return Err(RuntimeError::Spawn {
                worker,
                source: io::Error::other("injected spawn failure"),
            });
        }
        let handle = ThreadRuntime.spawn(worker, task)?;
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn join(&self, worker: usize, handle: Self::Handle) -> Result<WorkerResult, RuntimeError> {
        let outcome = ThreadRuntime.join(worker, handle);
        self.joined.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}
