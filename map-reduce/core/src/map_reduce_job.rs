// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::input_split::{Bucket, InputSplit};
use crate::job_error::BoxError;
use crate::state_store::{StateStore, StoreSnapshot};

/// What reduce hands over to output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduced<T> {
    pub payload: T,
    /// Number of elements in `payload`
    pub count: usize,
}

impl<T> Reduced<T> {
    pub fn new(payload: T, count: usize) -> Self {
        Self { payload, count }
    }
}

/// Trait that defines a specific MapReduce job
/// Abstracts the job domain from the execution model
///
/// One value implementing this trait is bound to a job for its whole run and
/// shared by reference with every map worker.
pub trait MapReduceJob: Send + Sync + 'static {
    /// Caller-defined parameters consumed by `split`
    type Params;

    /// The value carried by each input split
    type Input: Send + 'static;

    /// The value type mappers emit into the store
    type Value: Send + 'static;

    /// The reduce result passed to `output`
    type Output;

    /// Produce the input splits, numbered from 0 in emission order
    fn split(&self, params: &Self::Params) -> Result<Vec<InputSplit<Self::Input>>, BoxError>;

    /// Process one bucket on its own worker thread
    ///
    /// Results must only leave through `store.emit`.
    fn map<S>(&self, bucket: Bucket<Self::Input>, store: &S) -> Result<(), BoxError>
    where
        S: StateStore<Self::Value>;

    /// Fold the store contents once every mapper has finished
    fn reduce(
        &self,
        snapshot: StoreSnapshot<Self::Value>,
    ) -> Result<Reduced<Self::Output>, BoxError>;

    /// Consume the reduce result; a non-zero status fails the job
    fn output(&self, payload: Self::Output, count: usize) -> Result<i32, BoxError>;
}
