// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// One record produced by a splitter
///
/// `sequence` is assigned in emission order starting at 0 and is only used
/// to route the split to a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSplit<T> {
    pub sequence: u64,
    pub value: T,
}

impl<T> InputSplit<T> {
    pub fn new(sequence: u64, value: T) -> Self {
        Self { sequence, value }
    }

    /// Number a sequence of values from 0 in iteration order
    pub fn sequence_of<I>(values: I) -> Vec<Self>
    where
        I: IntoIterator<Item = T>,
    {
        values
            .into_iter()
            .zip(0u64..)
            .map(|(value, sequence)| Self { sequence, value })
            .collect()
    }
}

/// The ordered splits handed to a single map worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket<T> {
    index: usize,
    splits: Vec<InputSplit<T>>,
}

impl<T> Bucket<T> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            splits: Vec::new(),
        }
    }

    /// Position of this bucket, which is also the id of the worker running it
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }

    pub fn push(&mut self, split: InputSplit<T>) {
        self.splits.push(split);
    }

    pub fn sequences(&self) -> Vec<u64> {
        self.splits.iter().map(|split| split.sequence).collect()
    }

    pub fn into_values(self) -> impl Iterator<Item = T> {
        self.splits.into_iter().map(|split| split.value)
    }
}

impl<T> IntoIterator for Bucket<T> {
    type Item = InputSplit<T>;
    type IntoIter = std::vec::IntoIter<InputSplit<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Bucket<T> {
    type Item = &'a InputSplit<T>;
    type IntoIter = std::slice::Iter<'a, InputSplit<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.splits.iter()
    }
}
