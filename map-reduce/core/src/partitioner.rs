// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::input_split::{Bucket, InputSplit};
use std::num::NonZeroUsize;

/// Distribute splits across `num_workers` buckets
///
/// A split lands in bucket `sequence % num_workers`. Splits sharing a bucket
/// keep their relative input order, and every bucket index in
/// `0..num_workers` is present even when it receives nothing.
pub fn distribute<T>(splits: Vec<InputSplit<T>>, num_workers: NonZeroUsize) -> Vec<Bucket<T>> {
    let num_workers = num_workers.get();
    let mut buckets: Vec<Bucket<T>> = (0..num_workers).map(Bucket::new).collect();

    for split in splits {
        let index = bucket_index(split.sequence, num_workers);
        buckets[index].push(split);
    }

    buckets
}

fn bucket_index(sequence: u64, num_workers: usize) -> usize {
    // num_workers fits in u64 on every supported target, and the remainder
    // is below num_workers so it fits back into usize.
    (sequence % num_workers as u64) as usize
}
