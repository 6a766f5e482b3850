// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::line_splitter::{split_lines, LineSplitParams, SplitError};
use map_reduce_core::{
    BoxError, Bucket, InputSplit, MapReduceJob, Reduced, StateStore, StoreSnapshot,
};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{trace, warn};

/// Characters separating words on a line
pub const WORD_DELIMITERS: [char; 3] = [' ', ',', '.'];

#[derive(Debug, Error)]
pub enum WordCountError {
    #[error("failed to write results: {0}")]
    Write(#[from] io::Error),

    #[error("output sink poisoned by a previous panic")]
    OutputPoisoned,
}

/// Final count for one word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Word count problem definition - counts how often each word appears in a text file
///
/// Results are written to `out` as `word=count` lines sorted by word.
pub struct WordCountJob<W> {
    out: Mutex<W>,
    skip_unreadable_input: bool,
}

impl WordCountJob<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W> WordCountJob<W>
where
    W: Write + Send + 'static,
{
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            skip_unreadable_input: true,
        }
    }

    /// Whether a file that cannot be opened counts as empty input (the default)
    /// or fails the job
    pub fn skip_unreadable_input(mut self, skip: bool) -> Self {
        self.skip_unreadable_input = skip;
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> MapReduceJob for WordCountJob<W>
where
    W: Write + Send + 'static,
{
    type Params = LineSplitParams;
    type Input = String;
    type Value = u32;
    type Output = Vec<WordCount>;

    fn split(&self, params: &Self::Params) -> Result<Vec<InputSplit<String>>, BoxError> {
        match split_lines(params) {
            Ok(splits) => Ok(splits),
            Err(e @ SplitError::Open { .. }) if self.skip_unreadable_input => {
                warn!(error = %e, "treating unreadable input as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn map<S>(&self, bucket: Bucket<String>, store: &S) -> Result<(), BoxError>
    where
        S: StateStore<Self::Value>,
    {
        for split in &bucket {
            trace!(sequence = split.sequence, "mapping line");
            for word in words(&split.value) {
                store.emit(word, 1)?;
            }
        }
        Ok(())
    }

    fn reduce(&self, snapshot: StoreSnapshot<u32>) -> Result<Reduced<Vec<WordCount>>, BoxError> {
        let counts: Vec<WordCount> = snapshot
            .into_iter()
            .map(|entry| WordCount {
                count: entry.values.iter().map(|&value| u64::from(value)).sum(),
                word: entry.key,
            })
            .collect();
        let count = counts.len();
        Ok(Reduced::new(counts, count))
    }

    fn output(&self, mut counts: Vec<WordCount>, count: usize) -> Result<i32, BoxError> {
        counts.truncate(count);
        let mut out = self.out.lock().map_err(|_| WordCountError::OutputPoisoned)?;
        for line in format_counts(&mut counts) {
            writeln!(out, "{line}").map_err(WordCountError::from)?;
        }
        out.flush().map_err(WordCountError::from)?;
        Ok(0)
    }
}

/// Words of a line, skipping empty tokens between delimiters
pub fn words(line: &str) -> impl Iterator<Item = &str> {
    line.split(WORD_DELIMITERS).filter(|word| !word.is_empty())
}

/// Sort counts by word and render them as `word=count`
pub fn format_counts(counts: &mut [WordCount]) -> Vec<String> {
    counts.sort_by(|a, b| a.word.cmp(&b.word));
    counts
        .iter()
        .map(|entry| format!("{}={}", entry.word, entry.count))
        .collect()
}
