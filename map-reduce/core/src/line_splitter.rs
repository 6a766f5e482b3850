// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::input_split::InputSplit;
use regex::Regex;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, trace};

static DEFAULT_PATTERN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(LineSplitParams::DEFAULT_PATTERN).expect("Invalid regex pattern")
});

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("can't open input file '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading input file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Parameters for [`split_lines`]
#[derive(Debug, Clone)]
pub struct LineSplitParams {
    pub path: PathBuf,
    /// Lines that do not match are skipped. The split value is the first
    /// capture group when the pattern has one, the whole match otherwise.
    pub pattern: Regex,
}

impl LineSplitParams {
    pub const DEFAULT_PATTERN: &'static str = ".+";

    /// Every non-empty line becomes one split
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pattern: DEFAULT_PATTERN_REGEX.clone(),
        }
    }

    pub fn with_pattern(path: impl Into<PathBuf>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            path: path.into(),
            pattern: Regex::new(pattern)?,
        })
    }
}

/// Read a text file into one split per matching line, numbered in file order
pub fn split_lines(params: &LineSplitParams) -> Result<Vec<InputSplit<String>>, SplitError> {
    let file = File::open(&params.path).map_err(|source| SplitError::Open {
        path: params.path.clone(),
        source,
    })?;

    let mut splits = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| SplitError::Read {
            path: params.path.clone(),
            source,
        })?;

        if let Some(text) = matched_text(&params.pattern, &line) {
            let sequence = splits.len() as u64;
            trace!(sequence, chars = text.len(), "line split");
            splits.push(InputSplit::new(sequence, text.to_string()));
        }
    }

    debug!(path = %params.path.display(), splits = splits.len(), "file split");
    Ok(splits)
}

fn matched_text<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
    let captures = pattern.captures(line)?;
    captures
        .get(1)
        .or_else(|| captures.get(0))
        .map(|m| m.as_str())
}
