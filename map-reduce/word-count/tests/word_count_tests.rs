// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::{
    InMemoryStateStore, InputSplit, JobError, LineSplitParams, MapReduceJob, Orchestrator,
};
use map_reduce_word_count::{format_counts, words, WordCount, WordCountJob};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn input_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

/// Run word count over `contents` and return what it printed
fn count_words(contents: &str, num_workers: usize) -> String {
    let file = input_file(contents);
    let job = Arc::new(WordCountJob::new(Vec::new()));

    Orchestrator::new(Arc::clone(&job))
        .run(&LineSplitParams::new(file.path()), num_workers)
        .unwrap();

    let job = Arc::try_unwrap(job).ok().unwrap();
    String::from_utf8(job.into_inner()).unwrap()
}

#[test]
fn test_words_split_on_space_comma_and_period() {
    let found: Vec<&str> = words("Hello, world. This  is,a test.").collect();
    assert_eq!(found, vec!["Hello", "world", "This", "is", "a", "test"]);

    assert_eq!(words(" ,. ").count(), 0);
}

#[test]
fn test_map_emits_one_per_word() {
    let job = WordCountJob::new(Vec::new());
    let store = InMemoryStateStore::default();
    let bucket = map_reduce_core::distribute(
        InputSplit::sequence_of(["a b a".to_string(), "b c".to_string()]),
        std::num::NonZeroUsize::MIN,
    )
    .pop()
    .unwrap();

    job.map(bucket, &store).unwrap();

    assert_eq!(store.values("a"), Some(vec![1, 1]));
    assert_eq!(store.values("b"), Some(vec![1, 1]));
    assert_eq!(store.values("c"), Some(vec![1]));
    assert_eq!(store.len(), 3);
}

#[test]
fn test_end_to_end_example() {
    assert_eq!(count_words("a b a\nb c\n", 1), "a=2\nb=2\nc=1\n");
}

#[test]
fn test_output_is_sorted_regardless_of_worker_count() {
    let text = "pear apple\nfig, pear.\napple apple\nkiwi\n";
    let expected = "apple=3\nfig=1\nkiwi=1\npear=2\n";

    for num_workers in [1, 2, 4, 100] {
        assert_eq!(count_words(text, num_workers), expected);
    }
}

#[test]
fn test_format_counts_sorts_lexicographically() {
    let mut counts = vec![
        WordCount {
            word: "b".to_string(),
            count: 2,
        },
        WordCount {
            word: "B".to_string(),
            count: 1,
        },
        WordCount {
            word: "a".to_string(),
            count: 5,
        },
    ];

    assert_eq!(format_counts(&mut counts), vec!["B=1", "a=5", "b=2"]);
}

#[test]
fn test_unreadable_input_counts_as_empty_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let job = Arc::new(WordCountJob::new(Vec::new()));

    let report = Orchestrator::new(Arc::clone(&job))
        .run(&LineSplitParams::new(dir.path().join("missing.txt")), 2)
        .unwrap();

    assert_eq!(report.input_units, 0);
    assert_eq!(report.output_count, 0);
}

#[test]
fn test_unreadable_input_fails_when_strict() {
    let dir = tempfile::tempdir().unwrap();
    let job = Arc::new(WordCountJob::new(Vec::new()).skip_unreadable_input(false));

    let err = Orchestrator::new(job)
        .run(&LineSplitParams::new(dir.path().join("missing.txt")), 2)
        .unwrap_err();

    assert!(matches!(err, JobError::Split(_)));
}

#[test]
fn test_invalid_worker_count_prints_nothing() {
    let file = input_file("a b\n");
    let job = Arc::new(WordCountJob::new(Vec::new()));
    let orchestrator = Orchestrator::new(Arc::clone(&job));

    assert!(orchestrator.run(&LineSplitParams::new(file.path()), 0).is_err());
    assert!(orchestrator.run(&LineSplitParams::new(file.path()), 101).is_err());

    drop(orchestrator);
    let job = Arc::try_unwrap(job).ok().unwrap();
    assert!(job.into_inner().is_empty());
}
