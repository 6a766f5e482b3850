// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use std::collections::TryReserveError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Memory for the key, the value slot, or a capacity increase could not be reserved
    #[error("store allocation failed while emitting key '{key}': {source}")]
    Allocation {
        key: String,
        #[source]
        source: TryReserveError,
    },

    /// A panic unwound through the store lock
    ///
    /// Emits never panic on their own. The only way in is a value whose
    /// `Drop` panics while a failed emit discards it. After that every later
    /// emit or drain reports this instead of touching the data.
    #[error("store lock poisoned by a panicking worker")]
    Poisoned,
}
