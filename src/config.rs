//! Search configuration and its up-front validation.

use std::path::PathBuf;

use crate::charset::Alphabet;
use crate::error::ConfigError;
use crate::generator::permutation_count;

/// Verification attempts dispatched per batch unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Attempts between progress observations unless configured otherwise.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Everything a search needs, fixed before it starts.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Archive to unlock.
    pub archive_path: PathBuf,
    /// Characters candidates are built from.
    pub alphabet: Alphabet,
    /// Candidate lengths, searched in the order given.
    pub lengths: Vec<usize>,
    /// Attempts verified concurrently per batch.
    pub concurrency: usize,
    /// Emit a progress observation every this many attempts.
    pub progress_interval: u64,
}

impl SearchConfig {
    pub fn new(archive_path: impl Into<PathBuf>, alphabet: Alphabet, lengths: Vec<usize>) -> Self {
        Self {
            archive_path: archive_path.into(),
            alphabet,
            lengths,
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Expands an inclusive `min..=max` range into a length list.
    pub fn length_range(min: usize, max: usize) -> Result<Vec<usize>, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidRange { min, max });
        }
        Ok((min..=max).collect())
    }

    /// Rejects anything that would otherwise surface mid-search.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.archive_path.is_file() {
            return Err(ConfigError::ArchiveNotFound(self.archive_path.clone()));
        }

        if self.lengths.is_empty() {
            return Err(ConfigError::NoLengths);
        }

        let alphabet = self.alphabet.len();
        if let Some(&length) = self.lengths.iter().find(|&&length| length > alphabet) {
            return Err(ConfigError::LengthExceedsAlphabet { length, alphabet });
        }

        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if self.progress_interval == 0 {
            return Err(ConfigError::ZeroProgressInterval);
        }

        Ok(())
    }

    /// Total candidates across all lengths, or `None` if it overflows.
    pub fn search_space(&self) -> Option<u128> {
        self.lengths.iter().try_fold(0u128, |total, &length| {
            total.checked_add(permutation_count(self.alphabet.len(), length)?)
        })
    }
}
