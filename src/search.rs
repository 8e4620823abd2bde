//! Search coordination: lengths in order, batches in order, stop on first hit.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{ConfigError, SearchError};
use crate::generator::{Permutations, permutation_count};
use crate::scheduler::{Batch, BatchScheduler};
use crate::verifier::Verifier;

/// Lifecycle of a [`Coordinator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Searching,
    Found(String),
    Exhausted,
    /// The verifier could not run; see the error returned from `run`.
    Aborted,
}

/// Periodic progress sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Attempts completed so far, across all lengths.
    pub attempts: u64,
    /// Length currently being searched.
    pub length: usize,
    /// Last candidate of the batch that crossed the interval.
    pub last_candidate: String,
}

/// Receives search events from the coordinator.
///
/// All methods default to doing nothing.
pub trait ProgressSink {
    /// A new length is about to be searched. `total` is `None` if the count
    /// does not fit in a `u128`.
    fn length_started(&self, _length: usize, _total: Option<u128>) {}

    /// A batch drained; `attempts` is the running total.
    fn batch_completed(&self, _attempts: u64) {}

    /// The running total crossed a multiple of the progress interval.
    fn progress(&self, _observation: &Progress) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(String),
    Exhausted,
}

/// Final result of a completed search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub attempts: u64,
    pub elapsed: Duration,
}

#[derive(Debug)]
struct Tally {
    attempts: u64,
    interval: u64,
}

impl Tally {
    fn record(&mut self, batch: &Batch, length: usize, sink: &dyn ProgressSink) {
        let before = self.attempts;
        self.attempts += batch.len() as u64;
        sink.batch_completed(self.attempts);

        if before / self.interval != self.attempts / self.interval {
            let observation = Progress {
                attempts: self.attempts,
                length,
                last_candidate: batch.last().unwrap_or_default().to_owned(),
            };
            debug!(
                attempts = observation.attempts,
                candidate = %observation.last_candidate,
                "progress"
            );
            sink.progress(&observation);
        }
    }
}

/// Owns the search state and drives generator, scheduler and verifier.
pub struct Coordinator<V> {
    config: SearchConfig,
    verifier: V,
    state: SearchState,
    tally: Tally,
}

impl<V: Verifier> Coordinator<V> {
    /// Validates the configuration; nothing is verified until [`run`](Self::run).
    pub fn new(config: SearchConfig, verifier: V) -> Result<Self, ConfigError> {
        config.validate()?;
        let tally = Tally {
            attempts: 0,
            interval: config.progress_interval,
        };
        Ok(Self {
            config,
            verifier,
            state: SearchState::Idle,
            tally,
        })
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn attempts(&self) -> u64 {
        self.tally.attempts
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the search to a terminal state.
    ///
    /// Returns `Err` only for setup failures and escalated verifier errors; a
    /// search that tried everything without a hit is `Ok` with
    /// [`SearchOutcome::Exhausted`].
    pub fn run(&mut self, sink: &dyn ProgressSink) -> Result<SearchReport, SearchError> {
        if self.state != SearchState::Idle {
            return Err(SearchError::AlreadyStarted);
        }
        self.state = SearchState::Searching;
        let start = Instant::now();

        let outcome = match self.search(sink) {
            Ok(Some(password)) => {
                info!(attempts = self.tally.attempts, "password found");
                self.state = SearchState::Found(password.clone());
                SearchOutcome::Found(password)
            }
            Ok(None) => {
                info!(attempts = self.tally.attempts, "search space exhausted");
                self.state = SearchState::Exhausted;
                SearchOutcome::Exhausted
            }
            Err(e) => {
                self.state = SearchState::Aborted;
                return Err(e);
            }
        };

        Ok(SearchReport {
            outcome,
            attempts: self.tally.attempts,
            elapsed: start.elapsed(),
        })
    }

    fn search(&mut self, sink: &dyn ProgressSink) -> Result<Option<String>, SearchError> {
        let scheduler = BatchScheduler::new(&self.verifier, self.config.concurrency)?;
        let alphabet = &self.config.alphabet;
        let tally = &mut self.tally;

        for &length in &self.config.lengths {
            let candidates = Permutations::new(alphabet, length)?;
            let total = permutation_count(alphabet.len(), length);
            info!(
                length,
                charset = alphabet.len(),
                candidates = ?total,
                "trying length"
            );
            sink.length_started(length, total);

            let found = scheduler.run(candidates, |batch| tally.record(batch, length, sink))?;
            if found.is_some() {
                return Ok(found);
            }
        }

        Ok(None)
    }
}
