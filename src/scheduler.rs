//! Batch-at-a-time dispatch of verification attempts.

use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
use tracing::warn;

use crate::error::{SearchError, VerifyError};
use crate::verifier::{Outcome, Verifier};

/// Candidates verified together in one dispatch round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub candidates: Vec<String>,
}

impl Batch {
    /// Pulls up to `limit` candidates. Returns `None` once the stream is dry.
    pub fn pull<I: Iterator<Item = String>>(stream: &mut I, limit: usize) -> Option<Self> {
        let candidates: Vec<String> = stream.by_ref().take(limit).collect();
        if candidates.is_empty() {
            None
        } else {
            Some(Self { candidates })
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.candidates.last().map(String::as_str)
    }
}

/// Runs batches of at most `limit` attempts on a dedicated pool of the same
/// width, one batch at a time.
pub struct BatchScheduler<'v, V: ?Sized> {
    pool: ThreadPool,
    verifier: &'v V,
    limit: usize,
}

impl<'v, V: Verifier + ?Sized> BatchScheduler<'v, V> {
    pub fn new(verifier: &'v V, limit: usize) -> Result<Self, SearchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(limit)
            .thread_name(|i| format!("verifier-{i}"))
            .build()?;

        Ok(Self {
            pool,
            verifier,
            limit,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Verifies every candidate in the batch and waits for all of them.
    /// Outcomes line up with `batch.candidates`.
    pub fn dispatch(&self, batch: &Batch) -> Vec<Result<Outcome, VerifyError>> {
        let verifier = self.verifier;
        self.pool.install(|| {
            batch
                .candidates
                .par_iter()
                .map(|candidate| verifier.attempt(candidate))
                .collect()
        })
    }

    /// Drives the stream batch by batch until a password is found or the
    /// stream runs out.
    ///
    /// `on_batch` runs after each batch drains and before its outcomes are
    /// acted on, so every attempt is counted even when it ends the search.
    pub fn run<I, F>(&self, stream: I, mut on_batch: F) -> Result<Option<String>, SearchError>
    where
        I: IntoIterator<Item = String>,
        F: FnMut(&Batch),
    {
        let mut stream = stream.into_iter();
        while let Some(batch) = Batch::pull(&mut stream, self.limit) {
            let outcomes = self.dispatch(&batch);
            on_batch(&batch);
            if let Some(password) = settle(&batch, outcomes)? {
                return Ok(Some(password));
            }
        }
        Ok(None)
    }
}

/// A success anywhere in the batch wins; otherwise the first execution error
/// aborts the search.
fn settle(
    batch: &Batch,
    outcomes: Vec<Result<Outcome, VerifyError>>,
) -> Result<Option<String>, SearchError> {
    let mut found = None;
    let mut failure = None;

    for (candidate, outcome) in batch.candidates.iter().zip(outcomes) {
        match outcome {
            Ok(Outcome::Success(password)) => {
                if found.is_none() {
                    found = Some(password);
                }
            }
            Ok(Outcome::Failure) => {}
            Err(source) => {
                if failure.is_none() {
                    failure = Some((candidate.clone(), source));
                }
            }
        }
    }

    match (found, failure) {
        (Some(password), Some((candidate, source))) => {
            warn!(%candidate, error = %source, "verifier failed alongside a successful attempt");
            Ok(Some(password))
        }
        (Some(password), None) => Ok(Some(password)),
        (None, Some((candidate, source))) => Err(SearchError::Verifier { candidate, source }),
        (None, None) => Ok(None),
    }
}
