//! Exhaustive password recovery for encrypted archives.
//!
//! Candidates are the permutations of an alphabet (no repeated characters),
//! generated lazily one length at a time, verified in bounded concurrent
//! batches, and the search stops after the first batch that unlocks the
//! archive.

pub mod charset;
pub mod config;
pub mod error;
pub mod generator;
pub mod progress;
pub mod scheduler;
pub mod search;
pub mod verifier;

pub use charset::{Alphabet, Charset};
pub use config::{DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_INTERVAL, SearchConfig};
pub use error::{ConfigError, SearchError, VerifyError};
pub use generator::{Permutations, permutation_count};
pub use progress::ProgressReporter;
pub use scheduler::{Batch, BatchScheduler};
pub use search::{
    Coordinator, NoProgress, Progress, ProgressSink, SearchOutcome, SearchReport, SearchState,
};
pub use verifier::{Outcome, SevenZipVerifier, Verifier, ZipVerifier};
