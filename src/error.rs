//! Error types for archive password recovery.

use std::path::PathBuf;

use thiserror::Error;

/// Problems with the search configuration, detected before any attempt runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("alphabet is empty")]
    EmptyAlphabet,

    #[error("alphabet contains {0:?} more than once")]
    DuplicateCharacter(char),

    #[error("no candidate lengths configured")]
    NoLengths,

    #[error("length {length} exceeds alphabet size {alphabet}")]
    LengthExceedsAlphabet { length: usize, alphabet: usize },

    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    #[error("progress interval must be at least 1")]
    ZeroProgressInterval,

    #[error("--min ({min}) must be less than or equal to --max ({max})")]
    InvalidRange { min: usize, max: usize },

    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("archive {} has no encrypted entries", .0.display())]
    ArchiveNotEncrypted(PathBuf),

    #[error("failed to read archive {}: {source}", .path.display())]
    UnreadableArchive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

/// The verifier could not produce a verdict for a candidate.
///
/// Distinct from a wrong password, which is an ordinary [`crate::Outcome::Failure`].
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Tool {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{program} kept running out of file handles after {retries} retries")]
    TooManyOpenFiles { program: String, retries: u32 },

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Reasons a search stops without reaching `Found` or `Exhausted`.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("verifier failed on candidate {candidate:?}: {source}")]
    Verifier {
        candidate: String,
        #[source]
        source: VerifyError,
    },

    #[error("failed to initialize thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("search already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, SearchError>;
