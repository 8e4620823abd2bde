//! Password verification against the target archive.

use std::ffi::OsString;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{ConfigError, VerifyError};

/// Result of a single verification attempt that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The archive unlocked with this password.
    Success(String),
    /// Wrong password.
    Failure,
}

/// Tests one candidate password against the archive.
///
/// Implementations must report a wrong password as `Ok(Outcome::Failure)` and
/// reserve `Err` for the cases where no verdict could be reached.
pub trait Verifier: Send + Sync {
    fn attempt(&self, candidate: &str) -> Result<Outcome, VerifyError>;
}

impl<V: Verifier + ?Sized> Verifier for &V {
    fn attempt(&self, candidate: &str) -> Result<Outcome, VerifyError> {
        (**self).attempt(candidate)
    }
}

impl<V: Verifier + ?Sized> Verifier for Box<V> {
    fn attempt(&self, candidate: &str) -> Result<Outcome, VerifyError> {
        (**self).attempt(candidate)
    }
}

/// In-process ZIP verifier.
///
/// The archive is parsed once; each attempt decrypts the first encrypted entry
/// from a clone that shares the parsed central directory.
#[derive(Debug, Clone)]
pub struct ZipVerifier {
    archive: ZipArchive<Cursor<Arc<[u8]>>>,
    entry: usize,
}

impl ZipVerifier {
    pub fn open(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::UnreadableArchive {
            path: path.to_path_buf(),
            source: ZipError::Io(source),
        })?;
        Self::from_bytes(bytes, path)
    }

    fn from_bytes(bytes: Vec<u8>, path: &Path) -> Result<Self, ConfigError> {
        let unreadable = |source| ConfigError::UnreadableArchive {
            path: path.to_path_buf(),
            source,
        };

        let bytes: Arc<[u8]> = bytes.into();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(unreadable)?;

        let mut target = None;
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index).map_err(unreadable)?;
            if file.encrypted() && !file.is_dir() {
                debug!(entry = file.name(), index, "verifying against entry");
                target = Some(index);
                break;
            }
        }

        let entry = target.ok_or_else(|| ConfigError::ArchiveNotEncrypted(path.to_path_buf()))?;
        Ok(Self { archive, entry })
    }
}

impl Verifier for ZipVerifier {
    fn attempt(&self, candidate: &str) -> Result<Outcome, VerifyError> {
        let mut archive = self.archive.clone();
        let mut file = match archive.by_index_decrypt(self.entry, candidate.as_bytes()) {
            Ok(file) => file,
            Err(ZipError::InvalidPassword) => return Ok(Outcome::Failure),
            Err(e) => return Err(e.into()),
        };

        // The header check only covers one or two bytes; a collision shows up
        // as a CRC or authentication failure once the payload is read.
        match io::copy(&mut file, &mut io::sink()) {
            Ok(_) => Ok(Outcome::Success(candidate.to_owned())),
            Err(_) => Ok(Outcome::Failure),
        }
    }
}

/// How many times a 7-Zip run that hit the file handle limit is retried.
const OPEN_FILES_RETRIES: u32 = 5;

/// Pause before each retry after the file handle limit was hit.
const OPEN_FILES_BACKOFF: Duration = Duration::from_millis(100);

/// Verifier that shells out to a 7-Zip compatible binary.
///
/// Runs `<program> t -y -p<candidate> <archive>` per attempt, so it handles any
/// format the installed tool can test.
#[derive(Debug, Clone)]
pub struct SevenZipVerifier {
    program: PathBuf,
    archive: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Unlocked,
    WrongPassword,
    OutOfFiles,
    Broken,
}

impl SevenZipVerifier {
    pub fn new(program: impl Into<PathBuf>, archive: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            archive: archive.into(),
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn run_once(&self, candidate: &str) -> Result<(Verdict, std::process::Output), VerifyError> {
        let mut password = OsString::from("-p");
        password.push(candidate);

        let output = Command::new(&self.program)
            .arg("t")
            .arg("-y")
            .arg(password)
            .arg(&self.archive)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| VerifyError::Spawn {
                program: self.program_name(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let verdict = classify(output.status.success(), &stdout, &stderr);
        Ok((verdict, output))
    }
}

fn classify(succeeded: bool, stdout: &str, stderr: &str) -> Verdict {
    if succeeded {
        return Verdict::Unlocked;
    }

    let mentions = |needle: &str| {
        stdout.to_ascii_lowercase().contains(needle) || stderr.to_ascii_lowercase().contains(needle)
    };

    if mentions("wrong password") {
        Verdict::WrongPassword
    } else if mentions("too many open files") {
        Verdict::OutOfFiles
    } else {
        Verdict::Broken
    }
}

impl Verifier for SevenZipVerifier {
    fn attempt(&self, candidate: &str) -> Result<Outcome, VerifyError> {
        let mut retries = 0;
        loop {
            let (verdict, output) = self.run_once(candidate)?;
            match verdict {
                Verdict::Unlocked => return Ok(Outcome::Success(candidate.to_owned())),
                Verdict::WrongPassword => return Ok(Outcome::Failure),
                Verdict::OutOfFiles if retries < OPEN_FILES_RETRIES => {
                    retries += 1;
                    warn!(retries, "too many open files, backing off");
                    thread::sleep(OPEN_FILES_BACKOFF);
                }
                Verdict::OutOfFiles => {
                    return Err(VerifyError::TooManyOpenFiles {
                        program: self.program_name(),
                        retries,
                    });
                }
                Verdict::Broken => {
                    return Err(VerifyError::Tool {
                        program: self.program_name(),
                        status: output.status.to_string(),
                        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{AesMode, ZipWriter};

    fn build_zip(password: Option<&str>) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .add_directory("docs/", SimpleFileOptions::default())
            .unwrap();
        let options = match password {
            Some(pw) => SimpleFileOptions::default().with_aes_encryption(AesMode::Aes256, pw),
            None => SimpleFileOptions::default(),
        };
        writer.start_file("docs/secret.txt", options).unwrap();
        writer.write_all(b"the eagle lands at midnight").unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_verifier_accepts_only_the_real_password() {
        let verifier = ZipVerifier::from_bytes(build_zip(Some("cab")), Path::new("t.zip")).unwrap();
        assert_eq!(
            verifier.attempt("cab").unwrap(),
            Outcome::Success("cab".to_owned())
        );
        assert_eq!(verifier.attempt("abc").unwrap(), Outcome::Failure);
        assert_eq!(verifier.attempt("").unwrap(), Outcome::Failure);
    }

    #[test]
    fn test_zip_verifier_is_reusable_across_threads() {
        let verifier = ZipVerifier::from_bytes(build_zip(Some("ok")), Path::new("t.zip")).unwrap();
        let verifier = &verifier;
        thread::scope(|s| {
            let handles: Vec<_> = ["no", "ok", "ko", "ok"]
                .into_iter()
                .map(|pw| s.spawn(move || verifier.attempt(pw).unwrap()))
                .collect();
            let outcomes: Vec<Outcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            assert_eq!(
                outcomes,
                vec![
                    Outcome::Failure,
                    Outcome::Success("ok".to_owned()),
                    Outcome::Failure,
                    Outcome::Success("ok".to_owned()),
                ]
            );
        });
    }

    #[test]
    fn test_unencrypted_zip_is_rejected() {
        let err = ZipVerifier::from_bytes(build_zip(None), Path::new("plain.zip")).unwrap_err();
        assert!(matches!(err, ConfigError::ArchiveNotEncrypted(_)));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let err =
            ZipVerifier::from_bytes(b"not a zip at all".to_vec(), Path::new("junk.zip")).unwrap_err();
        assert!(matches!(err, ConfigError::UnreadableArchive { .. }));
    }

    #[test]
    fn test_open_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&build_zip(Some("xy"))).unwrap();
        let verifier = ZipVerifier::open(file.path()).unwrap();
        assert_eq!(
            verifier.attempt("xy").unwrap(),
            Outcome::Success("xy".to_owned())
        );
    }

    #[test]
    fn test_classify_seven_zip_output() {
        assert_eq!(classify(true, "Everything is Ok", ""), Verdict::Unlocked);
        assert_eq!(
            classify(false, "", "ERROR: Wrong password : secret.txt"),
            Verdict::WrongPassword
        );
        assert_eq!(
            classify(
                false,
                "ERROR: Data Error in encrypted file. Wrong password? : secret.txt",
                ""
            ),
            Verdict::WrongPassword
        );
        assert_eq!(
            classify(false, "", "ERROR: errno=24 : Too many open files"),
            Verdict::OutOfFiles
        );
        assert_eq!(
            classify(false, "", "ERROR: t.zip: Can not open the file as archive"),
            Verdict::Broken
        );
    }

    #[test]
    fn test_missing_program_is_an_execution_error() {
        let verifier = SevenZipVerifier::new("/nonexistent/bin/7z-not-installed", "t.zip");
        let err = verifier.attempt("abc").unwrap_err();
        assert!(matches!(err, VerifyError::Spawn { .. }));
    }
}
