//! Checksum-validated local copy of a remote source
//!
//! A `Cache` is bound to one `Source` and one scratch directory. The first
//! checksum-dependent operation validates the local file or fetches it; the
//! outcome is remembered for the lifetime of the instance.
//!
//! # Cache States
//!
//! | State | Meaning |
//! |-------|---------|
//! | Unchecked | Nothing validated yet, next access hashes or fetches |
//! | Valid | Local file matches the cache key, no further work |
//! | Failed | The remote answered definitively with bad content, replayed without refetching |

use crate::error::{FryerError, FryerResult};
use crate::source::descriptor::Source;
use crate::source::fetch::Fetcher;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
enum CacheState {
    Unchecked,
    Valid { key: String },
    Failed { reason: String },
}

/// Local cached copy of one remote source
pub struct Cache {
    source: Source,
    scratch_dir: PathBuf,
    fetcher: Fetcher,
    state: Mutex<CacheState>,
}

impl Cache {
    pub fn new(source: Source, scratch_dir: PathBuf, fetcher: Fetcher) -> Self {
        Self {
            source,
            scratch_dir,
            fetcher,
            state: Mutex::new(CacheState::Unchecked),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Where the downloaded file lives: scratch dir + URL basename
    pub fn local_path(&self) -> PathBuf {
        self.scratch_dir.join(self.source.file_name())
    }

    /// Make sure the local file is present and matches the cache key.
    ///
    /// Idempotent. Without a configured checksum the first call fetches
    /// once and trusts what it got; with one, a matching local file means no
    /// network access at all.
    pub fn ensure_valid(&self) -> FryerResult<()> {
        let _entered = self.source.span().enter();

        let mut state = self
            .state
            .lock()
            .map_err(|_| FryerError::Internal("cache state lock poisoned".to_string()))?;

        match &*state {
            CacheState::Valid { .. } => return Ok(()),
            CacheState::Failed { reason } => {
                return Err(FryerError::CacheUnavailable {
                    url: self.source.url().to_string(),
                    reason: reason.clone(),
                })
            }
            CacheState::Unchecked => {}
        }

        match self.validate_or_fetch() {
            Ok(key) => {
                *state = CacheState::Valid { key };
                Ok(())
            }
            Err(e) => {
                if is_definitive(&e) {
                    *state = CacheState::Failed {
                        reason: e.to_string(),
                    };
                }
                Err(e)
            }
        }
    }

    /// Expected checksum if configured, otherwise the digest observed by
    /// the first fetch. Call `ensure_valid` first when no checksum is set.
    pub fn cachekey(&self) -> FryerResult<String> {
        if let Some(expected) = self.source.expected_digest() {
            return Ok(expected.to_string());
        }

        let state = self
            .state
            .lock()
            .map_err(|_| FryerError::Internal("cache state lock poisoned".to_string()))?;
        match &*state {
            CacheState::Valid { key } => Ok(key.clone()),
            _ => Err(FryerError::CacheNotReady(self.source.url().to_string())),
        }
    }

    /// Validate, then hand out the local file path
    pub fn validated_path(&self) -> FryerResult<PathBuf> {
        self.ensure_valid()?;
        Ok(self.local_path())
    }

    fn validate_or_fetch(&self) -> FryerResult<String> {
        let path = self.local_path();
        let algorithm = self.source.checksum_algorithm();

        let Some(expected) = self.source.expected_digest() else {
            let fetched = self.fetcher.fetch(self.source.url(), &path, algorithm)?;
            debug!(checksum = %fetched.digest, "Trusting first fetch");
            return Ok(fetched.digest);
        };

        if self.local_digest(&path)?.as_deref() == Some(expected) {
            debug!(path = %path.display(), "Found valid cache");
            return Ok(expected.to_string());
        }

        let fetched = self.fetcher.fetch(self.source.url(), &path, algorithm)?;
        if fetched.digest != expected {
            return Err(FryerError::ChecksumMismatch {
                url: fetched.final_url,
                expected: expected.to_string(),
                actual: fetched.digest,
            });
        }

        Ok(expected.to_string())
    }

    /// Hash of the existing local file; a missing file is simply "no digest"
    fn local_digest(&self, path: &Path) -> FryerResult<Option<String>> {
        match self.source.checksum_algorithm().hash_file(path) {
            Ok(digest) => Ok(Some(digest)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FryerError::io(
                format!("hashing cached file {}", path.display()),
                e,
            )),
        }
    }
}

/// Failures where the remote gave a final answer; retrying would fetch the same thing
fn is_definitive(err: &FryerError) -> bool {
    matches!(
        err,
        FryerError::ChecksumMismatch { .. }
            | FryerError::HttpStatus { .. }
            | FryerError::TooManyRedirects { .. }
    )
}
