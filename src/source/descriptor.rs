//! Remote source descriptors
//!
//! A `Source` is the immutable description of one remote build source:
//! where it lives, what kind of archive it is, and which checksum it must
//! hash to. All configuration problems surface here, at construction.

use crate::error::{FryerError, FryerResult};
use crate::source::archive::{ArchiveKind, SourceArchive};
use crate::source::cache::Cache;
use crate::source::checksum::{bare_digest, ChecksumAlgorithm};
use crate::source::fetch::Fetcher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Span;
use ureq::http::Uri;

/// One archive-internal path and where it lands in the build root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMapping {
    pub from: String,
    pub to: String,
}

impl FileMapping {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Optional overrides for a `Source`
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    /// Archive extension, inferred from the URL path when unset
    pub extension: Option<String>,

    /// Expected checksum; trust-on-first-use when unset
    pub checksum: Option<String>,

    /// Ordered file map; defaults to the whole archive into the build root
    pub file_map: Option<Vec<FileMapping>>,

    /// Span that cache, fetch and adapter events are recorded under
    pub span: Option<Span>,
}

/// Immutable description of a remote build source
#[derive(Debug, Clone)]
pub struct Source {
    url: String,
    file_name: String,
    extension: String,
    kind: ArchiveKind,
    checksum: Option<String>,
    algorithm: ChecksumAlgorithm,
    file_map: Vec<FileMapping>,
    span: Span,
}

impl Source {
    /// Describe the source at `url`.
    ///
    /// Fails when the URL has no file name, when no registered extension
    /// matches, or when the checksum has an unknown shape.
    pub fn new(url: &str, options: SourceOptions) -> FryerResult<Self> {
        let uri: Uri = url.parse().map_err(|e: ureq::http::uri::InvalidUri| {
            FryerError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let file_name = uri
            .path()
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .ok_or_else(|| FryerError::InvalidUrl {
                url: url.to_string(),
                reason: "path has no file name".to_string(),
            })?
            .to_string();

        let (extension, kind) = match options.extension {
            Some(ext) => {
                let ext = if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{}", ext)
                };
                let kind = ArchiveKind::from_extension(&ext).ok_or_else(|| {
                    FryerError::UnknownExtension {
                        url: url.to_string(),
                        extension: ext.clone(),
                    }
                })?;
                (ext, kind)
            }
            None => {
                let (ext, kind) =
                    ArchiveKind::detect(uri.path()).ok_or_else(|| FryerError::UnknownExtension {
                        url: url.to_string(),
                        extension: "(none)".to_string(),
                    })?;
                (ext.to_string(), kind)
            }
        };

        let algorithm = ChecksumAlgorithm::guess(options.checksum.as_deref())?;

        let file_map = options
            .file_map
            .unwrap_or_else(|| vec![FileMapping::new("", "")]);

        let span = options
            .span
            .unwrap_or_else(|| tracing::info_span!("source", url = %url));

        Ok(Self {
            url: url.to_string(),
            file_name,
            extension,
            kind,
            checksum: options.checksum,
            algorithm,
            file_map,
            span,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Basename of the URL path, used as the cached file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// The checksum as configured, prefix included
    pub fn checksum(&self) -> Option<&str> {
        self.checksum.as_deref()
    }

    /// The configured checksum as bare hex
    pub fn expected_digest(&self) -> Option<&str> {
        self.checksum.as_deref().map(bare_digest)
    }

    pub fn checksum_algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn file_map(&self) -> &[FileMapping] {
        &self.file_map
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Bind this source to a scratch directory, picking the archive
    /// adapter registered for its extension.
    pub fn build_cache(&self, scratch_dir: impl Into<PathBuf>, fetcher: Fetcher) -> SourceArchive {
        SourceArchive::new(
            self.kind,
            Cache::new(self.clone(), scratch_dir.into(), fetcher),
        )
    }
}
