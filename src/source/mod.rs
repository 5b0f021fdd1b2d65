//! Remote build sources
//!
//! Fetches a source by URL, validates and caches it by content checksum,
//! and normalizes it into a tar stream whatever its original format.
//!
//! # Flow
//!
//! `Source` (descriptor) → `SourceArchive` (format adapter) → `Cache`
//! (checksum validity) → `Fetcher` (HTTP with bounded redirects).
//!
//! The cache key is the configured checksum, or the digest observed by the
//! first fetch when none is configured (trust-on-first-use).

pub mod archive;
pub mod cache;
pub mod checksum;
pub mod descriptor;
pub mod exec;
pub mod fetch;

pub use archive::{ArchiveKind, SourceArchive};
pub use cache::Cache;
pub use checksum::ChecksumAlgorithm;
pub use descriptor::{FileMapping, Source, SourceOptions};
pub use fetch::{Fetched, Fetcher};
