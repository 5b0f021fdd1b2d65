//! Archive adapters
//!
//! Every source kind can produce a normalized tar stream of its contents
//! and materialize those contents into a directory. The adapter is chosen
//! from a fixed extension registry.
//!
//! | Kind | `tar_io` | `copy_to` |
//! |------|----------|-----------|
//! | Tar | local file as-is | `tar -xf` |
//! | TarGz | gzip-decoded local file | `tar -xf` |
//! | TarBz2 | `bzcat` stdout | `tar -xf` |
//! | Zip | `tar -c` of a directory unpacked once per cache key | unzip into destination |
//! | Plain | synthesized single-entry tar | file copy |

use crate::error::{FryerError, FryerResult};
use crate::source::cache::Cache;
use crate::source::descriptor::{FileMapping, Source};
use crate::source::exec;
use crate::stream::{tarball, ByteSource, JoinedReader};
use flate2::read::GzDecoder;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Source archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Tar,
    TarGz,
    TarBz2,
    Zip,
    /// A single non-archive blob
    Plain,
}

/// Extension registry, in match priority order
const REGISTRY: &[(&str, ArchiveKind)] = &[
    (".tar", ArchiveKind::Tar),
    (".tar.gz", ArchiveKind::TarGz),
    (".tgz", ArchiveKind::TarGz),
    (".tar.bz2", ArchiveKind::TarBz2),
    (".zip", ArchiveKind::Zip),
    (".bin", ArchiveKind::Plain),
    (".bundle", ArchiveKind::Plain),
];

impl ArchiveKind {
    /// Look up a registered extension (leading dot included)
    pub fn from_extension(extension: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, kind)| *kind)
    }

    /// First registered extension the path ends with
    pub fn detect(path: &str) -> Option<(&'static str, Self)> {
        REGISTRY
            .iter()
            .find(|(ext, _)| path.ends_with(ext))
            .copied()
    }

    /// All registered extensions
    pub fn extensions() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(ext, _)| *ext)
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::Zip => "zip",
            Self::Plain => "plain",
        };
        write!(f, "{}", name)
    }
}

/// A cached source seen through its format adapter
pub struct SourceArchive {
    kind: ArchiveKind,
    cache: Cache,
    unpack_lock: Mutex<()>,
}

impl SourceArchive {
    pub fn new(kind: ArchiveKind, cache: Cache) -> Self {
        Self {
            kind,
            cache,
            unpack_lock: Mutex::new(()),
        }
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn source(&self) -> &Source {
        self.cache.source()
    }

    pub fn file_map(&self) -> &[FileMapping] {
        self.cache.source().file_map()
    }

    pub fn cachekey(&self) -> FryerResult<String> {
        self.cache.ensure_valid()?;
        self.cache.cachekey()
    }

    /// Normalized tar stream of the source's contents
    pub fn tar_io(&self) -> FryerResult<ByteSource> {
        let path = self.cache.validated_path()?;
        let _entered = self.source().span().enter();
        debug!(kind = %self.kind, path = %path.display(), "Opening tar stream");

        match self.kind {
            ArchiveKind::Tar => Ok(Box::new(BufReader::new(open(&path)?))),
            ArchiveKind::TarGz => Ok(Box::new(GzDecoder::new(BufReader::new(open(&path)?)))),
            ArchiveKind::TarBz2 => {
                let path = path_arg(&path)?;
                Ok(Box::new(exec::spawn_reader("bzcat", &[path], None)?))
            }
            ArchiveKind::Zip => {
                let dir = self.unpacked_dir()?;
                Ok(Box::new(exec::spawn_reader("tar", &["-c", "."], Some(&dir))?))
            }
            ArchiveKind::Plain => plain_tar(&path),
        }
    }

    /// Materialize the source's contents into an existing directory
    pub fn copy_to(&self, dst: &Path) -> FryerResult<()> {
        let path = self.cache.validated_path()?;
        let _entered = self.source().span().enter();
        debug!(kind = %self.kind, dst = %dst.display(), "Copying contents");

        match self.kind {
            ArchiveKind::Tar | ArchiveKind::TarGz | ArchiveKind::TarBz2 => {
                exec::run("tar", &["-xf", path_arg(&path)?, "-C", path_arg(dst)?])
            }
            ArchiveKind::Zip => unzip(&path, dst),
            ArchiveKind::Plain => {
                let target = dst.join(self.source().file_name());
                fs::copy(&path, &target).map_err(|e| {
                    FryerError::io(
                        format!("copying {} to {}", path.display(), target.display()),
                        e,
                    )
                })?;
                Ok(())
            }
        }
    }

    /// Directory named by cache key holding the extracted zip.
    ///
    /// Extraction goes to `<key>.tmp` first and is renamed into place, so a
    /// directory under the final name is always complete and is reused as is.
    fn unpacked_dir(&self) -> FryerResult<PathBuf> {
        let key = self.cachekey()?;
        let dir = self.cache.scratch_dir().join(&key);

        let _guard = self
            .unpack_lock
            .lock()
            .map_err(|_| FryerError::Internal("unpack lock poisoned".to_string()))?;

        if dir.is_dir() {
            debug!(dir = %dir.display(), "Reusing unpacked directory");
            return Ok(dir);
        }

        let workdir = self.cache.scratch_dir().join(format!("{}.tmp", key));
        if workdir.exists() {
            debug!(dir = %workdir.display(), "Discarding partial extraction");
            fs::remove_dir_all(&workdir)
                .map_err(|e| FryerError::io(format!("removing {}", workdir.display()), e))?;
        }
        fs::create_dir(&workdir)
            .map_err(|e| FryerError::io(format!("creating {}", workdir.display()), e))?;

        self.copy_to(&workdir)?;

        if let Err(e) = fs::rename(&workdir, &dir) {
            // Another process finished first; its copy is just as good
            if dir.is_dir() {
                let _ = fs::remove_dir_all(&workdir);
            } else {
                return Err(FryerError::io(
                    format!("renaming {} to {}", workdir.display(), dir.display()),
                    e,
                ));
            }
        }

        Ok(dir)
    }
}

fn open(path: &Path) -> FryerResult<File> {
    File::open(path).map_err(|e| FryerError::io(format!("opening {}", path.display()), e))
}

fn path_arg(path: &Path) -> FryerResult<&str> {
    path.to_str().ok_or_else(|| FryerError::PathInvalid {
        path: path.to_path_buf(),
        reason: "not valid UTF-8".to_string(),
    })
}

/// Lazily stream a one-entry tar wrapping the file under its basename
fn plain_tar(path: &Path) -> FryerResult<ByteSource> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FryerError::PathInvalid {
            path: path.to_path_buf(),
            reason: "no usable file name".to_string(),
        })?;

    let file = open(path)?;
    let size = file
        .metadata()
        .map_err(|e| FryerError::io(format!("reading metadata of {}", path.display()), e))?
        .len();

    let mut trailer = tarball::padding(size);
    trailer.extend_from_slice(&tarball::end_of_archive());

    Ok(Box::new(JoinedReader::new([
        Box::new(Cursor::new(tarball::file_header(name, size, 0o644)?)) as ByteSource,
        Box::new(BufReader::new(file).take(size)),
        Box::new(Cursor::new(trailer)),
    ])))
}

/// Extract a zip archive into `dst`
fn unzip(path: &Path, dst: &Path) -> FryerResult<()> {
    let mut archive = zip::ZipArchive::new(BufReader::new(open(path)?)).map_err(|e| {
        FryerError::command_exec(format!("unzip {}", path.display()), e.to_string())
    })?;
    archive.extract(dst).map_err(|e| {
        FryerError::command_exec(
            format!("unzip {} -d {}", path.display(), dst.display()),
            e.to_string(),
        )
    })
}
