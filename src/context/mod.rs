//! Build context generation
//!
//! A build context is one tar stream: a small in-memory archive holding the
//! generated Dockerfile and build script, followed by the normalized source
//! archive. The generated part carries no end-of-archive marker, so the two
//! halves read as a single archive.

pub mod render;

pub use render::{Flavour, Variables, BUILD_ROOT, BUILD_SCRIPT_NAME};

use crate::error::FryerResult;
use crate::recipe::Recipe;
use crate::source::{FileMapping, SourceArchive};
use crate::stream::{tarball, ByteSource, JoinedReader};
use std::io::Cursor;
use tracing::debug;

/// File name of the generated Dockerfile inside the context
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Mode of the generated files
const GENERATED_MODE: u32 = 0o777;

/// Everything needed to render and stream one build context
pub struct BuildContext {
    variables: Variables,
    recipe: Recipe,
    source: Option<SourceArchive>,
}

impl BuildContext {
    pub fn new(variables: Variables, recipe: Recipe, source: Option<SourceArchive>) -> Self {
        Self {
            variables,
            recipe,
            source,
        }
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn source(&self) -> Option<&SourceArchive> {
        self.source.as_ref()
    }

    /// Entries added to the image; empty without a source
    pub fn file_map(&self) -> &[FileMapping] {
        self.source
            .as_ref()
            .map(|s| s.file_map())
            .unwrap_or_default()
    }

    pub fn dockerfile(&self) -> FryerResult<String> {
        render::dockerfile(&self.variables, &self.recipe, self.file_map())
    }

    pub fn build_script(&self) -> String {
        render::build_script(&self.recipe)
    }

    /// `.build.sh` and the Dockerfile as an unterminated tar fragment
    pub fn generated_archive(&self) -> FryerResult<Vec<u8>> {
        let dockerfile = self.dockerfile()?;
        let script = self.build_script();

        let mut buf = Vec::new();
        tarball::append_file(&mut buf, BUILD_SCRIPT_NAME, GENERATED_MODE, script.as_bytes())?;
        tarball::append_file(&mut buf, DOCKERFILE_NAME, GENERATED_MODE, dockerfile.as_bytes())?;
        Ok(buf)
    }

    /// The full build context stream.
    ///
    /// Renders first, so configuration errors surface before the source
    /// is fetched or decompressed.
    pub fn tar_io(&self) -> FryerResult<JoinedReader> {
        let generated = self.generated_archive()?;
        debug!(bytes = generated.len(), "Rendered build files");

        let tail: ByteSource = match &self.source {
            Some(source) => source.tar_io()?,
            None => Box::new(Cursor::new(tarball::end_of_archive())),
        };

        Ok(JoinedReader::new([
            Box::new(Cursor::new(generated)) as ByteSource,
            tail,
        ]))
    }
}
