//! Fixed-layout (PDF) rendering.
//!
//! Conversion engines read markup from a file path, so each call writes the
//! markup to its own temporary artifact. The artifact is a
//! [`NamedTempFile`] guard: it is removed when the guard drops, which happens
//! on every return path of [`PdfRenderer::render_bytes`].

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::core::Report;
use crate::error::RenderError;
use crate::render::{FixedLayoutEngine, MarkupRenderer};

pub const ARTIFACT_PREFIX: &str = "cookiereport-";
pub const ARTIFACT_SUFFIX: &str = ".html";

/// Where temporary markup artifacts are created.
pub trait ScratchSpace: Send + Sync {
    /// Creates a new, uniquely named artifact. Dropping it removes the file.
    fn acquire(&self) -> io::Result<NamedTempFile>;
}

#[derive(Debug, Clone, Default)]
pub struct TempScratch {
    dir: Option<PathBuf>,
}

impl TempScratch {
    /// Uses `dir` instead of the system temp directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl ScratchSpace for TempScratch {
    fn acquire(&self) -> io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(ARTIFACT_PREFIX).suffix(ARTIFACT_SUFFIX);
        match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }
}

pub struct PdfRenderer {
    endpoint: String,
    engine: Arc<dyn FixedLayoutEngine>,
    scratch: Arc<dyn ScratchSpace>,
}

impl PdfRenderer {
    pub fn new(endpoint: impl Into<String>, engine: Arc<dyn FixedLayoutEngine>) -> Self {
        Self {
            endpoint: endpoint.into(),
            engine,
            scratch: Arc::new(TempScratch::default()),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn FixedLayoutEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_scratch(mut self, scratch: Arc<dyn ScratchSpace>) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn render_bytes(&self, report: &Report, markup: &dyn MarkupRenderer) -> Result<Vec<u8>, RenderError> {
        let text = markup.render_markup(report).map_err(RenderError::Markup)?;

        let mut artifact = self.scratch.acquire().map_err(RenderError::ArtifactWrite)?;
        tracing::debug!(
            path = %artifact.path().display(),
            bytes = text.len(),
            "writing markup artifact"
        );
        write_artifact(&mut artifact, &text).map_err(RenderError::ArtifactWrite)?;

        let converted = self
            .engine
            .render_fixed_layout(&self.endpoint, artifact.path())
            .map_err(RenderError::Conversion);
        drop(artifact);

        let blob = converted?;
        tracing::debug!(endpoint = %self.endpoint, bytes = blob.len(), "fixed-layout document rendered");
        Ok(blob)
    }

    /// Renders and then creates or truncates `path`. Nothing touches `path`
    /// unless rendering succeeded.
    pub fn render_to_file(
        &self,
        report: &Report,
        markup: &dyn MarkupRenderer,
        path: &Path,
    ) -> Result<(), RenderError> {
        let blob = self.render_bytes(report, markup)?;
        std::fs::write(path, &blob).map_err(|source| RenderError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = blob.len(), "fixed-layout document written");
        Ok(())
    }
}

fn write_artifact(artifact: &mut NamedTempFile, text: &str) -> io::Result<()> {
    let file = artifact.as_file_mut();
    file.write_all(text.as_bytes())?;
    file.flush()?;
    file.sync_all()
}
