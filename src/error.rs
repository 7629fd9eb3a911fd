use std::path::PathBuf;

/// Failure of a single rendering call. The report and task stay usable.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to encode report as JSON")]
    Encoding(#[source] serde_json::Error),
    #[error("failed to decode report JSON")]
    Decoding(#[source] serde_json::Error),
    #[error("markup renderer failed")]
    Markup(#[source] anyhow::Error),
    #[error("failed to write temporary markup artifact")]
    ArtifactWrite(#[source] std::io::Error),
    #[error("fixed-layout conversion failed")]
    Conversion(#[source] anyhow::Error),
    #[error("failed to write {}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("message formatter failed")]
    Message(#[source] anyhow::Error),
}
