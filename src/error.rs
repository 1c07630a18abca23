use thiserror::Error;

/// Domain errors raised while turning a file into a dataset.
///
/// Row-level problems are not errors: bad rows are dropped and counted in the
/// cleaning report instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("input is missing required column '{0}'")]
    MissingColumn(String),

    #[error("no preset matches the columns of this file")]
    NoMatchingPreset,

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}
