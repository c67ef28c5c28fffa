//! CLI errors.

use defectmark_core::{ConfigError, ExportError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid script: {0}")]
    Script(#[from] serde_json::Error),
    #[error("Failed to read image dimensions: {0}")]
    Image(#[from] image::ImageError),
    #[error("Script image has no size: give a path or a width and height")]
    MissingImageSize,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type CliResult<T> = Result<T, CliError>;
