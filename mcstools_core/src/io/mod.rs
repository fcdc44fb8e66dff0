//! Module for reading and writing Models
//!
//! The format is chosen from the file extension: `.json` for cobra JSON models, `.xml` and
//! `.sbml` for SBML.
use std::path::Path;

use thiserror::Error;

use crate::io::json::JsonError;
use crate::io::sbml::SbmlError;
use crate::metabolic_model::model::Model;

pub mod gpr;
pub mod json;
pub mod sbml;

/// Supported model file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Sbml,
}

impl ModelFormat {
    /// Format of a model file, from its extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ModelFormat, IoError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("json") => Ok(ModelFormat::Json),
            Some("xml") | Some("sbml") => Ok(ModelFormat::Sbml),
            _ => Err(IoError::UnsupportedExtension(path.display().to_string())),
        }
    }
}

/// Read a model, the format is chosen from the extension of `path`
pub fn read_model<P: AsRef<Path>>(path: P) -> Result<Model, IoError> {
    let path = path.as_ref();
    match ModelFormat::from_path(path)? {
        ModelFormat::Json => Ok(Model::read_json(path)?),
        ModelFormat::Sbml => Ok(Model::read_sbml(path)?),
    }
}

/// Write a model, as JSON for a `.json` path and as SBML otherwise
pub fn write_model<P: AsRef<Path>>(model: &Model, path: P) -> Result<(), IoError> {
    let path = path.as_ref();
    match ModelFormat::from_path(path) {
        Ok(ModelFormat::Json) => model.write_json(path)?,
        _ => model.write_sbml(path)?,
    }
    Ok(())
}

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unsupported model file {0}, expected a .json, .xml or .sbml file")]
    UnsupportedExtension(String),
    #[error(transparent)]
    Json(#[from] JsonError),
    #[error(transparent)]
    Sbml(#[from] SbmlError),
}
