use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest contains no jobs")]
    Empty,
}

/// One file to convert, with the overrides the session would otherwise
/// infer from the file itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionJob {
    pub filepath: PathBuf,
    #[serde(default)]
    pub pipeshape: Option<String>,
    #[serde(default)]
    pub pipesize: Option<String>,
    #[serde(default)]
    pub sitename: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

impl ConversionJob {
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        ConversionJob {
            filepath: filepath.into(),
            pipeshape: None,
            pipesize: None,
            sitename: None,
            start: None,
            end: None,
        }
    }

    pub fn with_pipe(mut self, pipeshape: &str, pipesize: &str) -> Self {
        self.pipeshape = Some(pipeshape.to_string());
        self.pipesize = Some(pipesize.to_string());
        self
    }
}

/// JSON array of [`ConversionJob`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchManifest {
    pub jobs: Vec<ConversionJob>,
}

impl BatchManifest {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let manifest: BatchManifest = serde_json::from_str(json)?;
        if manifest.jobs.is_empty() {
            return Err(ConfigError::Empty);
        }
        Ok(manifest)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
