//! The narrow contract standing in for the solution-file parser.
//!
//! Parsing `.sln` is out of scope; anything that can produce the declared
//! project list in declaration order can drive a load. A JSON manifest
//! reader is provided for the CLI and tests.

use std::fs;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse manifest {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A solution's declared projects, in declaration order.
pub trait SolutionManifest {
    fn name(&self) -> &str;
    /// Absolute project-file paths, in the order the solution declares
    /// them. Order is observable (it decides load order) but does not
    /// affect reference resolution, which runs after all projects exist.
    fn projects(&self) -> &[Utf8PathBuf];
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    projects: Vec<String>,
}

/// `{"projects": ["App/App.csproj", ...]}`, paths relative to the
/// manifest file.
#[derive(Debug)]
pub struct JsonManifest {
    name: String,
    projects: Vec<Utf8PathBuf>,
}

impl JsonManifest {
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawManifest =
            serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let directory = path.parent().unwrap_or_else(|| Utf8Path::new(""));
        Ok(Self {
            name: path.file_stem().unwrap_or("solution").to_string(),
            projects: raw
                .projects
                .into_iter()
                .map(|project| directory.join(project))
                .collect(),
        })
    }
}

impl SolutionManifest for JsonManifest {
    fn name(&self) -> &str {
        &self.name
    }

    fn projects(&self) -> &[Utf8PathBuf] {
        &self.projects
    }
}
