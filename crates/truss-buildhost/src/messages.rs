//! Wire types shared with the build-evaluation host.

use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use serde::Deserialize;
use serde::Serialize;

/// A request frame. `method` selects the host operation, `params` carries
/// the operation arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    GetHostVersion,
    GetTargetFrameworks {
        project: Utf8PathBuf,
    },
    GetTaskItems {
        target: String,
        project: Utf8PathBuf,
        properties: Vec<Property>,
    },
    GetProjectReferences {
        project: Utf8PathBuf,
    },
}

/// A global build property passed into evaluation (e.g. `TargetFramework`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

impl Property {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildSeverity {
    Error,
    Warning,
    Info,
}

/// One structured message produced while evaluating a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildDiagnostic {
    pub severity: BuildSeverity,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<Utf8PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Result-or-diagnostics envelope wrapping every host response.
///
/// `error` is set when the host could not evaluate at all; `diagnostics`
/// may accompany either outcome.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub diagnostics: Vec<BuildDiagnostic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostVersion {
    pub version: String,
}

/// One resolved item from an evaluated target (e.g. a reference path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskItem {
    pub spec: Utf8PathBuf,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Payload of `GetTaskItems`: the resolved items plus the project's
/// evaluated properties after running the target.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskItems {
    pub items: Vec<TaskItem>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}
