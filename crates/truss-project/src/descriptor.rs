use std::collections::BTreeMap;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Serialize;

/// Evaluated property names read off the `GetTaskItems` payload.
pub mod properties {
    pub const OUTPUT_TYPE: &str = "OutputType";
    pub const ASSEMBLY_NAME: &str = "AssemblyName";
    pub const TARGET_PATH: &str = "TargetPath";
    pub const ALLOW_UNSAFE_BLOCKS: &str = "AllowUnsafeBlocks";
    pub const NO_WARN: &str = "NoWarn";
    pub const SIGN_ASSEMBLY: &str = "SignAssembly";
    pub const ASSEMBLY_ORIGINATOR_KEY_FILE: &str = "AssemblyOriginatorKeyFile";
    pub const DOCUMENTATION_FILE: &str = "DocumentationFile";
}

/// Well-known metadata keys on resolved reference items.
pub mod metadata {
    pub const FULL_PATH: &str = "FullPath";
    pub const PROJECT: &str = "Project";
    pub const REFERENCE_SOURCE_TARGET: &str = "ReferenceSourceTarget";
    pub const VERSION: &str = "Version";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OutputKind {
    Executable,
    Library,
}

impl OutputKind {
    /// Map the evaluated `OutputType` property. Anything unrecognized is
    /// treated as a library, matching how absent output types behave.
    #[must_use]
    pub fn from_property(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("exe") || v.eq_ignore_ascii_case("winexe") => {
                OutputKind::Executable
            }
            _ => OutputKind::Library,
        }
    }
}

/// A resolved metadata reference: file path plus evaluation metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceSpec {
    pub path: Utf8PathBuf,
    pub metadata: BTreeMap<String, String>,
}

/// Immutable snapshot of one project's evaluated build state.
///
/// Built once per project load from build-host output. A change to the
/// underlying build inputs requires a fresh evaluation and a new
/// descriptor, never in-place mutation.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDescriptor {
    pub name: String,
    pub assembly_name: String,
    pub output_kind: OutputKind,
    /// Path of the project file itself.
    pub path: Utf8PathBuf,
    /// Build output path, when the evaluation reported one.
    pub target_path: Option<Utf8PathBuf>,
    pub allow_unsafe: bool,
    /// Diagnostic ids from `NoWarn`, in declaration order.
    pub suppressed_diagnostics: Vec<String>,
    pub signing_key_path: Option<Utf8PathBuf>,
    pub documentation_path: Option<Utf8PathBuf>,
    pub target_framework: Option<String>,
    /// Resolved assembly references, in evaluation order.
    pub references: Vec<ReferenceSpec>,
    /// Declared project-to-project references, relative to the project
    /// directory, unresolved until the whole solution is loaded.
    pub project_references: Vec<String>,
}

impl ProjectDescriptor {
    /// Directory containing the project file.
    #[must_use]
    pub fn directory(&self) -> &Utf8Path {
        self.path.parent().unwrap_or_else(|| Utf8Path::new(""))
    }
}
