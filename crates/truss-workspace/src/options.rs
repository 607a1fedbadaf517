use std::collections::BTreeSet;

use camino::Utf8PathBuf;
use truss_project::OutputKind;
use truss_project::ProjectDescriptor;

/// Assembly-reference unification warnings, suppressed for every project
/// regardless of what the project itself declares.
pub const BASELINE_SUPPRESSED_DIAGNOSTICS: [&str; 3] = ["CS1701", "CS1702", "CS1705"];

/// Compiler-facing options derived from a project descriptor when the
/// project is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationOptions {
    pub output_kind: OutputKind,
    pub allow_unsafe: bool,
    pub suppressed_diagnostics: BTreeSet<String>,
    pub signing_key_path: Option<Utf8PathBuf>,
    pub documentation_path: Option<Utf8PathBuf>,
}

impl CompilationOptions {
    #[must_use]
    pub fn from_descriptor(descriptor: &ProjectDescriptor) -> Self {
        let mut suppressed_diagnostics: BTreeSet<String> = BASELINE_SUPPRESSED_DIAGNOSTICS
            .iter()
            .map(|id| (*id).to_string())
            .collect();

        for id in &descriptor.suppressed_diagnostics {
            suppressed_diagnostics.insert(id.clone());
        }

        Self {
            output_kind: descriptor.output_kind,
            allow_unsafe: descriptor.allow_unsafe,
            suppressed_diagnostics,
            signing_key_path: descriptor.signing_key_path.clone(),
            documentation_path: descriptor.documentation_path.clone(),
        }
    }
}
