//! The analysis-engine boundary.
//!
//! The workspace registers projects, documents, and references with an
//! [`AnalysisEngine`] and receives diagnostics back as a stream of
//! [`DiagnosticsUpdate`]s keyed by document id. The engine performs the
//! actual semantic analysis; this crate only keeps it informed.

use camino::Utf8Path;

use crate::document::Range;
use crate::options::CompilationOptions;
use crate::DocumentId;
use crate::ProjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
    Hint,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub message: String,
    pub range: Option<Range>,
    pub code: Option<String>,
}

/// One batch of diagnostics produced by the engine.
///
/// `document` is absent for updates that are not addressable to a single
/// document (e.g. project-wide analysis state); the router ignores those.
#[derive(Debug, Clone)]
pub struct DiagnosticsUpdate {
    pub document: Option<DocumentId>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Sink for workspace structure and text, implemented by the semantic
/// analysis subsystem.
///
/// Calls arrive in graph-mutation order from the single workspace owner;
/// implementations deliver resulting diagnostics on their own schedule
/// through the update stream the router consumes.
pub trait AnalysisEngine: Send + Sync {
    fn project_added(&self, project: ProjectId, options: &CompilationOptions);
    fn project_removed(&self, project: ProjectId);
    fn metadata_reference_added(&self, project: ProjectId, path: &Utf8Path);
    fn project_reference_added(&self, from: ProjectId, to: ProjectId);
    fn document_added(&self, project: ProjectId, document: DocumentId, path: &Utf8Path);
    fn document_removed(&self, document: DocumentId);
    /// Also serves as the request for an initial diagnostics pass.
    fn document_opened(&self, document: DocumentId, text: &str);
    fn document_changed(&self, document: DocumentId, text: &str, version: i32);
    fn document_closed(&self, document: DocumentId);
}

/// Engine that ignores everything. Placeholder for wiring and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEngine;

impl AnalysisEngine for NullEngine {
    fn project_added(&self, _project: ProjectId, _options: &CompilationOptions) {}
    fn project_removed(&self, _project: ProjectId) {}
    fn metadata_reference_added(&self, _project: ProjectId, _path: &Utf8Path) {}
    fn project_reference_added(&self, _from: ProjectId, _to: ProjectId) {}
    fn document_added(&self, _project: ProjectId, _document: DocumentId, _path: &Utf8Path) {}
    fn document_removed(&self, _document: DocumentId) {}
    fn document_opened(&self, _document: DocumentId, _text: &str) {}
    fn document_changed(&self, _document: DocumentId, _text: &str, _version: i32) {}
    fn document_closed(&self, _document: DocumentId) {}
}
