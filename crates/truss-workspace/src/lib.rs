//! The workspace core: a mutable graph of projects, documents, and
//! references, kept consistent with an analysis engine as solutions load
//! and editors open, edit, and close documents.

mod buffers;
mod document;
mod engine;
mod events;
mod options;
mod router;
mod workspace;

pub use buffers::TextBuffer;
pub use document::EditError;
pub use document::LineIndex;
pub use document::Position;
pub use document::Range;
pub use document::TextChange;
pub use document::TextDocument;
pub use engine::AnalysisEngine;
pub use engine::Diagnostic;
pub use engine::DiagnosticSeverity;
pub use engine::DiagnosticsUpdate;
pub use engine::NullEngine;
pub use events::ChangeEvent;
pub use options::CompilationOptions;
pub use options::BASELINE_SUPPRESSED_DIAGNOSTICS;
pub use router::callback;
pub use router::DiagnosticsCallback;
pub use router::DiagnosticsRouter;
pub use router::SubscriptionTable;
pub use workspace::DocumentNode;
pub use workspace::ProjectNode;
pub use workspace::TextSource;
pub use workspace::Workspace;
pub use workspace::WorkspaceError;

/// Stable identifier for a project node.
///
/// Allocated when a project is first added and never reused, even after
/// the project is unloaded.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProjectId(u32);

impl ProjectId {
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        ProjectId(raw)
    }

    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Stable identifier for a document node. Never reused after removal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DocumentId(u32);

impl DocumentId {
    #[must_use]
    pub fn from_raw(raw: u32) -> Self {
        DocumentId(raw)
    }

    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }
}
