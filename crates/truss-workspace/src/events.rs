use crate::DocumentId;
use crate::ProjectId;

/// Structural change notifications published by the workspace.
///
/// Delivered over a broadcast channel; consumers that lag miss events
/// rather than block graph mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    ProjectAdded(ProjectId),
    ProjectRemoved(ProjectId),
    DocumentAdded(DocumentId),
    ProjectReferenceAdded { from: ProjectId, to: ProjectId },
    DocumentOpened(DocumentId),
    DocumentClosed(DocumentId),
    DocumentTextChanged { document: DocumentId, version: i32 },
}
