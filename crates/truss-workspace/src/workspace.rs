//! The project/document graph and its mutation surface.

use std::sync::Arc;

use camino::Utf8Component;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use thiserror::Error;
use tokio::sync::broadcast;
use truss_project::ProjectDescriptor;

use crate::buffers::TextBuffer;
use crate::document::EditError;
use crate::document::TextChange;
use crate::engine::AnalysisEngine;
use crate::events::ChangeEvent;
use crate::options::CompilationOptions;
use crate::router::DiagnosticsCallback;
use crate::router::SubscriptionTable;
use crate::DocumentId;
use crate::ProjectId;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Project {0:?} is not in the workspace")]
    StaleProject(ProjectId),
    #[error("Document {0:?} is not in the workspace")]
    StaleDocument(DocumentId),
    #[error("No document at {0}")]
    UnknownDocumentPath(Utf8PathBuf),
    #[error("{count} documents match {path}; expected exactly one")]
    AmbiguousDocumentPath { path: Utf8PathBuf, count: usize },
    #[error("Project reference from `{from}` to `{target}` matches no loaded project")]
    MissingReferenceTarget { from: String, target: Utf8PathBuf },
    #[error("Project reference from `{from}` to `{target}` matches {count} loaded projects")]
    AmbiguousReferenceTarget {
        from: String,
        target: Utf8PathBuf,
        count: usize,
    },
    #[error("Document {0:?} has no open buffer")]
    NotOpen(DocumentId),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("Failed to read document text: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a closed document's text comes from.
#[derive(Debug, Clone)]
pub enum TextSource {
    /// Read the file on demand.
    OnDisk,
    /// Fixed text captured when the document was last closed.
    Snapshot(Arc<str>),
}

#[derive(Debug)]
pub struct ProjectNode {
    pub id: ProjectId,
    pub descriptor: ProjectDescriptor,
    pub options: CompilationOptions,
    /// Documents in the order they were added.
    pub documents: Vec<DocumentId>,
    /// Resolved project-reference edges out of this project.
    pub project_references: FxHashSet<ProjectId>,
    /// Registered metadata references, in evaluation order.
    pub metadata_references: Vec<Utf8PathBuf>,
}

#[derive(Debug)]
pub struct DocumentNode {
    pub id: DocumentId,
    pub project: ProjectId,
    pub path: Utf8PathBuf,
    pub name: String,
    pub version: i32,
    pub open: bool,
    pub text: TextSource,
}

/// Owner of the workspace graph.
///
/// All structural mutation goes through `&mut self`, so a single owner
/// (or an explicit mutex around the workspace) serializes edits.
/// Diagnostics fan-out runs concurrently through the shared
/// [`SubscriptionTable`] and never takes the graph lock.
pub struct Workspace {
    engine: Arc<dyn AnalysisEngine>,
    projects: FxHashMap<ProjectId, ProjectNode>,
    documents: FxHashMap<DocumentId, DocumentNode>,
    projects_by_name: FxHashMap<String, ProjectId>,
    open_buffers: FxHashMap<DocumentId, TextBuffer>,
    subscriptions: SubscriptionTable,
    events: broadcast::Sender<ChangeEvent>,
    next_project: u32,
    next_document: u32,
}

impl Workspace {
    #[must_use]
    pub fn new(engine: Arc<dyn AnalysisEngine>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine,
            projects: FxHashMap::default(),
            documents: FxHashMap::default(),
            projects_by_name: FxHashMap::default(),
            open_buffers: FxHashMap::default(),
            subscriptions: SubscriptionTable::new(),
            events,
            next_project: 0,
            next_document: 0,
        }
    }

    /// The callback table to hand to [`crate::DiagnosticsRouter::spawn`].
    #[must_use]
    pub fn subscriptions(&self) -> SubscriptionTable {
        self.subscriptions.clone()
    }

    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    /// Register a project from its evaluated descriptor.
    ///
    /// Adding a name that is already present returns the existing project
    /// untouched. Derives compilation options and registers every
    /// resolved metadata reference with the engine.
    pub fn add_project(&mut self, descriptor: ProjectDescriptor) -> ProjectId {
        if let Some(&existing) = self.projects_by_name.get(&descriptor.name) {
            return existing;
        }

        let id = ProjectId::from_raw(self.next_project);
        self.next_project += 1;

        let options = CompilationOptions::from_descriptor(&descriptor);
        self.engine.project_added(id, &options);

        let mut metadata_references = Vec::with_capacity(descriptor.references.len());
        for reference in &descriptor.references {
            self.engine.metadata_reference_added(id, &reference.path);
            metadata_references.push(reference.path.clone());
        }

        tracing::info!(project = %descriptor.name, references = metadata_references.len(), "project added");

        self.projects_by_name.insert(descriptor.name.clone(), id);
        self.projects.insert(
            id,
            ProjectNode {
                id,
                descriptor,
                options,
                documents: Vec::new(),
                project_references: FxHashSet::default(),
                metadata_references,
            },
        );

        self.emit(ChangeEvent::ProjectAdded(id));
        id
    }

    /// Add a source file to a project as a closed, file-backed document.
    pub fn add_document(
        &mut self,
        project: ProjectId,
        path: Utf8PathBuf,
    ) -> Result<DocumentId, WorkspaceError> {
        let node = self
            .projects
            .get_mut(&project)
            .ok_or(WorkspaceError::StaleProject(project))?;

        let id = DocumentId::from_raw(self.next_document);
        self.next_document += 1;

        let name = path.file_name().unwrap_or(path.as_str()).to_string();
        node.documents.push(id);
        self.engine.document_added(project, id, &path);

        self.documents.insert(
            id,
            DocumentNode {
                id,
                project,
                path,
                name,
                version: 0,
                open: false,
                text: TextSource::OnDisk,
            },
        );

        self.emit(ChangeEvent::DocumentAdded(id));
        Ok(id)
    }

    /// Resolve a declared project reference to an edge in the graph.
    ///
    /// `reference` is the declared path, relative to the source project's
    /// directory. Exactly one loaded project must match the resolved
    /// path; zero or several is a configuration error and leaves the
    /// graph untouched. Re-resolving an existing edge is a no-op.
    pub fn resolve_project_reference(
        &mut self,
        from: ProjectId,
        reference: &str,
    ) -> Result<(), WorkspaceError> {
        let source = self
            .projects
            .get(&from)
            .ok_or(WorkspaceError::StaleProject(from))?;

        let target = normalize_path(&source.descriptor.directory().join(reference));
        let matches: Vec<ProjectId> = self
            .projects
            .values()
            .filter(|candidate| normalize_path(&candidate.descriptor.path) == target)
            .map(|candidate| candidate.id)
            .collect();

        let to = match matches.as_slice() {
            [] => {
                return Err(WorkspaceError::MissingReferenceTarget {
                    from: source.descriptor.name.clone(),
                    target,
                })
            }
            [only] => *only,
            _ => {
                return Err(WorkspaceError::AmbiguousReferenceTarget {
                    from: source.descriptor.name.clone(),
                    target,
                    count: matches.len(),
                })
            }
        };

        let source = self
            .projects
            .get_mut(&from)
            .ok_or(WorkspaceError::StaleProject(from))?;
        if !source.project_references.insert(to) {
            return Ok(());
        }

        self.engine.project_reference_added(from, to);
        self.emit(ChangeEvent::ProjectReferenceAdded { from, to });
        Ok(())
    }

    /// Bind a live buffer to the document at `path` and start its
    /// diagnostics subscription.
    ///
    /// Re-opening an open document replaces the buffer and callback
    /// rather than duplicating the subscription.
    pub fn open_document(
        &mut self,
        path: &Utf8Path,
        buffer: TextBuffer,
        callback: DiagnosticsCallback,
    ) -> Result<DocumentId, WorkspaceError> {
        let id = self.document_id_by_path(path)?;
        let node = self
            .documents
            .get_mut(&id)
            .ok_or(WorkspaceError::StaleDocument(id))?;

        node.open = true;
        self.subscriptions.subscribe(id, callback);
        self.engine.document_opened(id, &buffer.text());
        self.open_buffers.insert(id, buffer);

        self.emit(ChangeEvent::DocumentOpened(id));
        Ok(id)
    }

    /// Unbind the buffer, drop the subscription, and keep the final text
    /// as the closed document's snapshot.
    pub fn close_document(&mut self, path: &Utf8Path) -> Result<DocumentId, WorkspaceError> {
        let id = self.document_id_by_path(path)?;
        let buffer = self
            .open_buffers
            .remove(&id)
            .ok_or(WorkspaceError::NotOpen(id))?;

        self.subscriptions.unsubscribe(id);

        let node = self
            .documents
            .get_mut(&id)
            .ok_or(WorkspaceError::StaleDocument(id))?;
        node.open = false;
        node.version = buffer.version();
        node.text = TextSource::Snapshot(buffer.text().into());

        self.engine.document_closed(id);
        self.emit(ChangeEvent::DocumentClosed(id));
        Ok(id)
    }

    /// Propagate an edit from the bound buffer into the workspace.
    ///
    /// Document identity is preserved: same id, incremented version.
    pub fn apply_document_text_changed(
        &mut self,
        document: DocumentId,
        changes: &[TextChange],
    ) -> Result<i32, WorkspaceError> {
        if !self.documents.contains_key(&document) {
            return Err(WorkspaceError::StaleDocument(document));
        }
        let buffer = self
            .open_buffers
            .get(&document)
            .ok_or(WorkspaceError::NotOpen(document))?;

        let version = buffer.apply(changes)?;
        let text = buffer.text();

        if let Some(node) = self.documents.get_mut(&document) {
            node.version = version;
        }

        self.engine.document_changed(document, &text, version);
        self.emit(ChangeEvent::DocumentTextChanged { document, version });
        Ok(version)
    }

    /// Unload a project: its documents, their buffers and subscriptions,
    /// and any reference edges pointing at it.
    pub fn remove_project(&mut self, project: ProjectId) -> Result<(), WorkspaceError> {
        let node = self
            .projects
            .remove(&project)
            .ok_or(WorkspaceError::StaleProject(project))?;
        self.projects_by_name.remove(&node.descriptor.name);

        for document in node.documents {
            self.documents.remove(&document);
            self.open_buffers.remove(&document);
            self.subscriptions.unsubscribe(document);
            self.engine.document_removed(document);
        }

        for other in self.projects.values_mut() {
            other.project_references.remove(&project);
        }

        self.engine.project_removed(project);
        tracing::info!(project = %node.descriptor.name, "project removed");
        self.emit(ChangeEvent::ProjectRemoved(project));
        Ok(())
    }

    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&ProjectNode> {
        self.projects.get(&id)
    }

    #[must_use]
    pub fn project_by_name(&self, name: &str) -> Option<&ProjectNode> {
        self.projects_by_name
            .get(name)
            .and_then(|id| self.projects.get(id))
    }

    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&DocumentNode> {
        self.documents.get(&id)
    }

    #[must_use]
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    /// Current authoritative text: the live buffer while open, otherwise
    /// the close-time snapshot, otherwise the file on disk.
    pub fn document_text(&self, document: DocumentId) -> Result<String, WorkspaceError> {
        let node = self
            .documents
            .get(&document)
            .ok_or(WorkspaceError::StaleDocument(document))?;

        if let Some(buffer) = self.open_buffers.get(&document) {
            return Ok(buffer.text());
        }

        match &node.text {
            TextSource::Snapshot(text) => Ok(text.to_string()),
            TextSource::OnDisk => Ok(std::fs::read_to_string(&node.path)?),
        }
    }

    fn document_id_by_path(&self, path: &Utf8Path) -> Result<DocumentId, WorkspaceError> {
        let target = normalize_path(path);
        let matches: Vec<DocumentId> = self
            .documents
            .values()
            .filter(|node| normalize_path(&node.path) == target)
            .map(|node| node.id)
            .collect();

        match matches.as_slice() {
            [] => Err(WorkspaceError::UnknownDocumentPath(target)),
            [id] => Ok(*id),
            _ => Err(WorkspaceError::AmbiguousDocumentPath {
                path: target,
                count: matches.len(),
            }),
        }
    }

    fn emit(&self, event: ChangeEvent) {
        // No receivers is fine; events are advisory.
        let _ = self.events.send(event);
    }
}

/// Canonical form for path identity checks.
///
/// Canonicalization requires the file to exist; fall back to a lexical
/// cleanup so reference resolution also works against not-yet-written
/// trees (and in tests).
fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    if let Ok(canonical) = dunce::canonicalize(path.as_std_path()) {
        if let Ok(utf8) = Utf8PathBuf::from_path_buf(canonical) {
            return utf8;
        }
    }

    let mut normalized = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_str()),
        }
    }
    normalized
}
