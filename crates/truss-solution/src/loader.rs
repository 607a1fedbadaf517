//! The two-pass solution load.
//!
//! Pass one adds every declared project (and its discovered sources) to
//! the workspace; pass two resolves declared project references. The
//! split exists because a project may be declared before one it depends
//! on; resolution needs the full project set. Failures never abort the
//! load: they accumulate in the [`LoadReport`] and independent projects
//! keep loading.

use camino::Utf8Path;
use camino::Utf8PathBuf;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use truss_buildhost::BuildHostClient;
use truss_project::EvaluateError;
use truss_project::ProjectDescriptor;
use truss_workspace::ProjectId;
use truss_workspace::Workspace;
use truss_workspace::WorkspaceError;

use crate::manifest::SolutionManifest;
use crate::sources::enumerate_sources;

/// Seam over descriptor assembly so loads are testable without a live
/// evaluator process.
#[allow(async_fn_in_trait)]
pub trait Evaluator {
    async fn evaluate(&mut self, project: &Utf8Path) -> Result<ProjectDescriptor, EvaluateError>;
}

/// The production evaluator: descriptor assembly through the build host.
pub struct HostEvaluator<'a, R, W> {
    client: &'a mut BuildHostClient<R, W>,
    target_framework: Option<String>,
}

impl<'a, R, W> HostEvaluator<'a, R, W> {
    pub fn new(client: &'a mut BuildHostClient<R, W>, target_framework: Option<String>) -> Self {
        Self {
            client,
            target_framework,
        }
    }
}

impl<R, W> Evaluator for HostEvaluator<'_, R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn evaluate(&mut self, project: &Utf8Path) -> Result<ProjectDescriptor, EvaluateError> {
        ProjectDescriptor::evaluate(self.client, project, self.target_framework.as_deref()).await
    }
}

/// One project that could not be evaluated and was left out of the graph.
#[derive(Debug)]
pub struct ProjectFailure {
    pub project: Utf8PathBuf,
    pub error: EvaluateError,
}

/// One declared reference that did not resolve to exactly one project.
#[derive(Debug)]
pub struct ReferenceError {
    pub project: Utf8PathBuf,
    pub reference: String,
    pub error: WorkspaceError,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    /// Projects now present in the graph, in declaration order.
    pub projects: Vec<ProjectId>,
    pub failures: Vec<ProjectFailure>,
    pub reference_errors: Vec<ReferenceError>,
}

impl LoadReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.reference_errors.is_empty()
    }
}

/// Load every project the manifest declares into the workspace.
pub async fn load<M, E>(
    manifest: &M,
    evaluator: &mut E,
    workspace: &mut Workspace,
    source_extension: &str,
) -> LoadReport
where
    M: SolutionManifest + ?Sized,
    E: Evaluator,
{
    let mut report = LoadReport::default();
    let mut pending_references: Vec<(ProjectId, Utf8PathBuf, Vec<String>)> = Vec::new();

    for project_path in manifest.projects() {
        let descriptor = match evaluator.evaluate(project_path).await {
            Ok(descriptor) => descriptor,
            Err(error) => {
                tracing::warn!(project = %project_path, %error, "skipping project");
                report.failures.push(ProjectFailure {
                    project: project_path.clone(),
                    error,
                });
                continue;
            }
        };

        if let Some(existing) = workspace.project_by_name(&descriptor.name) {
            report.projects.push(existing.id);
            continue;
        }

        let directory = descriptor.directory().to_path_buf();
        let references = descriptor.project_references.clone();
        let id = workspace.add_project(descriptor);

        for source in enumerate_sources(&directory, source_extension) {
            if let Err(error) = workspace.add_document(id, source) {
                tracing::warn!(project = %project_path, %error, "failed to add document");
            }
        }

        pending_references.push((id, project_path.clone(), references));
        report.projects.push(id);
    }

    for (id, project_path, references) in pending_references {
        for reference in references {
            if let Err(error) = workspace.resolve_project_reference(id, &reference) {
                tracing::error!(
                    project = %project_path,
                    reference = %reference,
                    %error,
                    "project reference did not resolve"
                );
                report.reference_errors.push(ReferenceError {
                    project: project_path.clone(),
                    reference,
                    error,
                });
            }
        }
    }

    tracing::info!(
        solution = manifest.name(),
        projects = report.projects.len(),
        failures = report.failures.len(),
        reference_errors = report.reference_errors.len(),
        "solution load finished"
    );
    report
}
