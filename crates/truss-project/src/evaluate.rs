//! Descriptor assembly: drive the build host through one project's
//! evaluation and fold the results into a [`ProjectDescriptor`].

use camino::Utf8Path;
use camino::Utf8PathBuf;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use truss_buildhost::messages::BuildDiagnostic;
use truss_buildhost::messages::BuildSeverity;
use truss_buildhost::messages::Property;
use truss_buildhost::BuildHostClient;
use truss_buildhost::ClientError;

use crate::descriptor::properties;
use crate::descriptor::OutputKind;
use crate::descriptor::ProjectDescriptor;
use crate::descriptor::ReferenceSpec;

/// Target whose task items are the project's resolved assembly references.
pub const RESOLVE_ASSEMBLY_REFERENCES: &str = "ResolveAssemblyReferences";

/// Property used to pin evaluation to one framework of a multi-targeting
/// project.
pub const TARGET_FRAMEWORK_PROPERTY: &str = "TargetFramework";

#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error("Build evaluation failed for {project}: {source}")]
    Host {
        project: Utf8PathBuf,
        #[source]
        source: ClientError,
    },
}

impl ProjectDescriptor {
    /// Evaluate `project` through the build host.
    ///
    /// The sequence mirrors a full project load: supported target
    /// frameworks first (the first one reported is pinned unless
    /// `target_framework` overrides it), then the resolved assembly
    /// references plus evaluated properties, then the declared
    /// project-to-project references.
    pub async fn evaluate<R, W>(
        client: &mut BuildHostClient<R, W>,
        project: &Utf8Path,
        target_framework: Option<&str>,
    ) -> Result<Self, EvaluateError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let host_err = |source| EvaluateError::Host {
            project: project.to_path_buf(),
            source,
        };

        let (frameworks, diagnostics) = client
            .get_target_frameworks(project)
            .await
            .map_err(host_err)?;
        log_diagnostics(project, &diagnostics);

        let framework = target_framework
            .map(str::to_string)
            .or_else(|| frameworks.first().cloned());

        let mut build_properties = Vec::new();
        if let Some(framework) = &framework {
            build_properties.push(Property::new(TARGET_FRAMEWORK_PROPERTY, framework.clone()));
        }

        let (task_items, diagnostics) = client
            .get_task_items(RESOLVE_ASSEMBLY_REFERENCES, project, build_properties)
            .await
            .map_err(host_err)?;
        log_diagnostics(project, &diagnostics);

        let (project_references, diagnostics) = client
            .get_project_references(project)
            .await
            .map_err(host_err)?;
        log_diagnostics(project, &diagnostics);

        let props = &task_items.properties;
        let get = |key: &str| props.get(key).map(String::as_str).filter(|v| !v.is_empty());

        let name = project
            .file_stem()
            .unwrap_or(project.as_str())
            .to_string();
        let directory = project.parent().unwrap_or_else(|| Utf8Path::new(""));

        let descriptor = ProjectDescriptor {
            assembly_name: get(properties::ASSEMBLY_NAME)
                .map_or_else(|| name.clone(), str::to_string),
            output_kind: OutputKind::from_property(get(properties::OUTPUT_TYPE)),
            target_path: get(properties::TARGET_PATH).map(Utf8PathBuf::from),
            allow_unsafe: get(properties::ALLOW_UNSAFE_BLOCKS).is_some_and(property_flag),
            suppressed_diagnostics: get(properties::NO_WARN)
                .map(split_diagnostic_ids)
                .unwrap_or_default(),
            signing_key_path: if get(properties::SIGN_ASSEMBLY).is_some_and(property_flag) {
                get(properties::ASSEMBLY_ORIGINATOR_KEY_FILE).map(|key| directory.join(key))
            } else {
                None
            },
            documentation_path: get(properties::DOCUMENTATION_FILE).map(|doc| directory.join(doc)),
            target_framework: framework,
            references: task_items
                .items
                .into_iter()
                .map(|item| ReferenceSpec {
                    path: item.spec,
                    metadata: item.metadata,
                })
                .collect(),
            project_references,
            name,
            path: project.to_path_buf(),
        };

        tracing::debug!(
            project = %descriptor.path,
            references = descriptor.references.len(),
            project_references = descriptor.project_references.len(),
            "evaluated project"
        );

        Ok(descriptor)
    }
}

fn property_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}

fn split_diagnostic_ids(value: &str) -> Vec<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn log_diagnostics(project: &Utf8Path, diagnostics: &[BuildDiagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity {
            BuildSeverity::Error => {
                tracing::error!(project = %project, "{}", diagnostic.text);
            }
            BuildSeverity::Warning => {
                tracing::warn!(project = %project, "{}", diagnostic.text);
            }
            BuildSeverity::Info => {
                tracing::debug!(project = %project, "{}", diagnostic.text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::DuplexStream;
    use tokio::io::ReadHalf;
    use tokio::io::WriteHalf;
    use truss_buildhost::messages::Request;
    use truss_buildhost::transport::LengthPrefixedTransport;

    use super::*;

    type TestClient = BuildHostClient<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
    type HostEnd = LengthPrefixedTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

    fn connected() -> (TestClient, HostEnd) {
        let (near, far) = tokio::io::duplex(64 * 1024);
        let (nr, nw) = tokio::io::split(near);
        let (fr, fw) = tokio::io::split(far);
        (
            BuildHostClient::new(LengthPrefixedTransport::new(nr, nw)),
            LengthPrefixedTransport::new(fr, fw),
        )
    }

    /// Scripted host: answers the three evaluation calls in order.
    async fn run_fake_host(mut host: HostEnd) {
        let request: Request = host.receive().await.unwrap();
        assert!(matches!(request, Request::GetTargetFrameworks { .. }));
        host.send(&json!({"data": ["netstandard2.0", "net462"]}))
            .await
            .unwrap();

        let request: Request = host.receive().await.unwrap();
        let Request::GetTaskItems { target, properties, .. } = request else {
            panic!("expected GetTaskItems");
        };
        assert_eq!(target, RESOLVE_ASSEMBLY_REFERENCES);
        assert_eq!(
            properties,
            [Property::new(TARGET_FRAMEWORK_PROPERTY, "netstandard2.0")]
        );
        host.send(&json!({
            "data": {
                "items": [
                    {"spec": "/refs/System.Runtime.dll", "metadata": {"Version": "4.1.0"}},
                    {"spec": "/refs/System.Linq.dll"}
                ],
                "properties": {
                    "OutputType": "Exe",
                    "AssemblyName": "Frontend",
                    "TargetPath": "/out/Frontend.exe",
                    "AllowUnsafeBlocks": "True",
                    "NoWarn": "CS0649;CS0169",
                    "SignAssembly": "true",
                    "AssemblyOriginatorKeyFile": "keys/app.snk",
                    "DocumentationFile": "Frontend.xml"
                }
            },
            "diagnostics": [{"severity": "warning", "text": "MSB3270: processor mismatch"}]
        }))
        .await
        .unwrap();

        let request: Request = host.receive().await.unwrap();
        assert!(matches!(request, Request::GetProjectReferences { .. }));
        host.send(&json!({"data": ["../Core/Core.csproj"]}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_evaluate_builds_full_descriptor() {
        let (mut client, host) = connected();
        let server = tokio::spawn(run_fake_host(host));

        let descriptor = ProjectDescriptor::evaluate(
            &mut client,
            Utf8Path::new("/src/App/App.csproj"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(descriptor.name, "App");
        assert_eq!(descriptor.assembly_name, "Frontend");
        assert_eq!(descriptor.output_kind, OutputKind::Executable);
        assert_eq!(descriptor.target_framework.as_deref(), Some("netstandard2.0"));
        assert_eq!(descriptor.target_path.as_deref(), Some(Utf8Path::new("/out/Frontend.exe")));
        assert!(descriptor.allow_unsafe);
        assert_eq!(descriptor.suppressed_diagnostics, ["CS0649", "CS0169"]);
        assert_eq!(
            descriptor.signing_key_path.as_deref(),
            Some(Utf8Path::new("/src/App/keys/app.snk"))
        );
        assert_eq!(
            descriptor.documentation_path.as_deref(),
            Some(Utf8Path::new("/src/App/Frontend.xml"))
        );
        assert_eq!(descriptor.references.len(), 2);
        assert_eq!(
            descriptor.references[0].metadata[crate::descriptor::metadata::VERSION],
            "4.1.0"
        );
        assert_eq!(descriptor.project_references, ["../Core/Core.csproj"]);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_evaluate_framework_override() {
        let (mut client, mut host) = connected();
        let server = tokio::spawn(async move {
            let _: Request = host.receive().await.unwrap();
            host.send(&json!({"data": ["netstandard2.0"]})).await.unwrap();

            let request: Request = host.receive().await.unwrap();
            let Request::GetTaskItems { properties, .. } = request else {
                panic!("expected GetTaskItems");
            };
            assert_eq!(
                properties,
                [Property::new(TARGET_FRAMEWORK_PROPERTY, "net8.0")]
            );
            host.send(&json!({"data": {"items": [], "properties": {}}}))
                .await
                .unwrap();

            let _: Request = host.receive().await.unwrap();
            host.send(&json!({"data": []})).await.unwrap();
        });

        let descriptor = ProjectDescriptor::evaluate(
            &mut client,
            Utf8Path::new("/src/App/App.csproj"),
            Some("net8.0"),
        )
        .await
        .unwrap();
        assert_eq!(descriptor.target_framework.as_deref(), Some("net8.0"));
        // Defaults when the evaluation reports nothing.
        assert_eq!(descriptor.assembly_name, "App");
        assert_eq!(descriptor.output_kind, OutputKind::Library);
        assert!(!descriptor.allow_unsafe);

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_evaluate_host_failure_is_typed() {
        let (mut client, mut host) = connected();
        let server = tokio::spawn(async move {
            let _: Request = host.receive().await.unwrap();
            host.send(&json!({"data": null, "error": "host crashed"}))
                .await
                .unwrap();
        });

        let err = ProjectDescriptor::evaluate(
            &mut client,
            Utf8Path::new("/src/App/App.csproj"),
            None,
        )
        .await
        .unwrap_err();
        let EvaluateError::Host { project, source } = err;
        assert_eq!(project, "/src/App/App.csproj");
        assert!(matches!(source, ClientError::Host { .. }));

        server.await.unwrap();
    }

    #[test]
    fn test_split_diagnostic_ids() {
        assert_eq!(
            split_diagnostic_ids("CS0649; CS0169,CS8618;;"),
            ["CS0649", "CS0169", "CS8618"]
        );
    }
}
