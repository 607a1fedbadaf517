use camino::Utf8Path;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncWrite;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::tcp::OwnedWriteHalf;

use crate::messages::BuildDiagnostic;
use crate::messages::Envelope;
use crate::messages::HostVersion;
use crate::messages::Property;
use crate::messages::Request;
use crate::messages::TaskItems;
use crate::process::EvaluatorProcess;
use crate::process::ProcessError;
use crate::transport::LengthPrefixedTransport;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Build host error: {message}")]
    Host {
        message: String,
        diagnostics: Vec<BuildDiagnostic>,
    },
    #[error("Build host returned an empty payload for {method}")]
    MissingPayload { method: &'static str },
}

/// Typed request surface over one evaluator connection.
///
/// The protocol is strictly request/response, so one request is in flight
/// at a time; callers serialize access by holding `&mut self`.
#[derive(Debug)]
pub struct BuildHostClient<R = OwnedReadHalf, W = OwnedWriteHalf> {
    transport: LengthPrefixedTransport<R, W>,
}

impl<R, W> BuildHostClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    #[must_use]
    pub fn new(transport: LengthPrefixedTransport<R, W>) -> Self {
        Self { transport }
    }

    async fn request<T>(
        &mut self,
        method: &'static str,
        request: &Request,
    ) -> Result<(T, Vec<BuildDiagnostic>), ClientError>
    where
        T: serde::de::DeserializeOwned,
    {
        self.transport.send(request).await?;
        let envelope: Envelope<T> = self.transport.receive().await?;

        if let Some(message) = envelope.error {
            return Err(ClientError::Host {
                message,
                diagnostics: envelope.diagnostics,
            });
        }

        let data = envelope
            .data
            .ok_or(ClientError::MissingPayload { method })?;
        Ok((data, envelope.diagnostics))
    }

    pub async fn get_host_version(&mut self) -> Result<HostVersion, ClientError> {
        let (version, _) = self
            .request("GetHostVersion", &Request::GetHostVersion)
            .await?;
        Ok(version)
    }

    pub async fn get_target_frameworks(
        &mut self,
        project: &Utf8Path,
    ) -> Result<(Vec<String>, Vec<BuildDiagnostic>), ClientError> {
        self.request(
            "GetTargetFrameworks",
            &Request::GetTargetFrameworks {
                project: project.to_path_buf(),
            },
        )
        .await
    }

    pub async fn get_task_items(
        &mut self,
        target: &str,
        project: &Utf8Path,
        properties: Vec<Property>,
    ) -> Result<(TaskItems, Vec<BuildDiagnostic>), ClientError> {
        self.request(
            "GetTaskItems",
            &Request::GetTaskItems {
                target: target.to_string(),
                project: project.to_path_buf(),
                properties,
            },
        )
        .await
    }

    pub async fn get_project_references(
        &mut self,
        project: &Utf8Path,
    ) -> Result<(Vec<String>, Vec<BuildDiagnostic>), ClientError> {
        self.request(
            "GetProjectReferences",
            &Request::GetProjectReferences {
                project: project.to_path_buf(),
            },
        )
        .await
    }
}

/// The build-evaluation session: spawned evaluator plus connected client.
///
/// Start exactly once before any evaluation call; [`BuildHost::shutdown`]
/// tears the evaluator down. The version handshake runs at start so a
/// protocol mismatch fails the session up front rather than mid-load.
#[derive(Debug)]
pub struct BuildHost {
    process: EvaluatorProcess,
    client: BuildHostClient,
    version: String,
}

impl BuildHost {
    pub async fn start(
        command: &str,
        args: &[String],
        connect_attempts: u32,
    ) -> Result<Self, ClientError> {
        let (process, transport) = EvaluatorProcess::spawn(command, args, connect_attempts).await?;
        let mut client = BuildHostClient::new(transport);

        let version = client.get_host_version().await?.version;
        tracing::info!(version = %version, port = process.port(), "build host ready");

        Ok(Self {
            process,
            client,
            version,
        })
    }

    pub fn client(&mut self) -> &mut BuildHostClient {
        &mut self.client
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    pub async fn shutdown(mut self) -> Result<(), ClientError> {
        self.process.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use camino::Utf8PathBuf;
    use serde_json::json;
    use tokio::io::DuplexStream;
    use tokio::io::ReadHalf;
    use tokio::io::WriteHalf;

    use super::*;
    use crate::messages::TaskItem;

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

    #[tokio::test]
    async fn test_get_target_frameworks() {
        let (mut client, mut host) = connected();

        let server = tokio::spawn(async move {
            let request: Request = host.receive().await.unwrap();
            assert!(matches!(request, Request::GetTargetFrameworks { ref project }
                if project == "/src/App/App.csproj"));
            host.send(&json!({"data": ["netstandard2.0", "net462"]}))
                .await
                .unwrap();
        });

        let (frameworks, diagnostics) = client
            .get_target_frameworks(Utf8Path::new("/src/App/App.csproj"))
            .await
            .unwrap();
        assert_eq!(frameworks, ["netstandard2.0", "net462"]);
        assert!(diagnostics.is_empty());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_get_task_items_round_trip() {
        let (mut client, mut host) = connected();

        let server = tokio::spawn(async move {
            let request: Request = host.receive().await.unwrap();
            let Request::GetTaskItems { target, properties, .. } = request else {
                panic!("expected GetTaskItems");
            };
            assert_eq!(target, "ResolveAssemblyReferences");
            assert_eq!(properties, [Property::new("TargetFramework", "net462")]);

            let payload = TaskItems {
                items: vec![TaskItem {
                    spec: Utf8PathBuf::from("/refs/System.Linq.dll"),
                    metadata: BTreeMap::from([("Version".to_string(), "4.0.0".to_string())]),
                }],
                properties: BTreeMap::from([("OutputType".to_string(), "Library".to_string())]),
            };
            host.send(&Envelope {
                data: Some(payload),
                diagnostics: Vec::new(),
                error: None,
            })
            .await
            .unwrap();
        });

        let (items, _) = client
            .get_task_items(
                "ResolveAssemblyReferences",
                Utf8Path::new("/src/App/App.csproj"),
                vec![Property::new("TargetFramework", "net462")],
            )
            .await
            .unwrap();
        assert_eq!(items.items.len(), 1);
        assert_eq!(items.items[0].spec, "/refs/System.Linq.dll");
        assert_eq!(items.properties["OutputType"], "Library");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_host_error_is_typed() {
        let (mut client, mut host) = connected();

        let server = tokio::spawn(async move {
            let _request: Request = host.receive().await.unwrap();
            host.send(&json!({
                "data": null,
                "error": "malformed project file",
                "diagnostics": [{"severity": "error", "text": "MSB4025"}]
            }))
            .await
            .unwrap();
        });

        let err = client
            .get_project_references(Utf8Path::new("/src/Broken/Broken.csproj"))
            .await
            .unwrap_err();
        match err {
            ClientError::Host {
                message,
                diagnostics,
            } => {
                assert_eq!(message, "malformed project file");
                assert_eq!(diagnostics.len(), 1);
            }
            other => panic!("expected Host error, got {other:?}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_payload_is_typed() {
        let (mut client, mut host) = connected();

        let server = tokio::spawn(async move {
            let _request: Request = host.receive().await.unwrap();
            host.send(&json!({"data": null})).await.unwrap();
        });

        let err = client.get_host_version().await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::MissingPayload {
                method: "GetHostVersion"
            }
        ));
        server.await.unwrap();
    }
}
