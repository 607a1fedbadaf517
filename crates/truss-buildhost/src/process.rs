//! Lifecycle of the spawned evaluator process.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::process::Child;
use tokio::process::Command;

use crate::transport::TcpTransport;

const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to allocate a loopback port: {0}")]
    Port(std::io::Error),
    #[error("Failed to spawn evaluator `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("Evaluator did not accept a connection on port {port} after {attempts} attempts")]
    Connect { port: u16, attempts: u32 },
    #[error("Evaluator exited during startup")]
    Terminated,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running evaluator child process plus the port it listens on.
///
/// The child is spawned with `--port <n>` where `n` is an ephemeral
/// loopback port chosen per session. Dropping the handle kills the child;
/// [`EvaluatorProcess::shutdown`] does so explicitly and reaps it.
#[derive(Debug)]
pub struct EvaluatorProcess {
    child: Child,
    port: u16,
}

impl EvaluatorProcess {
    /// Spawn the evaluator and connect to it, retrying until it is ready.
    pub async fn spawn(
        command: &str,
        args: &[String],
        connect_attempts: u32,
    ) -> Result<(Self, TcpTransport), ProcessError> {
        let port = free_port().await?;

        let child = Command::new(command)
            .args(args)
            .arg("--port")
            .arg(port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProcessError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let mut process = Self { child, port };

        let stream = process.connect(connect_attempts).await?;
        let transport = TcpTransport::from_stream(stream);

        tracing::debug!(command, port, "evaluator started");
        Ok((process, transport))
    }

    async fn connect(&mut self, attempts: u32) -> Result<TcpStream, ProcessError> {
        for _ in 0..attempts {
            if self.child.try_wait()?.is_some() {
                return Err(ProcessError::Terminated);
            }
            match TcpStream::connect((Ipv4Addr::LOCALHOST, self.port)).await {
                Ok(stream) => return Ok(stream),
                Err(_) => tokio::time::sleep(CONNECT_RETRY_DELAY).await,
            }
        }

        Err(ProcessError::Connect {
            port: self.port,
            attempts,
        })
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn shutdown(&mut self) -> Result<(), ProcessError> {
        self.child.kill().await?;
        self.child.wait().await?;
        Ok(())
    }
}

/// Ask the OS for a currently-free loopback port.
///
/// The listener is dropped before the child spawns; the race window is
/// accepted, matching per-session ephemeral port use elsewhere.
async fn free_port() -> Result<u16, ProcessError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .map_err(ProcessError::Port)?;
    let port = listener.local_addr().map_err(ProcessError::Port)?.port();
    Ok(port)
}
