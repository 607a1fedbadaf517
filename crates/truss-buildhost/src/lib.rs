//! Client side of the out-of-process build-evaluation host.
//!
//! The evaluator runs as a separate process and is reached over a loopback
//! TCP connection speaking length-prefixed JSON frames. This crate owns the
//! process lifecycle ([`BuildHost`]), the wire codec
//! ([`transport::LengthPrefixedTransport`]), and the typed request surface
//! ([`BuildHostClient`]).

mod client;
pub mod messages;
mod process;
pub mod transport;

pub use client::BuildHost;
pub use client::BuildHostClient;
pub use client::ClientError;
pub use process::EvaluatorProcess;
pub use process::ProcessError;
