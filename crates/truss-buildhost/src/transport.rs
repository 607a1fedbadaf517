//! Length-prefixed JSON framing over any async byte stream.
//!
//! Each frame is a 4-byte big-endian length followed by one JSON document.
//! The codec is symmetric, so tests can run an in-process fake host over a
//! duplex pipe with the same transport on both ends.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWrite;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;

/// Upper bound on a single frame. An evaluation response listing every
/// resolved reference of a large project stays well under this.
pub const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(u32),
    #[error("Failed to encode message: {0}")]
    Encode(serde_json::Error),
    #[error("Failed to decode message: {0}")]
    Decode(serde_json::Error),
}

#[derive(Debug)]
pub struct LengthPrefixedTransport<R, W> {
    reader: R,
    writer: W,
}

/// The transport over a split loopback connection to the evaluator.
pub type TcpTransport = LengthPrefixedTransport<OwnedReadHalf, OwnedWriteHalf>;

impl TcpTransport {
    #[must_use]
    pub fn from_stream(stream: TcpStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer)
    }
}

impl<R, W> LengthPrefixedTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub async fn send<T>(&mut self, message: &T) -> Result<(), TransportError>
    where
        T: Serialize,
    {
        let buf = serde_json::to_vec(message).map_err(TransportError::Encode)?;
        let len = u32::try_from(buf.len()).map_err(|_| TransportError::FrameTooLarge(u32::MAX))?;
        if len > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge(len));
        }

        self.writer.write_all(&len.to_be_bytes()).await?;
        self.writer.write_all(&buf).await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn receive<T>(&mut self) -> Result<T, TransportError>
    where
        T: DeserializeOwned,
    {
        let mut length_bytes = [0u8; 4];
        self.reader.read_exact(&mut length_bytes).await?;
        let length = u32::from_be_bytes(length_bytes);
        if length > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge(length));
        }

        let mut message_bytes = vec![0u8; length as usize];
        self.reader.read_exact(&mut message_bytes).await?;

        serde_json::from_slice(&message_bytes).map_err(TransportError::Decode)
    }
}
