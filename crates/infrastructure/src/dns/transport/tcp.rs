//! TCP retry for truncated answers (RFC 1035 §4.2.2)
//!
//! Each exchange opens its own connection: one length-prefixed query, one
//! length-prefixed response.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_TCP_MESSAGE_SIZE: usize = 65535;

/// Sends `message_bytes` to `server` and reads one response, all within
/// `timeout`.
pub async fn exchange(
    server: SocketAddr,
    message_bytes: &[u8],
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    tokio::time::timeout(timeout, async {
        let mut stream = TcpStream::connect(server).await?;
        stream.set_nodelay(true)?;

        send_with_length_prefix(&mut stream, message_bytes).await?;
        debug!(
            server = %server,
            message_len = message_bytes.len(),
            "TCP query sent"
        );

        let response_bytes = read_with_length_prefix(&mut stream).await?;
        debug!(
            server = %server,
            response_len = response_bytes.len(),
            "TCP response received"
        );
        Ok::<_, io::Error>(response_bytes)
    })
    .await
    .map_err(|_| {
        io::Error::new(
            io::ErrorKind::TimedOut,
            format!("Timeout waiting for TCP response from {}", server),
        )
    })?
}

pub(crate) async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> io::Result<()>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Message too large: {} bytes (max {})",
                message_bytes.len(),
                MAX_TCP_MESSAGE_SIZE
            ),
        )
    })?;

    stream.write_all(&length.to_be_bytes()).await?;
    stream.write_all(message_bytes).await?;
    stream.flush().await
}

pub(crate) async fn read_with_length_prefix<S>(stream: &mut S) -> io::Result<Vec<u8>>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;

    let response_len = u16::from_be_bytes(len_buf) as usize;
    let mut response = vec![0u8; response_len];
    stream.read_exact(&mut response).await?;

    Ok(response)
}
