use crate::errors::NozhaError;
use std::net::SocketAddr;
use tokio::net::TcpStream;

/// Opens a TCP connection to the channel server.
///
/// A refused or unreachable server is reported as
/// [`NozhaError::ChannelDisconnected`] so callers can schedule a retry.
pub async fn connect(server_addr: SocketAddr) -> Result<TcpStream, NozhaError> {
    let stream = TcpStream::connect(server_addr).await.map_err(|e| {
        NozhaError::ChannelDisconnected(format!("cannot reach {}: {}", server_addr, e))
    })?;
    // Position updates are small and latency-sensitive.
    stream.set_nodelay(true)?;
    Ok(stream)
}
