//! Length-prefixed JSON framing for TCP-based wire exchanges.
//!
//! Shared by `weave-discovery` (identification server / sweep probe) and
//! `weave-net` (peer sessions) so both speak the same framing over a raw
//! TCP stream. Grounded on `privstack-sync::p2p::codec`'s 4-byte
//! big-endian length prefix, generalized from libp2p's
//! `AsyncRead`/`AsyncWrite` to tokio's.
//!
//! Errors are [`SyncError`], not a bare `io::Error`: spec §7 gives
//! `WireFormat` (malformed bytes — drop the payload, keep the session
//! open) and `TransportTransient` (a broken connection — disconnect)
//! distinct recovery policies, and a caller can only honor that
//! distinction if the two are distinguishable at the type level.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{SyncError, SyncResult};

/// Maximum frame size accepted on the wire (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Reads one length-prefixed JSON value. A failure to read the bytes
/// themselves (socket closed, reset, timed out upstream) is
/// [`SyncError::TransportTransient`]; a frame that reads fine but doesn't
/// decode, or an oversized length prefix, is [`SyncError::WireFormat`].
pub async fn read_message<T, R>(io: &mut R) -> SyncResult<T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    let mut len_bytes = [0u8; 4];
    io.read_exact(&mut len_bytes).await?;
    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(SyncError::WireFormat(format!("frame too large: {len} bytes")));
    }
    let mut buf = vec![0u8; len];
    io.read_exact(&mut buf).await?;
    serde_json::from_slice(&buf).map_err(SyncError::from)
}

/// Writes one length-prefixed JSON value. Encoding failures and an
/// oversized payload are [`SyncError::WireFormat`]; a failed write to the
/// socket is [`SyncError::TransportTransient`].
pub async fn write_message<T, W>(io: &mut W, value: &T) -> SyncResult<()>
where
    T: Serialize + Sync,
    W: AsyncWrite + Unpin,
{
    let data = serde_json::to_vec(value).map_err(SyncError::from)?;
    if data.len() > MAX_FRAME_SIZE {
        return Err(SyncError::WireFormat(format!("frame too large: {} bytes", data.len())));
    }
    io.write_all(&(data.len() as u32).to_be_bytes()).await?;
    io.write_all(&data).await?;
    io.flush().await?;
    Ok(())
}
