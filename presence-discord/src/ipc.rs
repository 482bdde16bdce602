//! Discord IPC socket client.
//!
//! The local Discord client listens on `discord-ipc-{0..9}` in the runtime
//! directory. Frames are a little-endian `(opcode, length)` header followed
//! by a JSON payload. Only the two operations this crate needs are
//! implemented: the version handshake and SET_ACTIVITY.

use crate::error::{PresenceError, Result};
use bytes::{Buf, BufMut, BytesMut};
use serde_json::json;
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::{debug, info};
use uuid::Uuid;

const OP_HANDSHAKE: u32 = 0;
const OP_FRAME: u32 = 1;

/// Frames larger than this are a protocol violation, not a real payload.
const MAX_FRAME_LEN: u32 = 1024 * 1024;

/// One authenticated connection to the local Discord client.
pub struct DiscordIpc {
    stream: UnixStream,
}

impl DiscordIpc {
    /// Probe the candidate sockets and perform the handshake on the first
    /// one that answers.
    pub async fn connect(client_id: &str) -> Result<Self> {
        for path in candidate_sockets() {
            let Ok(stream) = UnixStream::connect(&path).await else {
                continue;
            };
            let mut ipc = Self { stream };
            match ipc.handshake(client_id).await {
                Ok(user) => {
                    info!(
                        socket = %path.display(),
                        user = user.as_deref().unwrap_or("unknown"),
                        "connected to Discord"
                    );
                    return Ok(ipc);
                }
                Err(e) => {
                    debug!(socket = %path.display(), error = %e, "handshake failed");
                }
            }
        }
        Err(PresenceError::SocketUnavailable)
    }

    async fn handshake(&mut self, client_id: &str) -> Result<Option<String>> {
        self.send(OP_HANDSHAKE, &json!({ "v": 1, "client_id": client_id }))
            .await?;
        let ready = self.recv().await?;

        let user = ready["data"]["user"]["username"]
            .as_str()
            .map(str::to_string);
        if user.is_none() {
            return Err(PresenceError::Protocol(
                "handshake reply carried no user".to_string(),
            ));
        }
        Ok(user)
    }

    /// Publish (or clear, with `null`) the current activity.
    pub async fn set_activity(&mut self, activity: serde_json::Value) -> Result<()> {
        let payload = json!({
            "cmd": "SET_ACTIVITY",
            "args": {
                "pid": std::process::id(),
                "activity": activity,
            },
            "nonce": Uuid::new_v4().to_string(),
        });
        self.send(OP_FRAME, &payload).await
    }

    async fn send(&mut self, opcode: u32, payload: &serde_json::Value) -> Result<()> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| PresenceError::Protocol(format!("encode: {e}")))?;
        let mut frame = BytesMut::with_capacity(8 + body.len());
        frame.put_u32_le(opcode);
        frame.put_u32_le(body.len() as u32);
        frame.put_slice(&body);
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<serde_json::Value> {
        let mut header = [0u8; 8];
        self.stream.read_exact(&mut header).await?;
        let mut header = &header[..];
        let _opcode = header.get_u32_le();
        let len = header.get_u32_le();
        if len > MAX_FRAME_LEN {
            return Err(PresenceError::Protocol(format!("oversized frame: {len}")));
        }

        let mut body = vec![0u8; len as usize];
        self.stream.read_exact(&mut body).await?;
        serde_json::from_slice(&body).map_err(|e| PresenceError::Protocol(format!("decode: {e}")))
    }
}

/// Candidate IPC socket paths, most specific directory first.
fn candidate_sockets() -> Vec<PathBuf> {
    let dirs = ["XDG_RUNTIME_DIR", "TMPDIR"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(PathBuf::from)
        .chain(std::iter::once(PathBuf::from("/tmp")));

    dirs.flat_map(|dir| (0..10).map(move |i| dir.join(format!("discord-ipc-{i}"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_cover_ten_sockets_per_directory() {
        let candidates = candidate_sockets();
        assert!(candidates.len() >= 10);
        assert!(candidates
            .iter()
            .any(|p| p.ends_with("discord-ipc-0")));
        assert!(candidates
            .iter()
            .any(|p| p.ends_with("discord-ipc-9")));
    }

    #[tokio::test]
    async fn handshake_against_a_fake_server_extracts_the_user() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("discord-ipc-test");
        let listener = tokio::net::UnixListener::bind(&socket_path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut header = [0u8; 8];
            stream.read_exact(&mut header).await.unwrap();
            let len = u32::from_le_bytes(header[4..8].try_into().unwrap());
            let mut body = vec![0u8; len as usize];
            stream.read_exact(&mut body).await.unwrap();
            let request: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(request["v"], 1);

            let reply =
                serde_json::to_vec(&json!({"data": {"user": {"username": "tester"}}})).unwrap();
            let mut frame = BytesMut::new();
            frame.put_u32_le(1);
            frame.put_u32_le(reply.len() as u32);
            frame.put_slice(&reply);
            stream.write_all(&frame).await.unwrap();
        });

        let stream = UnixStream::connect(&socket_path).await.unwrap();
        let mut ipc = DiscordIpc { stream };
        let user = ipc.handshake("12345").await.unwrap();
        assert_eq!(user.as_deref(), Some("tester"));

        server.await.unwrap();
    }
}
