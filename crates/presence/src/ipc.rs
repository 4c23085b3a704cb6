//! Discord rich presence over the local IPC socket
//!
//! Frames are a little-endian `u32` opcode, a little-endian `u32` payload
//! length and a JSON payload. The client sends a handshake, waits for the
//! `READY` dispatch and then issues `SET_ACTIVITY` commands.

use crate::error::{PresenceError, PresenceResult};
use crate::payload::PresencePayload;
use crate::traits::{PresenceConnector, PresenceSession};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Discord tries pipes `discord-ipc-0` through `discord-ipc-9`
const PIPE_COUNT: usize = 10;
const MAX_FRAME_BYTES: usize = 64 * 1024;
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Handshake,
    Frame,
    Close,
    Ping,
    Pong,
}

impl Opcode {
    pub fn code(self) -> u32 {
        match self {
            Opcode::Handshake => 0,
            Opcode::Frame => 1,
            Opcode::Close => 2,
            Opcode::Ping => 3,
            Opcode::Pong => 4,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Opcode::Handshake),
            1 => Some(Opcode::Frame),
            2 => Some(Opcode::Close),
            3 => Some(Opcode::Ping),
            4 => Some(Opcode::Pong),
            _ => None,
        }
    }
}

/// Writes one frame
pub async fn write_frame<W>(writer: &mut W, opcode: Opcode, payload: &Value) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let body = serde_json::to_vec(payload).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "frame too large"))?;

    let mut frame = Vec::with_capacity(8 + body.len());
    frame.extend_from_slice(&opcode.code().to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&body);

    writer.write_all(&frame).await?;
    writer.flush().await
}

/// Reads one frame
pub async fn read_frame<R>(reader: &mut R) -> io::Result<(Opcode, Value)>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; 8];
    reader.read_exact(&mut header).await?;

    let code = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;

    let opcode = Opcode::from_code(code).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, format!("unknown opcode {}", code))
    })?;
    if len > MAX_FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit", len),
        ));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;

    let payload = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?
    };
    Ok((opcode, payload))
}

trait IpcStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> IpcStream for T {}

/// Connects to a running Discord client
#[derive(Debug, Clone, Default)]
pub struct DiscordIpcConnector {
    socket_dirs: Option<Vec<PathBuf>>,
}

impl DiscordIpcConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Searches only the given directories for `discord-ipc-N` sockets
    pub fn with_socket_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            socket_dirs: Some(dirs),
        }
    }

    #[cfg(unix)]
    fn candidate_dirs(&self) -> Vec<PathBuf> {
        if let Some(dirs) = &self.socket_dirs {
            return dirs.clone();
        }

        let mut roots: Vec<PathBuf> = ["XDG_RUNTIME_DIR", "TMPDIR", "TMP", "TEMP"]
            .iter()
            .filter_map(|var| std::env::var_os(var))
            .map(PathBuf::from)
            .collect();
        roots.push(PathBuf::from("/tmp"));

        // Flatpak and Snap builds put the socket in a sandbox subdirectory
        let mut dirs = Vec::new();
        for root in roots {
            dirs.push(root.join("app/com.discordapp.Discord"));
            dirs.push(root.join("snap.discord"));
            dirs.push(root);
        }
        dirs
    }

    #[cfg(unix)]
    async fn open_stream(&self) -> PresenceResult<Box<dyn IpcStream>> {
        let mut last_error: Option<io::Error> = None;
        for index in 0..PIPE_COUNT {
            for dir in self.candidate_dirs() {
                let path = dir.join(format!("discord-ipc-{}", index));
                match tokio::net::UnixStream::connect(&path).await {
                    Ok(stream) => {
                        log::debug!("Connected to {}", path.display());
                        return Ok(Box::new(stream));
                    }
                    Err(e) => last_error = Some(e),
                }
            }
        }
        Err(PresenceError::Connect(match last_error {
            Some(e) => format!("no Discord IPC socket found ({})", e),
            None => "no Discord IPC socket found".to_string(),
        }))
    }

    #[cfg(windows)]
    async fn open_stream(&self) -> PresenceResult<Box<dyn IpcStream>> {
        use tokio::net::windows::named_pipe::ClientOptions;

        let mut last_error: Option<io::Error> = None;
        for index in 0..PIPE_COUNT {
            let name = format!(r"\\?\pipe\discord-ipc-{}", index);
            match ClientOptions::new().open(&name) {
                Ok(pipe) => {
                    log::debug!("Connected to {}", name);
                    return Ok(Box::new(pipe));
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(PresenceError::Connect(match last_error {
            Some(e) => format!("no Discord IPC pipe found ({})", e),
            None => "no Discord IPC pipe found".to_string(),
        }))
    }
}

#[async_trait]
impl PresenceConnector for DiscordIpcConnector {
    async fn connect(&self, app_id: &str) -> PresenceResult<Box<dyn PresenceSession>> {
        let mut stream = self.open_stream().await?;
        let connect_err = |e: io::Error| PresenceError::Connect(e.to_string());

        write_frame(
            &mut stream,
            Opcode::Handshake,
            &json!({ "v": 1, "client_id": app_id }),
        )
        .await
        .map_err(connect_err)?;

        let (opcode, reply) = tokio::time::timeout(REPLY_TIMEOUT, read_frame(&mut stream))
            .await
            .map_err(|_| PresenceError::Connect("handshake timed out".to_string()))?
            .map_err(connect_err)?;

        match opcode {
            Opcode::Frame if reply["evt"] == "READY" => {
                log::info!("Presence session ready for app {}", app_id);
                Ok(Box::new(DiscordIpcSession {
                    stream,
                    pid: std::process::id(),
                    closed: false,
                }))
            }
            Opcode::Close => Err(PresenceError::Connect(format!(
                "handshake rejected: {}",
                reply["message"].as_str().unwrap_or("no reason given")
            ))),
            other => Err(PresenceError::Connect(format!(
                "unexpected handshake reply {:?}",
                other
            ))),
        }
    }
}

struct DiscordIpcSession {
    stream: Box<dyn IpcStream>,
    pid: u32,
    closed: bool,
}

impl DiscordIpcSession {
    async fn set_activity(&mut self, activity: Value) -> PresenceResult<()> {
        if self.closed {
            return Err(PresenceError::Update("session is closed".to_string()));
        }

        let nonce = uuid::Uuid::new_v4().to_string();
        let command = json!({
            "cmd": "SET_ACTIVITY",
            "args": { "pid": self.pid, "activity": activity },
            "nonce": nonce,
        });
        write_frame(&mut self.stream, Opcode::Frame, &command)
            .await
            .map_err(PresenceError::update_io)?;

        tokio::time::timeout(REPLY_TIMEOUT, self.await_reply(&nonce))
            .await
            .map_err(|_| PresenceError::Update("no reply from presence service".to_string()))?
    }

    async fn await_reply(&mut self, nonce: &str) -> PresenceResult<()> {
        loop {
            let (opcode, reply) = read_frame(&mut self.stream)
                .await
                .map_err(PresenceError::update_io)?;

            match opcode {
                Opcode::Ping => {
                    write_frame(&mut self.stream, Opcode::Pong, &reply)
                        .await
                        .map_err(PresenceError::update_io)?;
                }
                Opcode::Close => {
                    self.closed = true;
                    return Err(PresenceError::Update(format!(
                        "closed by presence service: {}",
                        reply["message"].as_str().unwrap_or("no reason given")
                    )));
                }
                Opcode::Frame if reply["nonce"] == nonce => {
                    if reply["evt"] == "ERROR" {
                        return Err(PresenceError::Update(
                            reply["data"]["message"]
                                .as_str()
                                .unwrap_or("activity rejected")
                                .to_string(),
                        ));
                    }
                    return Ok(());
                }
                _ => log::trace!("Ignoring unrelated presence frame"),
            }
        }
    }
}

#[async_trait]
impl PresenceSession for DiscordIpcSession {
    async fn update(&mut self, payload: &PresencePayload) -> PresenceResult<()> {
        self.set_activity(payload.to_activity()).await
    }

    async fn clear(&mut self) -> PresenceResult<()> {
        self.set_activity(Value::Null).await
    }

    async fn close(&mut self) -> PresenceResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        write_frame(&mut self.stream, Opcode::Close, &json!({}))
            .await
            .map_err(PresenceError::update_io)?;
        self.stream
            .shutdown()
            .await
            .map_err(PresenceError::update_io)
    }
}
