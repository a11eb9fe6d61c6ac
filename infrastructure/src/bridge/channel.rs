//! Stdio channel to the bridge subprocess.
//!
//! [`StdioChannel`] owns the child process. A single background reader task
//! owns its stdout, feeds every chunk through a [`JsonFrameDecoder`] and
//! routes each complete frame:
//!
//! - **Response with a known id** → the matching pending request
//! - **Response without an id** → the oldest pending request
//! - **Response with an unknown id** → discarded (late answer to a request
//!   that already timed out)
//! - **Notification** → logged and absorbed
//!
//! Senders only write a request and wait on a `oneshot`, so no frame is lost
//! between one `send` and the next. When the reader hits EOF, an I/O error
//! or an oversized frame, the channel is marked closed and every pending
//! request fails with [`TransportError::Disconnected`].

use super::error::{BridgeError, Result};
use super::framing::{DEFAULT_MAX_FRAME_BYTES, JsonFrameDecoder};
use super::protocol::{BridgeRequest, RequestIds};
use super::transport::{MessageKind, classify_message};
use async_trait::async_trait;
use ceagent_application::{RpcTransport, TransportError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

const READ_CHUNK: usize = 8 * 1024;

/// Grace period used to detect an immediate crash when no probe is configured.
const STARTUP_GRACE: Duration = Duration::from_millis(200);

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;
type Reply = std::result::Result<Value, TransportError>;

/// Startup and shutdown behavior of [`StdioChannel::open`].
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// How long the bridge may take to answer the ready probe
    pub startup_timeout: Duration,
    /// How long `close` waits for the child before killing it
    pub shutdown_timeout: Duration,
    /// Method sent once after spawn; `None` skips the probe
    pub ready_probe: Option<String>,
    pub max_frame_bytes: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(5),
            shutdown_timeout: Duration::from_secs(5),
            ready_probe: Some("ping".to_string()),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

struct Pending {
    id: String,
    tx: oneshot::Sender<Reply>,
}

/// Pending requests keyed by send order, so "oldest" is the first entry.
type PendingMap = Arc<std::sync::Mutex<BTreeMap<u64, Pending>>>;

/// Request/response channel over a subprocess's stdin and stdout.
pub struct StdioChannel {
    writer: Mutex<Option<BoxedWriter>>,
    pending: PendingMap,
    ids: RequestIds,
    open: Arc<AtomicBool>,
    reader_handle: JoinHandle<()>,
    /// Bridge child process (killed on Drop to prevent orphans)
    child: Mutex<Option<Child>>,
    shutdown_timeout: Duration,
}

impl StdioChannel {
    /// Spawn `command` and wait until it answers the ready probe.
    pub async fn open(command: &str, args: &[String], config: ChannelConfig) -> Result<Self> {
        debug!(command, ?args, "Spawning bridge process");

        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(|source| BridgeError::Spawn {
            command: command.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| BridgeError::NotReady("bridge stdin was not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BridgeError::NotReady("bridge stdout was not captured".into()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr));
        }

        let mut channel = Self::from_streams(stdout, stdin, config.max_frame_bytes);
        channel.child = Mutex::new(Some(child));
        channel.shutdown_timeout = config.shutdown_timeout;

        if let Err(e) = channel.wait_ready(&config).await {
            channel.close().await;
            return Err(e);
        }

        info!(command, "Bridge process ready");
        Ok(channel)
    }

    /// Build a channel over arbitrary streams, with no child process.
    pub fn from_streams<R, W>(reader: R, writer: W, max_frame_bytes: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending: PendingMap = Arc::new(std::sync::Mutex::new(BTreeMap::new()));
        let open = Arc::new(AtomicBool::new(true));

        let pending_bg = Arc::clone(&pending);
        let open_bg = Arc::clone(&open);
        let reader_handle = tokio::spawn(async move {
            reader_loop(reader, JsonFrameDecoder::new(max_frame_bytes), pending_bg, open_bg).await;
        });

        Self {
            writer: Mutex::new(Some(Box::new(writer))),
            pending,
            ids: RequestIds::new(),
            open,
            reader_handle,
            child: Mutex::new(None),
            shutdown_timeout: ChannelConfig::default().shutdown_timeout,
        }
    }

    async fn wait_ready(&self, config: &ChannelConfig) -> Result<()> {
        if let Some(probe) = &config.ready_probe {
            return match self
                .send(probe, Value::Object(Default::default()), config.startup_timeout)
                .await
            {
                // Any answer, even an error, proves the bridge is reading requests.
                Ok(_) | Err(TransportError::Remote { .. }) => Ok(()),
                Err(e) => Err(BridgeError::NotReady(format!("probe '{}' failed: {}", probe, e))),
            };
        }

        tokio::time::sleep(STARTUP_GRACE.min(config.startup_timeout)).await;
        let mut child = self.child.lock().await;
        if let Some(child) = child.as_mut()
            && let Some(status) = child.try_wait()?
        {
            return Err(BridgeError::NotReady(format!(
                "bridge exited during startup ({})",
                status
            )));
        }
        Ok(())
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        lock_pending(&self.pending).len()
    }

    async fn write_request(&self, request: &BridgeRequest) -> Result<()> {
        let mut line = serde_json::to_string(request)?;
        trace!("Bridge sending: {}", line);
        line.push('\n');

        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(BridgeError::Closed)?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    fn mark_closed(&self, reason: &str) {
        self.open.store(false, Ordering::SeqCst);
        fail_all(&self.pending, reason);
    }
}

#[async_trait]
impl RpcTransport for StdioChannel {
    async fn send(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> std::result::Result<Value, TransportError> {
        if !self.is_open() {
            return Err(TransportError::Disconnected("bridge channel is closed".into()));
        }

        let (seq, id) = self.ids.next();
        let (tx, rx) = oneshot::channel();
        lock_pending(&self.pending).insert(seq, Pending { id: id.clone(), tx });

        // The reader may have failed everything between the check above and the insert.
        if !self.is_open() {
            lock_pending(&self.pending).remove(&seq);
            return Err(TransportError::Disconnected("bridge channel is closed".into()));
        }

        let request = BridgeRequest::new(id.as_str(), method, params);
        if let Err(e) = self.write_request(&request).await {
            lock_pending(&self.pending).remove(&seq);
            return match e {
                BridgeError::Serialization(e) => Err(TransportError::Protocol(e.to_string())),
                other => {
                    warn!(method, error = %other, "Bridge write failed, closing channel");
                    self.mark_closed("bridge write failed");
                    Err(TransportError::Disconnected(other.to_string()))
                }
            };
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(TransportError::Disconnected("bridge channel closed".into())),
            Err(_) => {
                lock_pending(&self.pending).remove(&seq);
                debug!(method, id = %id, "Bridge request timed out after {:?}", timeout);
                Err(TransportError::Timeout(timeout))
            }
        }
    }

    async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!("Closing bridge channel");
        }
        fail_all(&self.pending, "bridge channel closed");

        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }

        let child = self.child.lock().await.take();
        if let Some(mut child) = child {
            match tokio::time::timeout(self.shutdown_timeout, child.wait()).await {
                Ok(Ok(status)) => debug!("Bridge process exited ({})", status),
                Ok(Err(e)) => warn!("Failed to wait for bridge process: {}", e),
                Err(_) => {
                    warn!(
                        "Bridge process did not exit within {:?}, killing it",
                        self.shutdown_timeout
                    );
                    let _ = child.kill().await;
                }
            }
        }

        self.reader_handle.abort();
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for StdioChannel {
    fn drop(&mut self) {
        if let Some(child) = self.child.get_mut() {
            debug!("StdioChannel dropping, killing bridge child process");
            let _ = child.start_kill();
        }
        self.reader_handle.abort();
    }
}

fn lock_pending(pending: &PendingMap) -> std::sync::MutexGuard<'_, BTreeMap<u64, Pending>> {
    pending.lock().unwrap_or_else(|e| e.into_inner())
}

fn fail_all(pending: &PendingMap, reason: &str) {
    let drained = std::mem::take(&mut *lock_pending(pending));
    for (_, entry) in drained {
        let _ = entry.tx.send(Err(TransportError::Disconnected(reason.to_string())));
    }
}

/// Background reader loop; single owner of the bridge's stdout.
async fn reader_loop<R: AsyncRead + Unpin>(
    mut reader: R,
    mut decoder: JsonFrameDecoder,
    pending: PendingMap,
    open: Arc<AtomicBool>,
) {
    let mut chunk = vec![0u8; READ_CHUNK];

    let reason = 'read: loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break "bridge closed its output".to_string(),
            Ok(n) => n,
            Err(e) => break format!("bridge read failed: {}", e),
        };
        trace!("Bridge: read {} bytes", n);
        decoder.push(&chunk[..n]);

        loop {
            match decoder.next_frame() {
                Ok(Some(frame)) => route(frame, &pending),
                Ok(None) => break,
                Err(e) => break 'read e.to_string(),
            }
        }
    };

    info!("Bridge: reader loop ended: {}", reason);
    open.store(false, Ordering::SeqCst);
    fail_all(&pending, &reason);
}

fn route(frame: Value, pending: &PendingMap) {
    trace!("Bridge received: {}", frame);
    match classify_message(&frame) {
        MessageKind::Response(response) => {
            let entry = {
                let mut pending = lock_pending(pending);
                match &response.id {
                    Some(id) => {
                        let seq = pending
                            .iter()
                            .find(|(_, p)| &p.id == id)
                            .map(|(seq, _)| *seq);
                        seq.and_then(|seq| pending.remove(&seq))
                    }
                    None => pending.pop_first().map(|(_, p)| p),
                }
            };
            let Some(entry) = entry else {
                warn!(id = ?response.id, "Bridge: discarding response with unknown id");
                return;
            };
            let reply = response.outcome.map_err(|e| TransportError::Remote {
                code: e.code,
                message: e.message,
            });
            if entry.tx.send(reply).is_err() {
                debug!(id = %entry.id, "Bridge: requester gone before response arrived");
            }
        }
        MessageKind::Notification { method } => {
            debug!(method = %method, "Bridge: notification");
        }
        MessageKind::Unrecognized => {
            debug!("Bridge: ignoring unrecognized frame");
        }
    }
}

async fn forward_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!("bridge stderr: {}", line);
    }
}
