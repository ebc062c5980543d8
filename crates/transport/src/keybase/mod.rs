//! Keybase transport
//!
//! Drives the JSON API of an already running, already logged-in Keybase
//! service through its CLI:
//!
//! - `keybase chat api -m <json>` for `list`, `read` and `download`
//! - `keybase chat api-listen --filter-channel <json>` per live subscription
//!
//! Listener processes are killed on `close` or when the transport is dropped.

mod wire;

#[cfg(test)]
#[path = "wire_test.rs"]
mod wire_test;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use scribe_protocol::{Channel, MessageId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::SUBSCRIPTION_BUFFER;
use crate::error::TransportError;
use crate::traits::{LiveItem, Page, PageRequest, Subscription, Transport};

/// Keybase CLI settings
#[derive(Debug, Clone)]
pub struct KeybaseConfig {
    /// Path or name of the `keybase` binary
    pub binary: String,

    /// Alternate Keybase home directory (`--home`)
    pub home: Option<PathBuf>,

    /// Timeout for a single API call
    pub timeout: Duration,
}

impl Default for KeybaseConfig {
    fn default() -> Self {
        Self {
            binary: "keybase".to_string(),
            home: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Transport backed by the Keybase CLI
pub struct KeybaseTransport {
    config: KeybaseConfig,
    listeners: Mutex<Vec<Child>>,
    closed: AtomicBool,
}

impl KeybaseTransport {
    /// Create a transport; no process is started until the first call
    pub fn new(config: KeybaseConfig) -> Self {
        Self {
            config,
            listeners: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.config.binary);
        if let Some(home) = &self.config.home {
            cmd.arg("--home").arg(home);
        }
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn ensure_open(&self) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        Ok(())
    }

    /// Run one `chat api` call and decode its `result`
    async fn call<T: DeserializeOwned>(&self, method: &str, request: &Value) -> Result<T, TransportError> {
        self.ensure_open()?;

        let mut cmd = self.command();
        cmd.args(["chat", "api", "-m"])
            .arg(request.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(method, "keybase api call");

        let output = tokio::time::timeout(self.config.timeout, cmd.output())
            .await
            .map_err(|_| TransportError::Timeout {
                method: method.to_string(),
                secs: self.config.timeout.as_secs(),
            })?
            .map_err(|source| TransportError::Spawn {
                program: self.config.binary.clone(),
                source,
            })?;

        if !output.status.success() && output.stdout.is_empty() {
            return Err(TransportError::Command {
                command: format!("{} chat api ({method})", self.config.binary),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        wire::parse_response(&output.stdout)
    }
}

impl std::fmt::Debug for KeybaseTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeybaseTransport")
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Transport for KeybaseTransport {
    fn name(&self) -> &'static str {
        "keybase"
    }

    async fn list(&self) -> Result<Vec<Channel>, TransportError> {
        let result: wire::ListResult = self.call("list", &wire::list_request()).await?;
        Ok(result.into_channels())
    }

    async fn read(&self, channel: &Channel, request: PageRequest) -> Result<Page, TransportError> {
        let result: wire::ReadResult = self
            .call("read", &wire::read_request(channel, &request))
            .await?;

        let (page, errors) = result.into_page();
        for error in errors {
            warn!(channel = %channel.display_name(), error = %error, "skipping undecryptable message");
        }
        Ok(page)
    }

    async fn subscribe(&self, channel: &Channel) -> Result<Subscription, TransportError> {
        self.ensure_open()?;

        let mut cmd = self.command();
        cmd.args(["chat", "api-listen", "--filter-channel"])
            .arg(wire::listen_filter(channel))
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: self.config.binary.clone(),
            source,
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("listener stdout is not piped"))?;

        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        tokio::spawn(forward_listener(stdout, channel.display_name(), tx));

        self.listeners.lock().await.push(child);
        info!(channel = %channel.display_name(), "subscribed to live messages");

        Ok(Subscription::new(channel.clone(), rx))
    }

    async fn download(
        &self,
        channel: &Channel,
        message_id: MessageId,
        dest: &Path,
    ) -> Result<(), TransportError> {
        let request = wire::download_request(channel, message_id, dest);
        self.call::<Value>("download", &request)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                TransportError::Closed => TransportError::Closed,
                other => TransportError::download(message_id, other.to_string()),
            })
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let mut listeners = self.listeners.lock().await;
        let count = listeners.len();
        for mut child in listeners.drain(..) {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "failed to stop listener process");
            }
        }

        debug!(listeners = count, "keybase transport closed");
        Ok(())
    }
}

/// Turn listener output lines into live items until the process exits
async fn forward_listener(stdout: ChildStdout, channel: String, tx: mpsc::Sender<LiveItem>) {
    let mut lines = BufReader::new(stdout).lines();

    loop {
        let item = match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match wire::decode_listen_line(&line) {
                Ok(Some(event)) => LiveItem::Event(event),
                Ok(None) => continue,
                Err(e) => LiveItem::Error(e),
            },
            Ok(None) => {
                let _ = tx
                    .send(LiveItem::Error(TransportError::SubscriptionClosed { channel }))
                    .await;
                return;
            }
            Err(e) => {
                let _ = tx.send(LiveItem::Error(e.into())).await;
                return;
            }
        };

        if tx.send(item).await.is_err() {
            return;
        }
    }
}
