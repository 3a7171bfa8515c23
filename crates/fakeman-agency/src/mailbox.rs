//! Cross-process signalling: inbound input, outbound messages, status.
//!
//! A [`Mailbox`] is polled once per tick and never blocks. Missing or
//! unparsable inbound payloads read as "no input".
//!
//! [`FileMailbox`] keeps each channel as a JSON file in one directory.
//! Writers replace files atomically; the reader claims inbound input by
//! renaming it to a `.consumed` tombstone before parsing, so a message is
//! processed at most once. [`ChannelMailbox`] does the same over tokio
//! channels for in-process front ends and tests.

use std::path::{Path, PathBuf};

use fakeman_core::{fs, DesireVector};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use crate::error::AgencyError;

pub const INBOUND_FILE: &str = "input.json";
pub const OUTBOUND_FILE: &str = "output.json";
pub const STATUS_FILE: &str = "state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub text:      String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub metadata:  serde_json::Map<String, serde_json::Value>,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, timestamp: f64) -> Self {
        Self { text: text.into(), timestamp, metadata: Default::default() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Response,
    Proactive,
    /// The agent looked at its options and chose to stay quiet.
    Idle,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Response  => "response",
            ActionType::Proactive => "proactive",
            ActionType::Idle      => "idle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text:            String,
    pub action_type:     ActionType,
    pub thought_summary: String,
    pub desires:         DesireVector,
    pub timestamp:       f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Initializing,
    Running,
    Stopped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status:           RunStatus,
    pub cycle:            u64,
    pub desires:          DesireVector,
    pub context:          String,
    /// Time of the last action; 0 before the first one.
    pub last_action_time: f64,
}

pub trait Mailbox: Send {
    /// Claim pending input, if any. Never blocks.
    fn take_inbound(&mut self) -> Option<InboundMessage>;
    fn post_outbound(&mut self, msg: &OutboundMessage) -> Result<(), AgencyError>;
    fn publish_status(&mut self, status: &StatusSnapshot) -> Result<(), AgencyError>;
}

// ── File mailbox ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FileMailbox {
    dir: PathBuf,
}

impl FileMailbox {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, AgencyError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| AgencyError::Mailbox(format!("{}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn tombstone(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{INBOUND_FILE}.{suffix}"))
    }

    /// Producer side: drop a message into the inbound slot.
    pub fn send_inbound(&self, msg: &InboundMessage) -> Result<(), AgencyError> {
        fs::write_json_atomic(&self.path(INBOUND_FILE), msg)?;
        Ok(())
    }

    /// Consumer side: latest outbound message, if any.
    pub fn read_outbound(&self) -> Option<OutboundMessage> {
        fs::read_json(&self.path(OUTBOUND_FILE)).ok().flatten()
    }

    pub fn read_status(&self) -> Option<StatusSnapshot> {
        fs::read_json(&self.path(STATUS_FILE)).ok().flatten()
    }
}

impl Mailbox for FileMailbox {
    fn take_inbound(&mut self) -> Option<InboundMessage> {
        let inbound = self.path(INBOUND_FILE);
        let claimed = self.tombstone("consumed");
        match std::fs::rename(&inbound, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(error = %e, path = %inbound.display(), "cannot claim inbound payload");
                return None;
            }
        }

        let parsed = std::fs::read(&claimed)
            .map_err(|e| e.to_string())
            .and_then(|bytes| serde_json::from_slice::<InboundMessage>(&bytes).map_err(|e| e.to_string()));
        match parsed {
            Ok(msg) if !msg.text.trim().is_empty() => Some(msg),
            Ok(_) => {
                tracing::debug!("inbound payload has no text, ignoring");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "malformed inbound payload, ignoring");
                if let Err(e) = std::fs::rename(&claimed, self.tombstone("rejected")) {
                    tracing::warn!(error = %e, "cannot move rejected inbound payload");
                }
                None
            }
        }
    }

    fn post_outbound(&mut self, msg: &OutboundMessage) -> Result<(), AgencyError> {
        fs::write_json_atomic(&self.path(OUTBOUND_FILE), msg)?;
        Ok(())
    }

    fn publish_status(&mut self, status: &StatusSnapshot) -> Result<(), AgencyError> {
        fs::write_json_atomic(&self.path(STATUS_FILE), status)?;
        Ok(())
    }
}

// ── Channel mailbox ──────────────────────────────────────────────────────

/// In-process mailbox over tokio channels.
pub struct ChannelMailbox {
    inbound:  mpsc::UnboundedReceiver<InboundMessage>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
    status:   watch::Sender<Option<StatusSnapshot>>,
}

/// The front-end half of a [`ChannelMailbox`].
pub struct ChannelPeer {
    pub inbound:  mpsc::UnboundedSender<InboundMessage>,
    pub outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    pub status:   watch::Receiver<Option<StatusSnapshot>>,
}

impl ChannelMailbox {
    pub fn pair() -> (Self, ChannelPeer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(None);
        (
            Self { inbound: in_rx, outbound: out_tx, status: status_tx },
            ChannelPeer { inbound: in_tx, outbound: out_rx, status: status_rx },
        )
    }
}

impl Mailbox for ChannelMailbox {
    fn take_inbound(&mut self) -> Option<InboundMessage> {
        loop {
            match self.inbound.try_recv() {
                Ok(msg) if msg.text.trim().is_empty() => continue,
                Ok(msg) => return Some(msg),
                Err(_) => return None,
            }
        }
    }

    fn post_outbound(&mut self, msg: &OutboundMessage) -> Result<(), AgencyError> {
        self.outbound
            .send(msg.clone())
            .map_err(|_| AgencyError::Mailbox("outbound receiver dropped".into()))
    }

    fn publish_status(&mut self, status: &StatusSnapshot) -> Result<(), AgencyError> {
        self.status.send_replace(Some(status.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_inbound_is_consumed_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut mb = FileMailbox::open(dir.path()).unwrap();
        assert!(mb.take_inbound().is_none());

        mb.send_inbound(&InboundMessage::new("hello", 1.0)).unwrap();
        let msg = mb.take_inbound().unwrap();
        assert_eq!(msg.text, "hello");
        assert!(mb.take_inbound().is_none());
        assert!(dir.path().join("input.json.consumed").exists());
    }

    #[test]
    fn malformed_inbound_reads_as_no_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut mb = FileMailbox::open(dir.path()).unwrap();
        std::fs::write(dir.path().join(INBOUND_FILE), b"{\"text\": ").unwrap();
        assert!(mb.take_inbound().is_none());
        assert!(dir.path().join("input.json.rejected").exists());
        assert!(mb.take_inbound().is_none());
    }

    #[test]
    fn inbound_accepts_missing_optional_fields() {
        let dir = tempfile::tempdir().unwrap();
        let mut mb = FileMailbox::open(dir.path()).unwrap();
        std::fs::write(dir.path().join(INBOUND_FILE), br#"{"text":"hi"}"#).unwrap();
        let msg = mb.take_inbound().unwrap();
        assert_eq!(msg.timestamp, 0.0);
        assert!(msg.metadata.is_empty());
    }

    #[test]
    fn outbound_and_status_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let mut mb = FileMailbox::open(dir.path()).unwrap();
        let out = OutboundMessage {
            text:            "hi".into(),
            action_type:     ActionType::Proactive,
            thought_summary: "felt like it".into(),
            desires:         DesireVector::default(),
            timestamp:       3.0,
        };
        mb.post_outbound(&out).unwrap();
        assert_eq!(mb.read_outbound(), Some(out));

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(OUTBOUND_FILE)).unwrap()).unwrap();
        assert_eq!(raw["action_type"], "proactive");

        mb.publish_status(&StatusSnapshot {
            status:           RunStatus::Running,
            cycle:            7,
            desires:          DesireVector::default(),
            context:          String::new(),
            last_action_time: 0.0,
        })
        .unwrap();
        assert_eq!(mb.read_status().unwrap().cycle, 7);
        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(dir.path().join(STATUS_FILE)).unwrap()).unwrap();
        assert_eq!(raw["last_action_time"], 0.0);
        assert_eq!(ActionType::Idle.as_str(), "idle");
    }

    #[tokio::test]
    async fn channel_mailbox_round_trip() {
        let (mut mb, mut peer) = ChannelMailbox::pair();
        assert!(mb.take_inbound().is_none());
        peer.inbound.send(InboundMessage::new("  ", 0.0)).unwrap();
        peer.inbound.send(InboundMessage::new("ping", 0.0)).unwrap();
        assert_eq!(mb.take_inbound().unwrap().text, "ping");

        mb.post_outbound(&OutboundMessage {
            text:            "pong".into(),
            action_type:     ActionType::Response,
            thought_summary: String::new(),
            desires:         DesireVector::default(),
            timestamp:       1.0,
        })
        .unwrap();
        assert_eq!(peer.outbound.recv().await.unwrap().text, "pong");
    }
}
