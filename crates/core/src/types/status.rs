//! Status events reported by the sync engine

use crate::types::common::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status tag of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Info,
    Active,
    Error,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::Idle => write!(f, "idle"),
            StatusKind::Info => write!(f, "info"),
            StatusKind::Active => write!(f, "active"),
            StatusKind::Error => write!(f, "error"),
        }
    }
}

/// One entry of the status log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    /// Monotonic sequence number assigned by the log
    pub seq: u64,
    pub kind: StatusKind,
    pub message: Option<String>,
    pub timestamp: Timestamp,
}

impl StatusEvent {
    pub fn new(seq: u64, kind: StatusKind, message: Option<String>) -> Self {
        Self {
            seq,
            kind,
            message,
            timestamp: Timestamp::now(),
        }
    }

    /// The sentinel a drained log resets to
    pub fn idle(seq: u64) -> Self {
        Self::new(seq, StatusKind::Idle, None)
    }

    pub fn is_idle(&self) -> bool {
        self.kind == StatusKind::Idle && self.message.is_none()
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "[{}] {}", self.kind, message),
            None => write!(f, "[{}]", self.kind),
        }
    }
}
