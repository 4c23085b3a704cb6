//! Rich-presence channel for shelfsync
//!
//! The engine talks to the presence service through [`PresenceConnector`] and
//! [`PresenceSession`]. [`DiscordIpcConnector`] implements them over Discord's
//! local IPC socket; tests substitute scripted doubles.

mod error;
mod ipc;
mod payload;
mod traits;

pub use error::{PresenceError, PresenceResult};
pub use ipc::{read_frame, write_frame, DiscordIpcConnector, Opcode};
pub use payload::{PresenceButton, PresencePayload};
pub use traits::{PresenceConnector, PresenceSession};
