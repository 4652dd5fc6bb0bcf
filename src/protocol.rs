//! JSON text frames exchanged with the backend.
//!
//! Inbound:  `{"type":"cmd","cmd":"forward"}`
//! Outbound: `{"type":"ack","command":"forward","status":"received"}` and
//!           `{"type":"telemetry","pose":{..},"speed":..,"battery":..,"cycle":..,"timestamp":..}`

use rover_kinematics::Command;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::SharedState;
use crate::telemetry::TelemetryFrame;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unexpected binary frame ({0} bytes)")]
    Binary(usize),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Cmd {
        #[serde(default)]
        cmd: Command,
    },
    /// Any other frame type the backend broadcasts (config, update, ...).
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Received,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    Ack { command: Command, status: AckStatus },
    Telemetry(TelemetryFrame),
}

impl Outbound {
    pub fn ack(command: Command) -> Self {
        Outbound::Ack {
            command,
            status: AckStatus::Received,
        }
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn parse_inbound(text: &str) -> Result<Inbound, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// Apply one inbound text frame to the shared state.
///
/// Returns the acknowledgment to send back, if any. Malformed payloads are
/// logged and dropped without touching the active command.
pub fn handle_inbound(text: &str, shared: &SharedState) -> Option<Outbound> {
    match parse_inbound(text) {
        Ok(Inbound::Cmd { cmd }) => {
            let prev = shared.set_command(cmd);
            info!(command = %cmd, previous = %prev, "Received command");
            Some(Outbound::ack(cmd))
        }
        Ok(Inbound::Other) => {
            debug!(frame = text, "Ignoring non-command frame");
            None
        }
        Err(e) => {
            warn!(error = %e, "Discarding malformed inbound frame");
            None
        }
    }
}
