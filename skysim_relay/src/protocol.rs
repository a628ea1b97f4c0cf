// skysim_relay/src/protocol.rs

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

/// One entry of the fixed command table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub action: &'static str,
    pub data: &'static str,
}

/// The process-wide command table. Initialized once, never mutated; the
/// periodic sender picks uniformly from it.
pub const COMMANDS: [Command; 4] = [
    Command {
        action: "patrol",
        data: "Executing search pattern",
    },
    Command {
        action: "avoid",
        data: "Obstacle detected, adjusting path",
    },
    Command {
        action: "navigate",
        data: "Moving to waypoint",
    },
    Command {
        action: "hover",
        data: "Maintaining position",
    },
];

impl Command {
    /// The server→client wire form.
    pub fn to_message(self) -> Value {
        json!({
            "type": "command",
            "action": self.action,
            "data": self.data,
        })
    }
}

/// Client→server messages, dispatched on their `type` field.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum Inbound {
    #[serde(rename = "telemetry")]
    Telemetry {
        #[serde(default)]
        position: Option<Value>,
        #[serde(default)]
        battery: Option<Value>,
        #[serde(default, rename = "missionActive")]
        mission_active: Option<Value>,
    },
    /// Free-form status report; everything but the tag is opaque.
    #[serde(rename = "status")]
    Status {
        #[serde(flatten)]
        fields: std::collections::HashMap<String, Value>,
    },
    /// Natural-language input, under either historical tag.
    #[serde(rename = "nl_command", alias = "nl_text")]
    NaturalLanguage {
        #[serde(default)]
        original: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        command: Value,
    },
    #[serde(rename = "obstacles")]
    Obstacles {
        #[serde(default)]
        obstacles: Value,
    },
}

/// Processes one inbound line. Returns the reply to send, if the message
/// calls for one. Malformed or unrecognized input is logged and ignored;
/// it never tears down the connection.
pub fn handle_line(peer: &str, line: &str) -> Option<Value> {
    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(_) => {
            warn!(peer, line, "received non-JSON message");
            return None;
        }
    };

    match serde_json::from_value::<Inbound>(value.clone()) {
        Ok(Inbound::Telemetry {
            position,
            battery,
            mission_active,
        }) => {
            info!(peer, ?position, ?battery, ?mission_active, "telemetry");
            None
        }
        Ok(Inbound::Status { fields }) => {
            info!(peer, ?fields, "status");
            None
        }
        Ok(Inbound::NaturalLanguage {
            original,
            text,
            command,
        }) => {
            let original = original.or(text).unwrap_or_default();
            info!(peer, %original, %command, "natural-language input");
            Some(json!({
                "type": "ack",
                "message": format!("Received NL input: {original}"),
                "command": command,
            }))
        }
        Ok(Inbound::Obstacles { obstacles }) => {
            info!(peer, %obstacles, "obstacle report");
            None
        }
        Err(_) => {
            info!(peer, %value, "unrecognized message");
            None
        }
    }
}
