use serde::{Deserialize, Serialize};
use serde_json::Value;

/// WebSocket close codes used by the hub.
pub mod close {
    pub const NORMAL: u16 = 1000;
    pub const GOING_AWAY: u16 = 1001;
    pub const CAPACITY: u16 = 1013;
}

/// A coordinate as it arrives on the wire: clients send either a JSON
/// number or a numeric string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coord {
    Num(f64),
    Text(String),
}

impl Coord {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Coord::Num(n) => Some(*n),
            Coord::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Register {
        user_id: String,
        name: Option<String>,
    },
    LocationUpdate {
        user_id: String,
        lat: Coord,
        lng: Coord,
        name: Option<String>,
    },
    StopSharing {
        user_id: Option<String>,
    },
    TrackUser {
        target_user_id: String,
    },
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntry {
    pub user_id: String,
    pub name: String,
    pub connected_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome {
        message: String,
    },
    RegistrationSuccess {
        user_id: String,
    },
    Error {
        message: String,
    },
    UserList {
        users: Vec<UserEntry>,
        timestamp: u64,
    },
    LocationUpdate {
        user_id: String,
        lat: f64,
        lng: f64,
        name: String,
        timestamp: u64,
    },
    LocationStop {
        user_id: String,
        timestamp: u64,
    },
    Pong,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidJson,
    InvalidFormat,
    UnknownType(String),
    BadPayload(String),
}

impl ParseError {
    /// The reply text a client sees for this parse failure.
    pub fn message(&self) -> String {
        match self {
            ParseError::InvalidJson => "Invalid JSON".to_string(),
            ParseError::InvalidFormat => "Invalid message format".to_string(),
            ParseError::UnknownType(kind) => format!("Unknown message type: {kind}"),
            ParseError::BadPayload(kind) => match kind.as_str() {
                "register" => "User ID is required".to_string(),
                "location_update" => "Invalid location data".to_string(),
                "track_user" => "Target user ID is required".to_string(),
                _ => "Invalid message format".to_string(),
            },
        }
    }
}

impl ClientMessage {
    /// Parses one inbound text frame. Distinguishes unparseable JSON,
    /// payloads without a string `type`, unrecognized types, and payloads
    /// whose fields fail validation for a recognized type.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let value: Value = serde_json::from_str(text).map_err(|_| ParseError::InvalidJson)?;
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Err(ParseError::InvalidFormat);
        };
        match kind {
            "register" | "location_update" | "stop_sharing" | "track_user" | "ping" => {
                let kind = kind.to_string();
                serde_json::from_value(value).map_err(|_| ParseError::BadPayload(kind))
            }
            other => Err(ParseError::UnknownType(other.to_string())),
        }
    }
}
