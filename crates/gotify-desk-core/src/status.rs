use serde_json::Value;

pub const STATUS_CONNECTED: &str = "connected";
pub const STATUS_DISCONNECTED: &str = "disconnected";

/// Connection status token pushed by the host.
///
/// The host is authoritative; tokens other than the two known ones are kept
/// verbatim and displayed as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
    Other(String),
}

impl ConnectionStatus {
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            STATUS_CONNECTED => Self::Connected,
            STATUS_DISCONNECTED => Self::Disconnected,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::String(token) => Self::from_token(token),
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        match self {
            Self::Connected => STATUS_CONNECTED,
            Self::Disconnected => STATUS_DISCONNECTED,
            Self::Other(token) => token,
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::Other(token) => token,
        }
    }

    /// CSS state class for the status dot.
    #[must_use]
    pub fn indicator_class(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Other(_) => "unknown",
        }
    }
}

/// Enabled state of the connect/disconnect controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Disconnected,
    Connected,
}

impl ControlState {
    #[must_use]
    pub fn connect_enabled(self) -> bool {
        matches!(self, Self::Disconnected)
    }

    #[must_use]
    pub fn disconnect_enabled(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Controls implied by a pushed status; unknown tokens leave them alone.
    #[must_use]
    pub fn for_status(status: &ConnectionStatus) -> Option<Self> {
        match status {
            ConnectionStatus::Connected => Some(Self::Connected),
            ConnectionStatus::Disconnected => Some(Self::Disconnected),
            ConnectionStatus::Other(_) => None,
        }
    }
}
