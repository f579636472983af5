//! Call and event surface of the host runtime.

use std::fmt;
use std::rc::Rc;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::ConnectionConfig;

pub const EVENT_WEBSOCKET_STATUS: &str = "websocket-status";
pub const EVENT_GOTIFY_MESSAGE: &str = "gotify-message";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    #[error("host bridge is unavailable: {0}")]
    Unavailable(String),
    /// The host rejected the call; the message is what the host reported.
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected result from `{command}`: {message}")]
    Decode { command: String, message: String },
    #[error("failed to listen for `{event}`: {message}")]
    Listen { event: String, message: String },
}

/// Event envelope delivered by the host. Only `payload` carries data the
/// shell uses.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HostEvent {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl HostEvent {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// Reads an envelope; anything that is not an envelope is treated as a
    /// bare payload for `event`.
    #[must_use]
    pub fn from_envelope(event: &str, raw: Value) -> Self {
        let is_envelope = raw
            .as_object()
            .is_some_and(|object| object.contains_key("payload"));
        if is_envelope {
            if let Ok(mut parsed) = serde_json::from_value::<Self>(raw.clone()) {
                if parsed.event.is_empty() {
                    parsed.event = event.to_string();
                }
                return parsed;
            }
        }
        Self::new(event, raw)
    }
}

pub type EventHandler = Rc<dyn Fn(HostEvent)>;

type CancelFn = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<(), BridgeError>>>;

/// A live event registration. Cancelling consumes the handle; dropping it
/// leaves the registration in place on the host.
pub struct Subscription {
    event: String,
    cancel: CancelFn,
}

impl Subscription {
    pub fn new<F>(event: impl Into<String>, cancel: F) -> Self
    where
        F: FnOnce() -> LocalBoxFuture<'static, Result<(), BridgeError>> + 'static,
    {
        Self {
            event: event.into(),
            cancel: Box::new(cancel),
        }
    }

    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    pub async fn cancel(self) -> Result<(), BridgeError> {
        (self.cancel)().await
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

#[async_trait(?Send)]
pub trait HostBridge {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError>;

    async fn listen(&self, event: &str, handler: EventHandler)
    -> Result<Subscription, BridgeError>;
}

#[async_trait(?Send)]
impl<T: HostBridge + ?Sized> HostBridge for Rc<T> {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        (**self).invoke(command, args).await
    }

    async fn listen(
        &self,
        event: &str,
        handler: EventHandler,
    ) -> Result<Subscription, BridgeError> {
        (**self).listen(event, handler).await
    }
}

/// Remote operations the shell calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    SaveConfig(ConnectionConfig),
    GetConfig,
    StartWebsocket,
    StopWebsocket,
    IsWebsocketRunning,
}

impl HostCommand {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SaveConfig(_) => "save_config",
            Self::GetConfig => "get_config",
            Self::StartWebsocket => "start_websocket",
            Self::StopWebsocket => "stop_websocket",
            Self::IsWebsocketRunning => "is_websocket_running",
        }
    }

    #[must_use]
    pub fn args(&self) -> Value {
        match self {
            Self::SaveConfig(config) => config.save_args(),
            _ => json!({}),
        }
    }

    pub async fn send<B: HostBridge + ?Sized>(&self, bridge: &B) -> Result<Value, BridgeError> {
        bridge.invoke(self.name(), self.args()).await
    }
}

pub(crate) fn decode_error(command: &HostCommand, message: impl fmt::Display) -> BridgeError {
    BridgeError::Decode {
        command: command.name().to_string(),
        message: message.to_string(),
    }
}
