//! UI session core for the gotify-desk webview shell.
//!
//! Everything here is platform independent: the browser entrypoint in
//! `gotify-desk-web` supplies a [`bridge::HostBridge`] and a [`view::ShellView`]
//! and drives a [`controller::ShellController`].

#![cfg_attr(test, allow(clippy::expect_used, clippy::panic))]

pub mod bridge;
pub mod config;
pub mod controller;
pub mod debug_log;
pub mod message;
pub mod settings;
pub mod shim;
pub mod status;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::{BridgeError, EventHandler, HostBridge, HostCommand, HostEvent, Subscription};
pub use config::{ConfigInputError, ConnectionConfig};
pub use controller::{BootOutcome, ShellController, boot};
pub use debug_log::{ConsoleSink, DebugLog, DebugLogEntry, DebugLogRender, LogSeverity};
pub use message::{GotifyMessage, MessageCard, MessageFeed};
pub use settings::ShellSettings;
pub use shim::{BridgeInternals, BridgeKind, CallbackId, InternalsProbe, ProbedBridge, ShimmedBridge};
pub use status::{ConnectionStatus, ControlState};
pub use view::{ConfigInput, ShellView};
