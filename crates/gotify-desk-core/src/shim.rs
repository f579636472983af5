//! Event subscription rebuilt on the host's low-level IPC primitives, and the
//! one-time choice between the native event API and that shim.

use std::rc::Rc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use serde_json::{Value, json};

use crate::bridge::{BridgeError, EventHandler, HostBridge, Subscription};

pub const LISTEN_COMMAND: &str = "plugin:event|listen";
pub const UNLISTEN_COMMAND: &str = "plugin:event|unlisten";

/// Opaque identifier handed out by the host's callback registry.
pub type CallbackId = u64;

/// Low-level host primitives: a callback registry and a raw call dispatcher.
#[async_trait(?Send)]
pub trait BridgeInternals {
    fn transform_callback(&self, handler: EventHandler) -> Result<CallbackId, BridgeError>;

    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError>;

    /// Called once the host has dropped the registration for `id`. Local state
    /// for `id` is gone even when this returns an error.
    fn release_callback(&self, _id: CallbackId) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[async_trait(?Send)]
impl<T: BridgeInternals + ?Sized> BridgeInternals for Rc<T> {
    fn transform_callback(&self, handler: EventHandler) -> Result<CallbackId, BridgeError> {
        (**self).transform_callback(handler)
    }

    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        (**self).invoke(command, args).await
    }

    fn release_callback(&self, id: CallbackId) -> Result<(), BridgeError> {
        (**self).release_callback(id)
    }
}

/// A failed release never fails the caller; the host side is already done.
fn release<I: BridgeInternals>(internals: &I, id: CallbackId) {
    if let Err(error) = internals.release_callback(id) {
        tracing::warn!("releasing shim callback {id} failed: {error}");
    }
}

/// Result of looking for the low-level primitives.
pub enum InternalsProbe<I> {
    Missing,
    /// The internals object exists but has no call dispatcher.
    MissingInvoke,
    Ready(I),
}

/// [`HostBridge`] built from [`BridgeInternals`].
pub struct ShimmedBridge<I> {
    internals: Rc<I>,
}

impl<I> ShimmedBridge<I> {
    pub fn new(internals: I) -> Self {
        Self {
            internals: Rc::new(internals),
        }
    }
}

#[async_trait(?Send)]
impl<I: BridgeInternals + 'static> HostBridge for ShimmedBridge<I> {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        self.internals.invoke(command, args).await
    }

    async fn listen(
        &self,
        event: &str,
        handler: EventHandler,
    ) -> Result<Subscription, BridgeError> {
        tracing::debug!("registering shim listener for {event}");
        let listen_error = |error: BridgeError| BridgeError::Listen {
            event: event.to_string(),
            message: error.to_string(),
        };
        let callback_id = self
            .internals
            .transform_callback(handler)
            .map_err(listen_error)?;
        let registration = json!({
            "event": event,
            "target": { "kind": "Any" },
            "handler": callback_id,
        });
        if let Err(error) = self.internals.invoke(LISTEN_COMMAND, registration).await {
            release(&*self.internals, callback_id);
            return Err(listen_error(error));
        }
        tracing::debug!("shim listener for {event} registered as {callback_id}");

        let internals = Rc::clone(&self.internals);
        let event_name = event.to_string();
        Ok(Subscription::new(event, move || {
            async move {
                let args = json!({ "event": event_name, "eventId": callback_id });
                internals.invoke(UNLISTEN_COMMAND, args).await?;
                release(&*internals, callback_id);
                Ok(())
            }
            .boxed_local()
        }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeKind {
    Native,
    Shimmed,
}

impl BridgeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Shimmed => "shimmed",
        }
    }
}

/// The host API surface chosen at startup.
pub enum ProbedBridge<N, I> {
    Native(N),
    Shimmed(ShimmedBridge<I>),
}

impl<N, I> ProbedBridge<N, I> {
    #[must_use]
    pub fn kind(&self) -> BridgeKind {
        match self {
            Self::Native(_) => BridgeKind::Native,
            Self::Shimmed(_) => BridgeKind::Shimmed,
        }
    }
}

/// Prefers the native event API and falls back to the shim. Fails when
/// neither surface can dispatch calls.
pub fn probe_bridge<N, I>(
    native: Option<N>,
    internals: InternalsProbe<I>,
) -> Result<ProbedBridge<N, I>, BridgeError> {
    if let Some(native) = native {
        tracing::info!("host event API available; using native bridge");
        return Ok(ProbedBridge::Native(native));
    }
    match internals {
        InternalsProbe::Ready(internals) => {
            tracing::info!("host event API missing; installing listen shim over internals");
            Ok(ProbedBridge::Shimmed(ShimmedBridge::new(internals)))
        }
        InternalsProbe::MissingInvoke => {
            tracing::error!("host internals expose no invoke; listen shim not installed");
            Err(BridgeError::Unavailable(
                "host internals do not expose invoke".to_string(),
            ))
        }
        InternalsProbe::Missing => Err(BridgeError::Unavailable(
            "no host runtime API found; the page is not running inside the desktop shell"
                .to_string(),
        )),
    }
}

#[async_trait(?Send)]
impl<N: HostBridge, I: BridgeInternals + 'static> HostBridge for ProbedBridge<N, I> {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        match self {
            Self::Native(bridge) => bridge.invoke(command, args).await,
            Self::Shimmed(bridge) => bridge.invoke(command, args).await,
        }
    }

    async fn listen(
        &self,
        event: &str,
        handler: EventHandler,
    ) -> Result<Subscription, BridgeError> {
        match self {
            Self::Native(bridge) => bridge.listen(event, handler).await,
            Self::Shimmed(bridge) => bridge.listen(event, handler).await,
        }
    }
}
