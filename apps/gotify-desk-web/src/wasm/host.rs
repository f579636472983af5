use std::collections::HashMap;

use async_trait::async_trait;
use futures::FutureExt;
use gotify_desk_core::shim::probe_bridge;
use gotify_desk_core::{
    BridgeError, BridgeInternals, CallbackId, EventHandler, HostBridge, HostEvent,
    InternalsProbe, Subscription,
};
use js_sys::{Array, Function, Promise, Reflect};
use serde_json::Value;
use wasm_bindgen_futures::JsFuture;

use super::*;

type HostCallback = Closure<dyn FnMut(JsValue)>;

fn property(target: &JsValue, key: &str) -> Option<JsValue> {
    let value = Reflect::get(target, &JsValue::from_str(key)).ok()?;
    if value.is_undefined() || value.is_null() {
        None
    } else {
        Some(value)
    }
}

fn function(target: &JsValue, key: &str) -> Option<Function> {
    property(target, key)?.dyn_into::<Function>().ok()
}

pub(super) fn to_js(value: &Value) -> Result<JsValue, BridgeError> {
    let text = serde_json::to_string(value)
        .map_err(|error| BridgeError::Rejected(format!("failed to encode arguments: {error}")))?;
    js_sys::JSON::parse(&text).map_err(|error| BridgeError::Rejected(js_error_message(&error)))
}

pub(super) fn from_js(value: &JsValue) -> Value {
    if value.is_undefined() || value.is_null() {
        return Value::Null;
    }
    js_sys::JSON::stringify(value)
        .ok()
        .map(String::from)
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_else(|| value.as_string().map_or(Value::Null, Value::String))
}

pub(super) fn js_error_message(error: &JsValue) -> String {
    if let Some(text) = error.as_string() {
        return text;
    }
    if let Some(error) = error.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    js_sys::JSON::stringify(error)
        .ok()
        .map(String::from)
        .unwrap_or_else(|| "unknown host error".to_string())
}

/// Calls `function` and awaits its result, whether or not it returned a promise.
async fn call(function: &Function, this: &JsValue, args: &[JsValue]) -> Result<JsValue, BridgeError> {
    let args = args.iter().collect::<Array>();
    let returned = function
        .apply(this, &args)
        .map_err(|error| BridgeError::Rejected(js_error_message(&error)))?;
    JsFuture::from(Promise::resolve(&returned))
        .await
        .map_err(|error| BridgeError::Rejected(js_error_message(&error)))
}

fn host_callback(event: &str, handler: EventHandler) -> HostCallback {
    let event = event.to_string();
    Closure::<dyn FnMut(JsValue)>::wrap(Box::new(move |raw: JsValue| {
        handler(HostEvent::from_envelope(&event, from_js(&raw)));
    }))
}

/// The host's high-level API: `__TAURI__.core.invoke` and `__TAURI__.event.listen`.
pub(crate) struct NativeBridge {
    core: JsValue,
    invoke: Function,
    event: JsValue,
    listen: Function,
}

impl NativeBridge {
    fn detect(window: &JsValue) -> Option<Self> {
        let api = property(window, NATIVE_API_GLOBAL)?;
        let core = property(&api, "core")?;
        let invoke = function(&core, "invoke")?;
        let event = property(&api, "event")?;
        let listen = function(&event, "listen")?;
        Some(Self {
            core,
            invoke,
            event,
            listen,
        })
    }
}

#[async_trait(?Send)]
impl HostBridge for NativeBridge {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        let args = to_js(&args)?;
        let result = call(&self.invoke, &self.core, &[JsValue::from_str(command), args]).await?;
        Ok(from_js(&result))
    }

    async fn listen(
        &self,
        event: &str,
        handler: EventHandler,
    ) -> Result<Subscription, BridgeError> {
        let listen_error = |message: String| BridgeError::Listen {
            event: event.to_string(),
            message,
        };
        let callback = host_callback(event, handler);
        let unlisten = call(
            &self.listen,
            &self.event,
            &[JsValue::from_str(event), callback.as_ref().clone()],
        )
        .await
        .map_err(|error| listen_error(error.to_string()))?
        .dyn_into::<Function>()
        .map_err(|_| listen_error("host returned no unlisten function".to_string()))?;

        // The closure must outlive the registration, so the cancel owns it.
        Ok(Subscription::new(event, move || {
            async move {
                let result = call(&unlisten, &JsValue::NULL, &[]).await;
                drop(callback);
                result.map(|_| ())
            }
            .boxed_local()
        }))
    }
}

/// The host's low-level IPC object, `__TAURI_INTERNALS__`.
pub(crate) struct TauriInternals {
    internals: JsValue,
    invoke: Function,
    transform_callback: Function,
    unregister_callback: Option<Function>,
    callbacks: RefCell<HashMap<CallbackId, HostCallback>>,
}

impl TauriInternals {
    fn detect(window: &JsValue) -> InternalsProbe<Self> {
        let Some(internals) = property(window, INTERNALS_GLOBAL) else {
            return InternalsProbe::Missing;
        };
        let Some(invoke) = function(&internals, "invoke") else {
            return InternalsProbe::MissingInvoke;
        };
        let Some(transform_callback) = function(&internals, "transformCallback") else {
            tracing::warn!("{INTERNALS_GLOBAL} has no transformCallback");
            return InternalsProbe::Missing;
        };
        let unregister_callback = function(&internals, "unregisterCallback");
        InternalsProbe::Ready(Self {
            internals,
            invoke,
            transform_callback,
            unregister_callback,
            callbacks: RefCell::new(HashMap::new()),
        })
    }
}

#[async_trait(?Send)]
impl BridgeInternals for TauriInternals {
    fn transform_callback(&self, handler: EventHandler) -> Result<CallbackId, BridgeError> {
        let callback = host_callback("", handler);
        let raw_id = self
            .transform_callback
            .call2(&self.internals, callback.as_ref(), &JsValue::FALSE)
            .map_err(|error| BridgeError::Rejected(js_error_message(&error)))?;
        let id = raw_id
            .as_f64()
            .filter(|id| id.is_finite() && *id >= 0.0)
            .ok_or_else(|| {
                BridgeError::Rejected(format!("transformCallback returned {raw_id:?}"))
            })?;
        let id = id as CallbackId;
        self.callbacks.borrow_mut().insert(id, callback);
        Ok(id)
    }

    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        let args = to_js(&args)?;
        let result = call(&self.invoke, &self.internals, &[JsValue::from_str(command), args]).await?;
        Ok(from_js(&result))
    }

    fn release_callback(&self, id: CallbackId) -> Result<(), BridgeError> {
        self.callbacks.borrow_mut().remove(&id);
        if let Some(unregister) = &self.unregister_callback {
            unregister
                .call1(&self.internals, &JsValue::from_f64(id as f64))
                .map_err(|error| BridgeError::Rejected(js_error_message(&error)))?;
        }
        Ok(())
    }
}

pub(super) fn probe_host() -> Result<ProbedBridge<NativeBridge, TauriInternals>, BridgeError> {
    let window = web_sys::window()
        .map(JsValue::from)
        .ok_or_else(|| BridgeError::Unavailable("window is unavailable".to_string()))?;
    probe_bridge(NativeBridge::detect(&window), TauriInternals::detect(&window))
}
