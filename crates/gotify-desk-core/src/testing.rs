//! In-memory host and view doubles for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;

use crate::bridge::{BridgeError, EventHandler, HostBridge, HostEvent, Subscription};
use crate::config::ConnectionConfig;
use crate::debug_log::{ConsoleSink, DebugLogRender, LogSeverity};
use crate::message::{MessageCard, MessageFeed};
use crate::shim::{BridgeInternals, CallbackId};
use crate::status::{ConnectionStatus, ControlState};
use crate::view::{ConfigInput, ShellView};

type InvokeHook = Box<dyn Fn(&MockBridge)>;
type Listeners = Rc<RefCell<Vec<(u64, String, EventHandler)>>>;

/// Host with scripted responses. Unscripted commands resolve to `null`.
/// Listen registrations are recorded in the call log as `listen:<event>`.
#[derive(Default)]
pub(crate) struct MockBridge {
    calls: RefCell<Vec<(String, Value)>>,
    responses: RefCell<HashMap<String, VecDeque<Result<Value, BridgeError>>>>,
    hooks: RefCell<HashMap<String, InvokeHook>>,
    listeners: Listeners,
    next_listener: Cell<u64>,
}

impl MockBridge {
    pub(crate) fn respond(&self, command: &str, result: Result<Value, BridgeError>) {
        self.responses
            .borrow_mut()
            .entry(command.to_string())
            .or_default()
            .push_back(result);
    }

    /// Runs `hook` while `command` is in flight.
    pub(crate) fn on_invoke(&self, command: &str, hook: impl Fn(&MockBridge) + 'static) {
        self.hooks
            .borrow_mut()
            .insert(command.to_string(), Box::new(hook));
    }

    pub(crate) fn emit(&self, event: &str, payload: Value) {
        let handlers = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, handler)| Rc::clone(handler))
            .collect::<Vec<_>>();
        for handler in handlers {
            handler(HostEvent::new(event, payload.clone()));
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub(crate) fn calls_named(&self, command: &str) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|(name, _)| name == command)
            .map(|(_, args)| args.clone())
            .collect()
    }

    pub(crate) fn call_count(&self, command: &str) -> usize {
        self.calls_named(command).len()
    }

    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

#[async_trait(?Send)]
impl HostBridge for MockBridge {
    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        self.calls.borrow_mut().push((command.to_string(), args));
        if let Some(hook) = self.hooks.borrow().get(command) {
            hook(self);
        }
        self.responses
            .borrow_mut()
            .get_mut(command)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(Value::Null))
    }

    async fn listen(
        &self,
        event: &str,
        handler: EventHandler,
    ) -> Result<Subscription, BridgeError> {
        self.calls
            .borrow_mut()
            .push((format!("listen:{event}"), Value::Null));
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.listeners
            .borrow_mut()
            .push((id, event.to_string(), handler));

        let listeners = Rc::clone(&self.listeners);
        Ok(Subscription::new(event, move || {
            async move {
                listeners.borrow_mut().retain(|(live, _, _)| *live != id);
                Ok(())
            }
            .boxed_local()
        }))
    }
}

/// Low-level primitives with a callback registry keyed by id.
#[derive(Default)]
pub(crate) struct MockInternals {
    next_id: Cell<CallbackId>,
    callbacks: RefCell<BTreeMap<CallbackId, EventHandler>>,
    invocations: RefCell<Vec<(String, Value)>>,
    rejections: RefCell<HashMap<String, String>>,
    released: RefCell<Vec<CallbackId>>,
    release_failure: RefCell<Option<String>>,
}

impl MockInternals {
    pub(crate) fn reject(&self, command: &str, message: &str) {
        self.rejections
            .borrow_mut()
            .insert(command.to_string(), message.to_string());
    }

    /// Makes every host-side release report `message`.
    pub(crate) fn fail_release(&self, message: &str) {
        *self.release_failure.borrow_mut() = Some(message.to_string());
    }

    /// Delivers a raw host envelope to callback `id`.
    pub(crate) fn fire(&self, id: CallbackId, raw: Value) {
        let handler = self.callbacks.borrow().get(&id).cloned();
        if let Some(handler) = handler {
            handler(HostEvent::from_envelope("", raw));
        }
    }

    pub(crate) fn invocations(&self) -> Vec<(String, Value)> {
        self.invocations.borrow().clone()
    }

    pub(crate) fn released(&self) -> Vec<CallbackId> {
        self.released.borrow().clone()
    }

    pub(crate) fn live_callbacks(&self) -> Vec<CallbackId> {
        self.callbacks.borrow().keys().copied().collect()
    }
}

#[async_trait(?Send)]
impl BridgeInternals for MockInternals {
    fn transform_callback(&self, handler: EventHandler) -> Result<CallbackId, BridgeError> {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.callbacks.borrow_mut().insert(id, handler);
        Ok(id)
    }

    async fn invoke(&self, command: &str, args: Value) -> Result<Value, BridgeError> {
        self.invocations
            .borrow_mut()
            .push((command.to_string(), args));
        match self.rejections.borrow().get(command) {
            Some(message) => Err(BridgeError::Rejected(message.clone())),
            None => Ok(Value::Null),
        }
    }

    fn release_callback(&self, id: CallbackId) -> Result<(), BridgeError> {
        self.callbacks.borrow_mut().remove(&id);
        self.released.borrow_mut().push(id);
        match self.release_failure.borrow().as_ref() {
            Some(message) => Err(BridgeError::Rejected(message.clone())),
            None => Ok(()),
        }
    }
}

/// View that records every draw call.
#[derive(Default)]
pub(crate) struct MockView {
    input: RefCell<ConfigInput>,
    filled: RefCell<Vec<ConnectionConfig>>,
    controls: RefCell<Vec<ControlState>>,
    statuses: RefCell<Vec<ConnectionStatus>>,
    log_renders: RefCell<Vec<DebugLogRender>>,
    message_renders: RefCell<Vec<Vec<MessageCard>>>,
    alerts: RefCell<Vec<String>>,
}

impl MockView {
    pub(crate) fn set_input(&self, server_url: &str, client_token: &str) {
        *self.input.borrow_mut() = ConfigInput {
            server_url: server_url.to_string(),
            client_token: client_token.to_string(),
        };
    }

    pub(crate) fn filled(&self) -> Vec<ConnectionConfig> {
        self.filled.borrow().clone()
    }

    pub(crate) fn alerts(&self) -> Vec<String> {
        self.alerts.borrow().clone()
    }

    pub(crate) fn last_controls(&self) -> Option<ControlState> {
        self.controls.borrow().last().copied()
    }

    pub(crate) fn last_status(&self) -> Option<ConnectionStatus> {
        self.statuses.borrow().last().cloned()
    }

    pub(crate) fn last_log_render(&self) -> Option<DebugLogRender> {
        self.log_renders.borrow().last().cloned()
    }

    pub(crate) fn last_messages(&self) -> Vec<MessageCard> {
        self.message_renders
            .borrow()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

impl ShellView for MockView {
    fn read_config_input(&self) -> ConfigInput {
        self.input.borrow().clone()
    }

    fn fill_config_fields(&self, config: &ConnectionConfig) {
        self.filled.borrow_mut().push(config.clone());
    }

    fn set_controls(&self, state: ControlState) {
        self.controls.borrow_mut().push(state);
    }

    fn show_status(&self, status: &ConnectionStatus) {
        self.statuses.borrow_mut().push(status.clone());
    }

    fn render_debug_log(&self, render: &DebugLogRender) {
        self.log_renders.borrow_mut().push(render.clone());
    }

    fn render_messages(&self, feed: &MessageFeed) {
        self.message_renders
            .borrow_mut()
            .push(feed.cards().cloned().collect());
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

/// Console sink that keeps what it was given.
#[derive(Default)]
pub(crate) struct RecordingConsole {
    lines: Rc<RefCell<Vec<(LogSeverity, String)>>>,
}

impl RecordingConsole {
    pub(crate) fn lines(&self) -> Rc<RefCell<Vec<(LogSeverity, String)>>> {
        Rc::clone(&self.lines)
    }
}

impl ConsoleSink for RecordingConsole {
    fn emit(&self, severity: LogSeverity, message: &str) {
        self.lines
            .borrow_mut()
            .push((severity, message.to_string()));
    }
}
