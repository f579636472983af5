#![allow(clippy::expect_used)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use gotify_desk_core::shim::{LISTEN_COMMAND, UNLISTEN_COMMAND, probe_bridge};
use gotify_desk_core::{
    BridgeError, BridgeInternals, BridgeKind, CallbackId, ConfigInput, ConnectionConfig,
    ConnectionStatus, ControlState, DebugLogRender, EventHandler, HostBridge, HostEvent,
    InternalsProbe, MessageFeed, ShellController, ShellSettings, ShellView,
};
use serde_json::{Value, json};

/// Host internals that answer every command from a fixed table.
#[derive(Default)]
struct FakeInternals {
    next_id: Cell<CallbackId>,
    callbacks: RefCell<BTreeMap<CallbackId, EventHandler>>,
    invocations: RefCell<Vec<(String, Value)>>,
    answers: BTreeMap<&'static str, Value>,
}

impl FakeInternals {
    fn answering(answers: &[(&'static str, Value)]) -> Self {
        Self {
            answers: answers.iter().cloned().collect(),
            ..Self::default()
        }
    }

    /// Delivers an envelope to the callback registered for `event`.
    fn deliver(&self, event: &str, payload: Value) {
        let ids = self
            .invocations
            .borrow()
            .iter()
            .filter(|(command, args)| command == LISTEN_COMMAND && args["event"] == event)
            .filter_map(|(_, args)| args["handler"].as_u64())
            .collect::<Vec<_>>();
        for id in ids {
            let handler = self.callbacks.borrow().get(&id).cloned();
            if let Some(handler) = handler {
                handler(HostEvent::from_envelope(
                    "",
                    json!({"event": event, "id": id, "payload": payload}),
                ));
            }
        }
    }

    fn commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|(command, _)| command.clone())
            .collect()
    }
}

#[async_trait(?Send)]
impl BridgeInternals for FakeInternals {
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
        Ok(self.answers.get(command).cloned().unwrap_or(Value::Null))
    }

    fn release_callback(&self, id: CallbackId) -> Result<(), BridgeError> {
        self.callbacks.borrow_mut().remove(&id);
        Ok(())
    }
}

#[derive(Default)]
struct RecordingView {
    statuses: RefCell<Vec<ConnectionStatus>>,
    controls: RefCell<Vec<ControlState>>,
    filled: RefCell<Vec<ConnectionConfig>>,
    message_counts: RefCell<Vec<usize>>,
    alerts: RefCell<Vec<String>>,
}

impl ShellView for RecordingView {
    fn read_config_input(&self) -> ConfigInput {
        ConfigInput::default()
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

    fn render_debug_log(&self, _render: &DebugLogRender) {}

    fn render_messages(&self, feed: &MessageFeed) {
        self.message_counts.borrow_mut().push(feed.len());
    }

    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }
}

struct NoNativeApi;

#[async_trait(?Send)]
impl HostBridge for NoNativeApi {
    async fn invoke(&self, _command: &str, _args: Value) -> Result<Value, BridgeError> {
        Err(BridgeError::Unavailable("not present".to_string()))
    }

    async fn listen(
        &self,
        _event: &str,
        _handler: EventHandler,
    ) -> Result<gotify_desk_core::Subscription, BridgeError> {
        Err(BridgeError::Unavailable("not present".to_string()))
    }
}

#[tokio::test]
async fn startup_through_shim_registers_then_reconciles() {
    let internals = Rc::new(FakeInternals::answering(&[
        ("is_websocket_running", json!(true)),
        (
            "get_config",
            json!({"server_url": "https://push.example.org", "client_token": "CkF"}),
        ),
    ]));
    let bridge = probe_bridge::<NoNativeApi, _>(None, InternalsProbe::Ready(Rc::clone(&internals)))
        .expect("shim installs");
    assert_eq!(bridge.kind(), BridgeKind::Shimmed);
    let view = Rc::new(RecordingView::default());
    let controller = ShellController::new(bridge, Rc::clone(&view), &ShellSettings::default());

    controller.startup().await;

    assert_eq!(
        internals.commands(),
        vec![
            LISTEN_COMMAND,
            LISTEN_COMMAND,
            "is_websocket_running",
            "get_config"
        ]
    );
    assert_eq!(controller.status(), ConnectionStatus::Connected);
    assert_eq!(view.controls.borrow().last(), Some(&ControlState::Connected));
    assert_eq!(view.filled.borrow().len(), 1);
    assert!(view.alerts.borrow().is_empty());
}

#[tokio::test]
async fn host_pushes_reach_the_view_and_shutdown_unlistens() {
    let internals = Rc::new(FakeInternals::default());
    let bridge = probe_bridge::<NoNativeApi, _>(None, InternalsProbe::Ready(Rc::clone(&internals)))
        .expect("shim installs");
    let view = Rc::new(RecordingView::default());
    let controller = ShellController::new(bridge, Rc::clone(&view), &ShellSettings::default());
    controller.startup().await;

    internals.deliver("websocket-status", json!("connected"));
    internals.deliver("gotify-message", json!({"id": 4, "title": "backup", "message": "done"}));
    assert_eq!(controller.controls(), ControlState::Connected);
    assert_eq!(view.statuses.borrow().last(), Some(&ConnectionStatus::Connected));
    assert_eq!(*view.message_counts.borrow(), vec![1]);

    controller.shutdown().await;

    let unlistens = internals
        .invocations
        .borrow()
        .iter()
        .filter(|(command, _)| command == UNLISTEN_COMMAND)
        .map(|(_, args)| args["eventId"].clone())
        .collect::<Vec<_>>();
    assert_eq!(unlistens, vec![json!(1), json!(2)]);
    assert!(internals.callbacks.borrow().is_empty());
    assert_eq!(controller.subscription_count(), 0);
}
