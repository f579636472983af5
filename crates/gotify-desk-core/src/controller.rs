//! UI session: owns the debug log, message feed and control state, and maps
//! user actions and host events onto the bridge and the view.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::bridge::{
    BridgeError, EVENT_GOTIFY_MESSAGE, EVENT_WEBSOCKET_STATUS, EventHandler, HostBridge,
    HostCommand, HostEvent, Subscription, decode_error,
};
use crate::config::{ConnectionConfig, decode_saved_config};
use crate::debug_log::{ConsoleSink, DebugLog, LogSeverity, TracingConsole};
use crate::message::MessageFeed;
use crate::settings::ShellSettings;
use crate::status::{ConnectionStatus, ControlState};
use crate::view::ShellView;

pub const NO_SAVED_CONFIG_NOTICE: &str = "No saved configuration";
pub const CONFIG_SAVED_NOTICE: &str = "Configuration saved.";
pub const CONFIG_LOADED_NOTICE: &str = "Configuration loaded.";

struct Session {
    log: DebugLog,
    messages: MessageFeed,
    controls: ControlState,
    status: ConnectionStatus,
    /// Count of status events received so far.
    status_pushes: u64,
    subscriptions: Vec<Subscription>,
}

struct Inner<B, V> {
    bridge: B,
    view: V,
    console: Box<dyn ConsoleSink>,
    session: RefCell<Session>,
}

/// Cheap to clone; every clone drives the same session.
pub struct ShellController<B, V> {
    inner: Rc<Inner<B, V>>,
}

impl<B, V> Clone for ShellController<B, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<B, V> ShellController<B, V>
where
    B: HostBridge + 'static,
    V: ShellView + 'static,
{
    pub fn new(bridge: B, view: V, settings: &ShellSettings) -> Self {
        Self::with_console(bridge, view, settings, Box::new(TracingConsole))
    }

    pub fn with_console(
        bridge: B,
        view: V,
        settings: &ShellSettings,
        console: Box<dyn ConsoleSink>,
    ) -> Self {
        let settings = settings.clone().normalized();
        let session = Session {
            log: DebugLog::new(settings.log_capacity).with_debug(settings.debug),
            messages: MessageFeed::new(settings.message_capacity),
            controls: ControlState::default(),
            status: ConnectionStatus::default(),
            status_pushes: 0,
            subscriptions: Vec::new(),
        };
        Self {
            inner: Rc::new(Inner {
                bridge,
                view,
                console,
                session: RefCell::new(session),
            }),
        }
    }

    pub fn bridge(&self) -> &B {
        &self.inner.bridge
    }

    pub fn view(&self) -> &V {
        &self.inner.view
    }

    #[must_use]
    pub fn controls(&self) -> ControlState {
        self.inner.session.borrow().controls
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        self.inner.session.borrow().status.clone()
    }

    #[must_use]
    pub fn debug_log_len(&self) -> usize {
        self.inner.session.borrow().log.len()
    }

    #[must_use]
    pub fn debug_log_json(&self) -> String {
        self.inner.session.borrow().log.to_json()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.session.borrow().subscriptions.len()
    }

    pub fn log(&self, severity: LogSeverity, message: &str) {
        self.inner.console.emit(severity, message);
        let render = {
            let mut session = self.inner.session.borrow_mut();
            if !session.log.record(severity, message) {
                return;
            }
            session.log.render()
        };
        self.inner.view.render_debug_log(&render);
    }

    pub fn info(&self, message: &str) {
        self.log(LogSeverity::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogSeverity::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogSeverity::Error, message);
    }

    /// Draws every widget from current session state.
    pub fn render_all(&self) {
        let session = self.inner.session.borrow();
        let view = &self.inner.view;
        view.render_debug_log(&session.log.render());
        view.set_controls(session.controls);
        view.show_status(&session.status);
        view.render_messages(&session.messages);
    }

    pub fn clear_log(&self) {
        let render = {
            let mut session = self.inner.session.borrow_mut();
            session.log.clear();
            session.log.render()
        };
        self.inner.view.render_debug_log(&render);
        // Console only: the panel stays on its placeholder.
        self.inner.console.emit(LogSeverity::Info, "debug log cleared");
    }

    pub async fn save_config(&self) {
        self.info("save configuration clicked");
        let input = self.inner.view.read_config_input();
        let config = match ConnectionConfig::from_input(&input.server_url, &input.client_token) {
            Ok(config) => config,
            Err(error) => {
                let notice = format!("Cannot save configuration: {error}");
                self.inner.view.alert(&notice);
                self.error(&notice);
                return;
            }
        };
        self.info(&format!("server url: {}", config.server_url));
        self.info(&format!(
            "client token length: {} chars",
            config.client_token.chars().count()
        ));

        let command = HostCommand::SaveConfig(config);
        self.info(&format!("calling {}", command.name()));
        match command.send(&self.inner.bridge).await {
            Ok(result) => {
                self.info(&format!("configuration saved: {}", display_result(&result)));
                self.inner.view.alert(CONFIG_SAVED_NOTICE);
            }
            Err(error) => {
                self.error(&format!("failed to save configuration: {error}"));
                self.inner
                    .view
                    .alert(&format!("Failed to save configuration: {error}"));
            }
        }
    }

    pub async fn load_config(&self) {
        self.info("load configuration clicked");
        match self.fetch_saved_config().await {
            Ok(Some(config)) => {
                self.inner.view.fill_config_fields(&config);
                self.info("configuration filled into the form");
                self.inner.view.alert(CONFIG_LOADED_NOTICE);
            }
            Ok(None) => {
                self.inner.view.alert(NO_SAVED_CONFIG_NOTICE);
                self.warn(NO_SAVED_CONFIG_NOTICE);
            }
            Err(error) => {
                self.error(&format!("failed to load configuration: {error}"));
                self.inner
                    .view
                    .alert(&format!("Failed to load configuration: {error}"));
            }
        }
    }

    pub async fn connect(&self) {
        self.info("connect clicked");
        let command = HostCommand::StartWebsocket;
        self.info(&format!("calling {}", command.name()));
        match command.send(&self.inner.bridge).await {
            Ok(result) => {
                self.info(&format!("websocket started: {}", display_result(&result)));
                self.set_controls(ControlState::Connected);
            }
            Err(error) => {
                self.error(&format!("failed to start websocket: {error}"));
                self.inner.view.alert(&format!("Failed to connect: {error}"));
            }
        }
    }

    pub async fn disconnect(&self) {
        self.info("disconnect clicked");
        let command = HostCommand::StopWebsocket;
        self.info(&format!("calling {}", command.name()));
        match command.send(&self.inner.bridge).await {
            Ok(result) => {
                self.info(&format!("websocket stopped: {}", display_result(&result)));
                self.apply_status(ConnectionStatus::Disconnected);
                self.set_controls(ControlState::Disconnected);
            }
            Err(error) => {
                self.error(&format!("failed to stop websocket: {error}"));
                self.inner.view.alert(&format!("Failed to disconnect: {error}"));
            }
        }
    }

    pub fn handle_status_event(&self, event: HostEvent) {
        let status = ConnectionStatus::from_payload(&event.payload);
        self.info(&format!("status event received: {}", status.token()));
        self.inner.session.borrow_mut().status_pushes += 1;
        self.apply_status(status);
    }

    pub fn handle_message_event(&self, event: HostEvent) {
        let title = {
            let mut session = self.inner.session.borrow_mut();
            session.messages.push_payload(&event.payload).title.clone()
        };
        self.info(&format!("message received: {title}"));
        let session = self.inner.session.borrow();
        self.inner.view.render_messages(&session.messages);
    }

    /// Subscribes to host events, then reconciles with host state. Listeners
    /// go in first so a status pushed while reconciling is not lost.
    pub async fn startup(&self) {
        self.subscribe_events().await;
        self.reconcile().await;
        self.info("initialization complete");
    }

    /// Cancels every held subscription.
    pub async fn shutdown(&self) {
        let subscriptions = std::mem::take(&mut self.inner.session.borrow_mut().subscriptions);
        for subscription in subscriptions {
            let event = subscription.event().to_string();
            match subscription.cancel().await {
                Ok(()) => self.info(&format!("stopped listening for {event}")),
                Err(error) => self.error(&format!("failed to stop listening for {event}: {error}")),
            }
        }
    }

    async fn subscribe_events(&self) {
        self.info("registering event listeners");
        let handlers: [(&str, EventHandler); 2] = [
            (
                EVENT_WEBSOCKET_STATUS,
                self.event_handler(|controller, event| controller.handle_status_event(event)),
            ),
            (
                EVENT_GOTIFY_MESSAGE,
                self.event_handler(|controller, event| controller.handle_message_event(event)),
            ),
        ];
        for (event, handler) in handlers {
            match self.inner.bridge.listen(event, handler).await {
                Ok(subscription) => {
                    self.inner
                        .session
                        .borrow_mut()
                        .subscriptions
                        .push(subscription);
                }
                Err(error) => {
                    self.error(&format!("listener for {event} not registered: {error}"));
                }
            }
        }
        self.info("event listeners registered");
    }

    fn event_handler<F>(&self, dispatch: F) -> EventHandler
    where
        F: Fn(&Self, HostEvent) + 'static,
    {
        // Weak: the bridge holds handlers and the session holds the bridge.
        let inner = Rc::downgrade(&self.inner);
        Rc::new(move |event| {
            if let Some(inner) = inner.upgrade() {
                dispatch(&Self { inner }, event);
            }
        })
    }

    async fn reconcile(&self) {
        self.info("checking websocket state");
        let pushes_before = self.inner.session.borrow().status_pushes;
        match self.fetch_running().await {
            Ok(running) => {
                self.info(&format!("websocket running: {running}"));
                let pushed_meanwhile = self.inner.session.borrow().status_pushes != pushes_before;
                if running && pushed_meanwhile {
                    self.info("status pushed during startup check; keeping pushed status");
                } else if running {
                    self.apply_status(ConnectionStatus::Connected);
                }
            }
            Err(error) => self.error(&format!("failed to check websocket state: {error}")),
        }

        self.info("loading saved configuration");
        match self.fetch_saved_config().await {
            Ok(Some(config)) => {
                self.inner.view.fill_config_fields(&config);
                self.info("saved configuration found");
            }
            Ok(None) => self.info("no saved configuration found"),
            Err(error) => self.error(&format!("failed to load saved configuration: {error}")),
        }
    }

    async fn fetch_running(&self) -> Result<bool, BridgeError> {
        let command = HostCommand::IsWebsocketRunning;
        let value = command.send(&self.inner.bridge).await?;
        value
            .as_bool()
            .ok_or_else(|| decode_error(&command, format!("expected a boolean, got {value}")))
    }

    async fn fetch_saved_config(&self) -> Result<Option<ConnectionConfig>, BridgeError> {
        let command = HostCommand::GetConfig;
        self.info(&format!("calling {}", command.name()));
        let value = command.send(&self.inner.bridge).await?;
        decode_saved_config(value).map_err(|error| decode_error(&command, error))
    }

    fn apply_status(&self, status: ConnectionStatus) {
        self.inner.view.show_status(&status);
        let controls = ControlState::for_status(&status);
        self.inner.session.borrow_mut().status = status;
        if let Some(controls) = controls {
            self.set_controls(controls);
        }
    }

    fn set_controls(&self, state: ControlState) {
        self.inner.session.borrow_mut().controls = state;
        self.inner.view.set_controls(state);
    }
}

fn display_result(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub enum BootOutcome<B, V> {
    Ready(ShellController<B, V>),
    /// No usable host bridge; nothing was wired. `log` is what the panel shows.
    Halted { error: BridgeError, log: DebugLog },
}

/// Runs the startup sequence on an already resolved view: verify the bridge,
/// wire the controls through `wire`, subscribe to host events, reconcile.
/// A missing bridge is reported once and stops everything else.
pub async fn boot<B, V, W>(
    bridge: Result<B, BridgeError>,
    view: V,
    settings: &ShellSettings,
    console: Box<dyn ConsoleSink>,
    wire: W,
) -> BootOutcome<B, V>
where
    B: HostBridge + 'static,
    V: ShellView + 'static,
    W: FnOnce(&ShellController<B, V>),
{
    let bridge = match bridge {
        Ok(bridge) => bridge,
        Err(error) => {
            let settings = settings.clone().normalized();
            let mut log = DebugLog::new(settings.log_capacity).with_debug(settings.debug);
            for line in [
                format!("host runtime API not found: {error}"),
                "run the app inside the desktop shell rather than a plain browser".to_string(),
            ] {
                console.emit(LogSeverity::Error, &line);
                log.record(LogSeverity::Error, &line);
            }
            view.render_debug_log(&log.render());
            view.alert(&format!(
                "Error: the host runtime API is not initialized.\n\n{error}"
            ));
            return BootOutcome::Halted { error, log };
        }
    };

    let controller = ShellController::with_console(bridge, view, settings, console);
    controller.render_all();
    controller.info("host runtime confirmed");
    controller.info("binding control handlers");
    wire(&controller);
    controller.startup().await;
    BootOutcome::Ready(controller)
}
