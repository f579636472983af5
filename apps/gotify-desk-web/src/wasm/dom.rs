use std::thread::LocalKey;

use gotify_desk_core::debug_log::EMPTY_LOG_PLACEHOLDER;
use gotify_desk_core::message::EMPTY_FEED_PLACEHOLDER;
use gotify_desk_core::{
    ConfigInput, ConnectionConfig, ConnectionStatus, ControlState, DebugLogRender, MessageFeed,
    ShellView,
};
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement, Window};

use super::*;

type ClickSlot = LocalKey<RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>>>;

pub(crate) struct DomHandles {
    window: Window,
    document: Document,
    debug_console: Option<HtmlElement>,
    clear_debug: HtmlElement,
    server_url: HtmlInputElement,
    client_token: HtmlInputElement,
    save_config: HtmlElement,
    load_config: HtmlElement,
    connect: HtmlButtonElement,
    disconnect: HtmlButtonElement,
    status_dot: HtmlElement,
    status_text: HtmlElement,
    message_list: Option<HtmlElement>,
}

fn lookup<T: JsCast>(
    document: &Document,
    id: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ShellError> {
    let Some(element) = document.get_element_by_id(id) else {
        return Ok(None);
    };
    element
        .dyn_into::<T>()
        .map(Some)
        .map_err(|_| ShellError::WrongElementType { id, expected })
}

fn require<T: JsCast>(
    document: &Document,
    id: &'static str,
    expected: &'static str,
) -> Result<T, ShellError> {
    lookup(document, id, expected)?.ok_or(ShellError::MissingElement(id))
}

impl DomHandles {
    /// Resolves every shell element. The debug panel and message list are
    /// optional; everything else must be present.
    pub(super) fn resolve() -> Result<Self, ShellError> {
        let window = web_sys::window().ok_or(ShellError::NoWindow)?;
        let document = window.document().ok_or(ShellError::NoDocument)?;
        Ok(Self {
            debug_console: lookup(&document, DEBUG_CONSOLE_ID, "HtmlElement")?,
            clear_debug: require(&document, CLEAR_DEBUG_ID, "HtmlElement")?,
            server_url: require(&document, SERVER_URL_INPUT_ID, "HtmlInputElement")?,
            client_token: require(&document, CLIENT_TOKEN_INPUT_ID, "HtmlInputElement")?,
            save_config: require(&document, SAVE_CONFIG_ID, "HtmlElement")?,
            load_config: require(&document, LOAD_CONFIG_ID, "HtmlElement")?,
            connect: require(&document, CONNECT_BUTTON_ID, "HtmlButtonElement")?,
            disconnect: require(&document, DISCONNECT_BUTTON_ID, "HtmlButtonElement")?,
            status_dot: require(&document, STATUS_DOT_ID, "HtmlElement")?,
            status_text: require(&document, STATUS_TEXT_ID, "HtmlElement")?,
            message_list: lookup(&document, MESSAGE_LIST_ID, "HtmlElement")?,
            window,
            document,
        })
    }

    fn text_element(&self, tag: &str, class_name: &str, text: &str) -> Option<Element> {
        let element = self.document.create_element(tag).ok()?;
        element.set_class_name(class_name);
        element.set_text_content(Some(text));
        Some(element)
    }
}

pub(crate) struct DomView {
    handles: DomHandles,
}

impl DomView {
    pub(super) fn new(handles: DomHandles) -> Self {
        Self { handles }
    }
}

impl ShellView for DomView {
    fn read_config_input(&self) -> ConfigInput {
        ConfigInput {
            server_url: self.handles.server_url.value(),
            client_token: self.handles.client_token.value(),
        }
    }

    fn fill_config_fields(&self, config: &ConnectionConfig) {
        self.handles.server_url.set_value(&config.server_url);
        self.handles.client_token.set_value(&config.client_token);
    }

    fn set_controls(&self, state: ControlState) {
        self.handles.connect.set_disabled(!state.connect_enabled());
        self.handles.disconnect.set_disabled(!state.disconnect_enabled());
    }

    fn show_status(&self, status: &ConnectionStatus) {
        self.handles
            .status_dot
            .set_class_name(&format!("{STATUS_DOT_CLASS} {}", status.indicator_class()));
        self.handles.status_text.set_inner_text(status.label());
    }

    fn render_debug_log(&self, render: &DebugLogRender) {
        let Some(panel) = &self.handles.debug_console else {
            return;
        };
        panel.set_text_content(None);
        match render {
            DebugLogRender::Placeholder => {
                if let Some(line) =
                    self.handles
                        .text_element("div", DEBUG_LOG_CLASS, EMPTY_LOG_PLACEHOLDER)
                {
                    let _ = panel.append_child(&line);
                }
            }
            DebugLogRender::Lines(lines) => {
                for line in lines {
                    let class_name = format!("{DEBUG_LOG_CLASS} {}", line.severity.as_str());
                    if let Some(element) = self.handles.text_element("div", &class_name, &line.text)
                    {
                        let _ = panel.append_child(&element);
                    }
                }
            }
        }
        // Newest entries are on top.
        panel.set_scroll_top(0);
    }

    fn render_messages(&self, feed: &MessageFeed) {
        let Some(list) = &self.handles.message_list else {
            return;
        };
        list.set_text_content(None);
        if feed.is_empty() {
            if let Some(empty) =
                self.handles
                    .text_element("div", "empty-state", EMPTY_FEED_PLACEHOLDER)
            {
                let _ = list.append_child(&empty);
            }
            return;
        }
        for card in feed.cards() {
            let class_name = if card.high_priority {
                format!("{MESSAGE_ITEM_CLASS} high-priority")
            } else {
                MESSAGE_ITEM_CLASS.to_string()
            };
            let Some(item) = self.handles.text_element("div", &class_name, "") else {
                continue;
            };
            let parts = [
                ("message-title", card.title.as_str()),
                ("message-body", card.body.as_str()),
                ("message-date", card.date.as_str()),
            ];
            for (part_class, text) in parts {
                if text.is_empty() {
                    continue;
                }
                if let Some(part) = self.handles.text_element("div", part_class, text) {
                    let _ = item.append_child(&part);
                }
            }
            let _ = list.append_child(&item);
        }
    }

    fn alert(&self, message: &str) {
        if self.handles.window.alert_with_message(message).is_err() {
            tracing::warn!("alert could not be shown: {message}");
        }
    }
}

fn bind_click(slot: &'static ClickSlot, element: &HtmlElement, mut action: impl FnMut() + 'static) {
    slot.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            action();
        }));
        let _ = element.add_event_listener_with_callback("click", callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });
}

/// Binds the five shell controls. Async actions run on the local executor;
/// a click never waits on another.
pub(super) fn wire_controls(controller: &WebController) {
    let handles = &controller.view().handles;

    let clear = controller.clone();
    bind_click(&CLEAR_LOG_CLICK_HANDLER, &handles.clear_debug, move || {
        clear.clear_log();
    });

    let save = controller.clone();
    bind_click(&SAVE_CONFIG_CLICK_HANDLER, &handles.save_config, move || {
        let save = save.clone();
        spawn_local(async move { save.save_config().await });
    });

    let load = controller.clone();
    bind_click(&LOAD_CONFIG_CLICK_HANDLER, &handles.load_config, move || {
        let load = load.clone();
        spawn_local(async move { load.load_config().await });
    });

    let connect = controller.clone();
    bind_click(&CONNECT_CLICK_HANDLER, &handles.connect, move || {
        let connect = connect.clone();
        spawn_local(async move { connect.connect().await });
    });

    let disconnect = controller.clone();
    bind_click(&DISCONNECT_CLICK_HANDLER, &handles.disconnect, move || {
        let disconnect = disconnect.clone();
        spawn_local(async move { disconnect.disconnect().await });
    });
}
