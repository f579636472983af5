use std::io;

use gotify_desk_core::settings::SETTINGS_GLOBAL;
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

use crate::console_line::{ConsoleMethod, console_text};
use crate::page_hide::PageHideAction;

use super::host::from_js;
use super::*;

pub(super) fn set_boot_phase(phase: &str, detail: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = phase.to_string();
        state.detail = detail.to_string();
        if phase != "error" {
            state.last_error = None;
        }
    });
    tracing::debug!("boot phase {phase}: {detail}");
}

pub(super) fn set_boot_error(message: &str) {
    DIAGNOSTICS.with(|state| {
        let mut state = state.borrow_mut();
        state.phase = "error".to_string();
        state.detail = "startup failed".to_string();
        state.last_error = Some(message.to_string());
    });
    tracing::error!("boot failed: {message}");
}

pub(super) fn read_shell_settings() -> ShellSettings {
    let value = web_sys::window()
        .and_then(|window| js_sys::Reflect::get(&window, &JsValue::from_str(SETTINGS_GLOBAL)).ok())
        .filter(|value| !value.is_undefined())
        .map(|value| from_js(&value));
    ShellSettings::from_value(value)
}

/// `tracing` events as browser console calls at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BrowserConsole;

impl<'a> MakeWriter<'a> for BrowserConsole {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Buffers one formatted event and hands it to the console on drop.
pub(super) struct ConsoleWriter {
    method: ConsoleMethod,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        Self {
            method: ConsoleMethod::for_level(level),
            buffer: Vec::new(),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let Some(text) = console_text(&self.buffer) else {
            return;
        };
        let text = JsValue::from_str(&text);
        match self.method {
            ConsoleMethod::Error => web_sys::console::error_1(&text),
            ConsoleMethod::Warn => web_sys::console::warn_1(&text),
            ConsoleMethod::Info => web_sys::console::info_1(&text),
            ConsoleMethod::Debug => web_sys::console::debug_1(&text),
        }
    }
}

pub(super) fn install_tracing(settings: &ShellSettings) {
    let max_level = if settings.debug { Level::DEBUG } else { Level::INFO };
    let installed = tracing_subscriber::fmt()
        .with_writer(BrowserConsole)
        .with_max_level(max_level)
        .with_ansi(false)
        .without_time()
        .try_init();
    if installed.is_err() {
        web_sys::console::warn_1(&JsValue::from_str("tracing subscriber already installed"));
    }
}

/// Runs `action` once the DOM is parsed.
pub(super) fn run_when_document_ready(action: impl FnOnce() + 'static) {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        set_boot_error(&ShellError::NoDocument.to_string());
        return;
    };
    if document.ready_state() != "loading" {
        action();
        return;
    }

    let mut action = Some(action);
    DOCUMENT_READY_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(move |_event| {
            if let Some(action) = action.take() {
                action();
            }
        }));
        let _ = document.add_event_listener_with_callback(
            "DOMContentLoaded",
            callback.as_ref().unchecked_ref(),
        );
        *slot.borrow_mut() = Some(callback);
    });
}

/// Cancels host subscriptions when the page goes away for good. A page
/// stored in the back-forward cache keeps them.
pub(super) fn install_page_hide_handler() {
    let Some(window) = web_sys::window() else {
        return;
    };
    PAGE_HIDE_HANDLER.with(|slot| {
        if slot.borrow().is_some() {
            return;
        }
        let on_page_hide = |event: web_sys::Event| {
            let persisted = event
                .dyn_ref::<web_sys::PageTransitionEvent>()
                .map(web_sys::PageTransitionEvent::persisted);
            if PageHideAction::for_persisted(persisted) == PageHideAction::KeepSession {
                tracing::debug!("page cached; keeping host subscriptions");
                return;
            }
            let controller = CONTROLLER.with(|slot| slot.borrow().clone());
            if let Some(controller) = controller {
                spawn_local(async move { controller.shutdown().await });
            }
        };
        let callback = Closure::<dyn FnMut(web_sys::Event)>::wrap(Box::new(on_page_hide));
        let _ = window.add_event_listener_with_callback("pagehide", callback.as_ref().unchecked_ref());
        *slot.borrow_mut() = Some(callback);
    });
}
