#![cfg_attr(test, allow(clippy::expect_used))]

#[cfg(any(target_arch = "wasm32", test))]
mod console_line;
#[cfg(any(target_arch = "wasm32", test))]
mod page_hide;
#[cfg(target_arch = "wasm32")]
mod wasm_constants;
#[cfg(target_arch = "wasm32")]
mod wasm_error;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;

    use gotify_desk_core::debug_log::TracingConsole;
    use gotify_desk_core::{BootOutcome, ProbedBridge, ShellController, ShellSettings};
    use serde::Serialize;
    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;

    use crate::wasm_constants::*;
    use crate::wasm_error::ShellError;

    mod dom;
    mod host;
    mod lifecycle;

    use dom::{DomHandles, DomView, wire_controls};
    use host::{NativeBridge, TauriInternals, probe_host};
    use lifecycle::*;

    type WebController = ShellController<ProbedBridge<NativeBridge, TauriInternals>, DomView>;

    thread_local! {
        static CONTROLLER: RefCell<Option<WebController>> = const { RefCell::new(None) };
        static HALTED_LOG: RefCell<Option<String>> = const { RefCell::new(None) };
        static SETTINGS: RefCell<ShellSettings> = RefCell::new(ShellSettings::default());
        static DIAGNOSTICS: RefCell<BootDiagnostics> = RefCell::new(BootDiagnostics::default());
        static DOCUMENT_READY_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static PAGE_HIDE_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static CLEAR_LOG_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static SAVE_CONFIG_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static LOAD_CONFIG_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static CONNECT_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
        static DISCONNECT_CLICK_HANDLER: RefCell<Option<Closure<dyn FnMut(web_sys::Event)>>> = const { RefCell::new(None) };
    }

    #[derive(Debug, Clone, Serialize)]
    struct BootDiagnostics {
        phase: String,
        detail: String,
        bridge_kind: Option<String>,
        debug: bool,
        last_error: Option<String>,
    }

    impl Default for BootDiagnostics {
        fn default() -> Self {
            Self {
                phase: "idle".to_string(),
                detail: "shell has not started".to_string(),
                bridge_kind: None,
                debug: true,
                last_error: None,
            }
        }
    }

    #[wasm_bindgen(start)]
    pub fn start() {
        console_error_panic_hook::set_once();
        let settings = read_shell_settings();
        install_tracing(&settings);
        DIAGNOSTICS.with(|state| state.borrow_mut().debug = settings.debug);
        SETTINGS.with(|slot| *slot.borrow_mut() = settings);
        set_boot_phase("booting", "waiting for the document");
        run_when_document_ready(|| spawn_local(boot()));
    }

    async fn boot() {
        let settings = SETTINGS.with(|slot| slot.borrow().clone());

        set_boot_phase("resolving", "resolving shell elements");
        let handles = match DomHandles::resolve() {
            Ok(handles) => handles,
            Err(error) => {
                tracing::error!("shell elements unavailable: {error}");
                set_boot_error(&error.to_string());
                return;
            }
        };

        set_boot_phase("probing", "looking for the host runtime API");
        let bridge = probe_host();
        if let Ok(bridge) = &bridge {
            let kind = bridge.kind().as_str().to_string();
            DIAGNOSTICS.with(|state| state.borrow_mut().bridge_kind = Some(kind));
        }

        let outcome = gotify_desk_core::boot(
            bridge,
            DomView::new(handles),
            &settings,
            Box::new(TracingConsole),
            |controller| {
                wire_controls(controller);
                install_page_hide_handler();
                CONTROLLER.with(|slot| *slot.borrow_mut() = Some(controller.clone()));
                set_boot_phase("subscribing", "registering host event listeners");
            },
        )
        .await;

        match outcome {
            BootOutcome::Ready(_) => set_boot_phase("ready", "shell initialized"),
            BootOutcome::Halted { error, log } => {
                HALTED_LOG.with(|slot| *slot.borrow_mut() = Some(log.to_json()));
                set_boot_error(&error.to_string());
            }
        }
    }

    #[wasm_bindgen]
    pub fn boot_diagnostics_json() -> String {
        DIAGNOSTICS.with(|state| {
            serde_json::to_string(&*state.borrow()).unwrap_or_else(|_| {
                "{\"phase\":\"error\",\"detail\":\"diagnostics serialization failed\"}".to_string()
            })
        })
    }

    /// Entries of the live session, or of a halted boot when no session exists.
    #[wasm_bindgen]
    pub fn debug_log_json() -> String {
        let live =
            CONTROLLER.with(|slot| slot.borrow().as_ref().map(WebController::debug_log_json));
        live.or_else(|| HALTED_LOG.with(|slot| slot.borrow().clone()))
            .unwrap_or_else(|| "[]".to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn boot_diagnostics_json() -> String {
    "{\"phase\":\"native\",\"detail\":\"webview shell diagnostics only available on wasm\"}"
        .to_string()
}

#[cfg(not(target_arch = "wasm32"))]
pub fn debug_log_json() -> String {
    "[]".to_string()
}
