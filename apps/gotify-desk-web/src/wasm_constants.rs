pub(crate) const DEBUG_CONSOLE_ID: &str = "debugConsole";
pub(crate) const CLEAR_DEBUG_ID: &str = "clearDebug";
pub(crate) const SERVER_URL_INPUT_ID: &str = "serverUrl";
pub(crate) const CLIENT_TOKEN_INPUT_ID: &str = "clientToken";
pub(crate) const SAVE_CONFIG_ID: &str = "saveConfig";
pub(crate) const LOAD_CONFIG_ID: &str = "loadConfig";
pub(crate) const CONNECT_BUTTON_ID: &str = "connectBtn";
pub(crate) const DISCONNECT_BUTTON_ID: &str = "disconnectBtn";
pub(crate) const STATUS_DOT_ID: &str = "statusDot";
pub(crate) const STATUS_TEXT_ID: &str = "statusText";
pub(crate) const MESSAGE_LIST_ID: &str = "messageList";

pub(crate) const NATIVE_API_GLOBAL: &str = "__TAURI__";
pub(crate) const INTERNALS_GLOBAL: &str = "__TAURI_INTERNALS__";

pub(crate) const DEBUG_LOG_CLASS: &str = "debug-log";
pub(crate) const MESSAGE_ITEM_CLASS: &str = "message-item";
pub(crate) const STATUS_DOT_CLASS: &str = "status-dot";
