use std::rc::Rc;

use crate::config::ConnectionConfig;
use crate::debug_log::DebugLogRender;
use crate::message::MessageFeed;
use crate::status::{ConnectionStatus, ControlState};

/// Raw, untrimmed contents of the config form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigInput {
    pub server_url: String,
    pub client_token: String,
}

/// Surface the controller draws on. Implementations own their widgets and
/// must not call back into the controller.
pub trait ShellView {
    fn read_config_input(&self) -> ConfigInput;
    fn fill_config_fields(&self, config: &ConnectionConfig);
    fn set_controls(&self, state: ControlState);
    fn show_status(&self, status: &ConnectionStatus);
    /// Redraws the debug panel; a view without a mounted panel ignores it.
    fn render_debug_log(&self, render: &DebugLogRender);
    fn render_messages(&self, feed: &MessageFeed);
    /// Blocking user notice.
    fn alert(&self, message: &str);
}

impl<T: ShellView + ?Sized> ShellView for Rc<T> {
    fn read_config_input(&self) -> ConfigInput {
        (**self).read_config_input()
    }

    fn fill_config_fields(&self, config: &ConnectionConfig) {
        (**self).fill_config_fields(config);
    }

    fn set_controls(&self, state: ControlState) {
        (**self).set_controls(state);
    }

    fn show_status(&self, status: &ConnectionStatus) {
        (**self).show_status(status);
    }

    fn render_debug_log(&self, render: &DebugLogRender) {
        (**self).render_debug_log(render);
    }

    fn render_messages(&self, feed: &MessageFeed) {
        (**self).render_messages(feed);
    }

    fn alert(&self, message: &str) {
        (**self).alert(message);
    }
}
