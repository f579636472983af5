//! What leaving the page does to the host session.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageHideAction {
    Shutdown,
    /// The page went into the back-forward cache and may be shown again with
    /// the same session, so its subscriptions stay registered.
    KeepSession,
}

impl PageHideAction {
    /// `persisted` is `None` when the event carried no transition data.
    pub(crate) fn for_persisted(persisted: Option<bool>) -> Self {
        if persisted == Some(true) {
            Self::KeepSession
        } else {
            Self::Shutdown
        }
    }
}
