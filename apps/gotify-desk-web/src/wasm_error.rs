#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ShellError {
    #[error("window is unavailable")]
    NoWindow,
    #[error("document is unavailable")]
    NoDocument,
    #[error("missing element #{0}")]
    MissingElement(&'static str),
    #[error("element #{id} is not a {expected}")]
    WrongElementType {
        id: &'static str,
        expected: &'static str,
    },
}
