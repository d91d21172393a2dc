use thiserror::Error;

/// Why a transport call did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request could not be completed: {0}")]
    Network(String),

    #[error("server responded with HTTP {status}")]
    Http { status: u16 },

    #[error("response body did not match the task contract: {0}")]
    Decode(String),

    #[error("task id `{0}` cannot be used as a request path segment")]
    UnaddressableId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("a task needs a title")]
    MissingTitle,

    #[error("a task needs a type")]
    MissingTaskType,

    #[error(
        "unknown task type `{0}` (expected urgent, normal, teamAlignment, training or \
         administrative)"
    )]
    InvalidTaskType(String),

    #[error("the new-task form is not open")]
    ModalClosed,
}
