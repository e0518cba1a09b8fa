use thiserror::Error;

/// Why a trajectory update did not render.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Transport failed before a response arrived.
    #[error("network failure: {0}")]
    Network(String),
    /// Non-2xx status or a body that does not decode.
    #[error("bad response: {0}")]
    BadResponse(String),
    /// No algorithm enabled. Guarded in the UI, rejected again at submission.
    #[error("no algorithm selected")]
    EmptySelection,
}
