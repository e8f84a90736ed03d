//! Fatal error kinds (§7): recoverable conditions (short submission, parse
//! failure, cancellation) are handled locally and never reach this type.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("base code submission `{name}` has only {len} tokens, fewer than the required {required}")]
    BaseCodeTooShort { name: String, len: usize, required: usize },

    #[error("no valid submissions remain after filtering")]
    NoValidSubmissions,

    #[error("resource exhaustion while matching submission `{name}`")]
    ResourceExhausted { name: String },
}
