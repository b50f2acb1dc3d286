//! Error classification for the agent.
//!
//! Failures caused by the function itself (bad input, user code crash,
//! timeout) are reported to the caller differently from agent faults, so
//! the distinction is carried in the error type.

/// An error that is the function's fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("function error ({status}): {message}")]
pub struct FuncError {
    pub status: u16,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AgentError {
    #[error(transparent)]
    Function(#[from] FuncError),

    #[error(transparent)]
    System(#[from] anyhow::Error),
}

impl AgentError {
    pub fn func(status: u16, message: impl Into<String>) -> Self {
        AgentError::Function(FuncError {
            status,
            message: message.into(),
        })
    }

    pub fn is_func_error(&self) -> bool {
        matches!(self, AgentError::Function(_))
    }

    pub fn as_func_error(&self) -> Option<&FuncError> {
        match self {
            AgentError::Function(err) => Some(err),
            AgentError::System(_) => None,
        }
    }
}
