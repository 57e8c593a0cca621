//! SE-011: Operation error taxonomy.

use super::types::ErrorKind;
use crate::engine::classdb::AssignError;

/// A failed operation. The variant decides the reported `error_kind`;
/// the payload is the single error string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Resolution(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Process(String),
}

impl OpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Resolution(_) => ErrorKind::Resolution,
            Self::Io(_) => ErrorKind::Io,
            Self::Process(_) => ErrorKind::Process,
        }
    }

    pub fn missing_param(name: &str) -> Self {
        Self::Input(format!("Missing required parameter: {}", name))
    }
}

impl From<AssignError> for OpError {
    fn from(e: AssignError) -> Self {
        Self::Input(e.to_string())
    }
}
