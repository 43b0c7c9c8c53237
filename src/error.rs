use thiserror::Error;

use crate::bytecode::MalformedProgram;
use crate::runtime::{RunReport, RuntimeError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Malformed(#[from] MalformedProgram),

    /// A fatal runtime error; `partial` holds what had been produced.
    #[error("{error}")]
    Runtime {
        error: RuntimeError,
        partial: Box<RunReport>,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report encoding failed: {0}")]
    Encode(#[from] postcard::Error),
}

impl Error {
    /// Output and state produced before a fatal runtime error.
    pub fn partial(&self) -> Option<&RunReport> {
        match self {
            Error::Runtime { partial, .. } => Some(&**partial),
            _ => None,
        }
    }
}

impl From<crate::runtime::RunError> for Error {
    fn from(e: crate::runtime::RunError) -> Self {
        Error::Runtime {
            error: e.error,
            partial: Box::new(e.partial),
        }
    }
}
