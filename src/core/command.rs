use async_trait::async_trait;
use crate::core::library::LibraryError;

#[derive(Debug)]
pub enum CommandError {
    Database {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    DuplicateKey {
        message: String,
    },
    NotFound {
        message: String,
    },
    Conflict {
        message: String,
        book_ids: Vec<String>,
    },
    PartialCheckout {
        message: String,
        book_ids: Vec<String>,
    },
    InvalidState {
        message: String,
    },
    DuplicateReservation {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    Serialization {
        message: String,
    },
    Validation {
        message: String,
        reason_code: Option<String>,
    },
}

#[async_trait]
pub trait Command<Request, Response> {
    async fn execute(&self, req: Request) -> Result<Response, CommandError>;
}

impl From<LibraryError> for CommandError {
    fn from(other: LibraryError) -> Self {
        match other {
            LibraryError::Database { message, reason_code, retryable } =>
                CommandError::Database { message, reason_code, retryable },
            LibraryError::DuplicateKey { message } => CommandError::DuplicateKey { message },
            LibraryError::NotFound { message } => CommandError::NotFound { message },
            LibraryError::CurrentlyUnavailable { message, reason_code, retryable } =>
                CommandError::Runtime { message, reason_code, retryable },
            LibraryError::Conflict { message, book_ids } => CommandError::Conflict { message, book_ids },
            LibraryError::PartialCheckout { message, book_ids } =>
                CommandError::PartialCheckout { message, book_ids },
            LibraryError::InvalidState { message } => CommandError::InvalidState { message },
            LibraryError::DuplicateReservation { message } => CommandError::DuplicateReservation { message },
            LibraryError::Validation { message, reason_code } => CommandError::Validation { message, reason_code },
            LibraryError::Serialization { message } => CommandError::Serialization { message },
            // a local failure such as io, nothing a retry would change
            LibraryError::Runtime { message, reason_code } =>
                CommandError::Runtime { message, reason_code, retryable: false },
        }
    }
}
