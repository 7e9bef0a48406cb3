use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    // The store failed in a way a retry will not fix.
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
    // The store could not serve the request right now, e.g. throttling or a timeout. The caller
    // can retry with or without a backoff when retryable is set.
    CurrentlyUnavailable {
        message: String,
        reason_code: Option<String>,
        retryable: bool,
    },
    // One or more books were not in the state a write expected: either a checkout precondition
    // failed or a versioned update lost a race against another writer.
    Conflict {
        message: String,
        book_ids: Vec<String>,
    },
    // A batch checkout failed and could not take back every book it had already lent;
    // book_ids are still checked out to the member.
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
    Validation {
        message: String,
        reason_code: Option<String>,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn database(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::Database { message: message.to_string(), reason_code, retryable }
    }

    pub fn duplicate_key(message: &str) -> LibraryError {
        LibraryError::DuplicateKey { message: message.to_string() }
    }

    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn unavailable(message: &str, reason_code: Option<String>, retryable: bool) -> LibraryError {
        LibraryError::CurrentlyUnavailable { message: message.to_string(), reason_code, retryable }
    }

    pub fn conflict(message: &str, book_ids: Vec<String>) -> LibraryError {
        LibraryError::Conflict { message: message.to_string(), book_ids }
    }

    pub fn partial_checkout(message: &str, book_ids: Vec<String>) -> LibraryError {
        LibraryError::PartialCheckout { message: message.to_string(), book_ids }
    }

    pub fn invalid_state(message: &str) -> LibraryError {
        LibraryError::InvalidState { message: message.to_string() }
    }

    pub fn duplicate_reservation(message: &str) -> LibraryError {
        LibraryError::DuplicateReservation { message: message.to_string() }
    }

    // Classifies a failed store call by its HTTP status: retryable failures become
    // CurrentlyUnavailable, a 404 becomes NotFound and anything else is a Database error.
    pub fn storage(message: &str, reason: Option<String>, retryable: bool) -> LibraryError {
        if retryable {
            return LibraryError::unavailable(format!("store unavailable: {}", message).as_str(), reason, true);
        }
        match reason.as_deref() {
            Some(code) if code.contains("404") => LibraryError::not_found(message),
            _ => LibraryError::database(format!("store failure: {}", message).as_str(), reason, false),
        }
    }

    pub fn validation(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Validation { message: message.to_string(), reason_code }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::Database { retryable, .. } |
            LibraryError::CurrentlyUnavailable { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::runtime(format!("io failure {}", err).as_str(), None)
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(format!("malformed json {}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(err.as_str())
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::Database { message, reason_code, .. } |
            LibraryError::CurrentlyUnavailable { message, reason_code, .. } |
            LibraryError::Validation { message, reason_code } |
            LibraryError::Runtime { message, reason_code } => match reason_code {
                Some(code) => write!(f, "{} ({})", message, code),
                None => write!(f, "{}", message),
            },
            LibraryError::Conflict { message, book_ids } |
            LibraryError::PartialCheckout { message, book_ids } => {
                write!(f, "{} [{}]", message, book_ids.join(", "))
            }
            LibraryError::DuplicateKey { message } |
            LibraryError::NotFound { message } |
            LibraryError::InvalidState { message } |
            LibraryError::DuplicateReservation { message } |
            LibraryError::Serialization { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for LibraryError {}

/// A specialized Result type for the library services and repositories.
pub type LibraryResult<T> = Result<T, LibraryError>;

// One page of records; next_page is the opaque token for the following page, if any.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub page: Option<String>,
    pub page_size: usize,
    pub next_page: Option<String>,
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn new(page: Option<&str>, page_size: usize,
               next_page: Option<String>, records: Vec<T>) -> Self {
        Self { page: page.map(str::to_string), page_size, next_page, records }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    CheckedOut,
}

impl From<String> for BookStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CheckedOut" | "Checked Out" => BookStatus::CheckedOut,
            _ => BookStatus::Available,
        }
    }
}

impl Display for BookStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BookStatus::Available => write!(f, "Available"),
            BookStatus::CheckedOut => write!(f, "CheckedOut"),
        }
    }
}
