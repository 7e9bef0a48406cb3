pub mod rules;
pub mod service;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::core::library::{LibraryError, LibraryResult};
use crate::ledger::dto::{LedgerSummaryDto, LendingDto};

// BookFilter selects which books a ledger listing returns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookFilter {
    #[default]
    All,
    Available,
    CheckedOut,
    Overdue,
    // case-insensitive match over title, author, isbn, genre and borrower name
    Search(String),
}

impl BookFilter {
    // a non-empty search text takes precedence over the named filter
    pub fn parse(filter: Option<&str>, text: Option<&str>) -> LibraryResult<BookFilter> {
        if let Some(text) = text.map(|t| t.trim()).filter(|t| !t.is_empty()) {
            return Ok(BookFilter::Search(text.to_string()));
        }
        match filter.map(|f| f.trim().to_lowercase()).unwrap_or_default().as_str() {
            "" | "all" => Ok(BookFilter::All),
            "available" => Ok(BookFilter::Available),
            "checked_out" | "checkedout" | "checked-out" => Ok(BookFilter::CheckedOut),
            "overdue" => Ok(BookFilter::Overdue),
            other => Err(LibraryError::validation(
                format!("unknown book filter {}", other).as_str(), Some("400".to_string()))),
        }
    }
}

#[async_trait]
pub trait LedgerService: Sync + Send {
    // checks out every book of the batch to the member or none of them
    async fn check_out(&self, book_ids: &[String], member_id: &str,
                       due_at: Option<NaiveDateTime>) -> LibraryResult<Vec<BookDto>>;
    // returns the book, handing it to the head of its reservation queue if there is one
    async fn return_book(&self, book_id: &str) -> LibraryResult<BookDto>;
    async fn reserve_book(&self, book_id: &str, member_id: &str) -> LibraryResult<BookDto>;
    async fn list_books(&self, filter: &BookFilter) -> LibraryResult<Vec<LendingDto>>;
    async fn book_status(&self, book_id: &str) -> LibraryResult<LendingDto>;
    async fn summary(&self) -> LibraryResult<LedgerSummaryDto>;
}
