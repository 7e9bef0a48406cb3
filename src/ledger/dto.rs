use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;

// LendingDto is one row of a ledger view: the book with its derived overdue flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingDto {
    pub book: BookDto,
    pub overdue: bool,
    pub borrower_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummaryDto {
    pub total_books: usize,
    pub available: usize,
    pub checked_out: usize,
    pub overdue: usize,
    pub members: usize,
    // books with a non-empty reservation queue
    pub reserved: usize,
}
