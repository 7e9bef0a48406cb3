use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::core::command::{Command, CommandError};
use crate::ledger::domain::LedgerService;

pub struct ReserveBookCommand {
    ledger_service: Arc<dyn LedgerService>,
}

impl ReserveBookCommand {
    pub fn new(ledger_service: Arc<dyn LedgerService>) -> Self {
        Self {
            ledger_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReserveBookCommandRequest {
    #[serde(default)]
    pub book_id: String,
    pub member_id: String,
}

impl ReserveBookCommandRequest {
    pub fn new(book_id: &str, member_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
            member_id: member_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReserveBookCommandResponse {
    pub book: BookDto,
    // 1-based place of the member in the queue
    pub position: usize,
}

#[async_trait]
impl Command<ReserveBookCommandRequest, ReserveBookCommandResponse> for ReserveBookCommand {
    async fn execute(&self, req: ReserveBookCommandRequest) -> Result<ReserveBookCommandResponse, CommandError> {
        let book = self.ledger_service.reserve_book(req.book_id.as_str(), req.member_id.as_str()).await?;
        let position = book.reservations.len();
        Ok(ReserveBookCommandResponse { book, position })
    }
}
