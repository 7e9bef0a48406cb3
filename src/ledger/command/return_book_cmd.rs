use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::core::command::{Command, CommandError};
use crate::ledger::domain::LedgerService;

pub struct ReturnBookCommand {
    ledger_service: Arc<dyn LedgerService>,
}

impl ReturnBookCommand {
    pub fn new(ledger_service: Arc<dyn LedgerService>) -> Self {
        Self {
            ledger_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReturnBookCommandRequest {
    pub book_id: String,
}

impl ReturnBookCommandRequest {
    pub fn new(book_id: &str) -> Self {
        Self {
            book_id: book_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReturnBookCommandResponse {
    pub book: BookDto,
}

#[async_trait]
impl Command<ReturnBookCommandRequest, ReturnBookCommandResponse> for ReturnBookCommand {
    async fn execute(&self, req: ReturnBookCommandRequest) -> Result<ReturnBookCommandResponse, CommandError> {
        self.ledger_service.return_book(req.book_id.as_str())
            .await.map_err(CommandError::from).map(|book| ReturnBookCommandResponse { book })
    }
}
