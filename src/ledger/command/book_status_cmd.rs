use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::ledger::domain::LedgerService;
use crate::ledger::dto::LendingDto;

pub struct BookStatusCommand {
    ledger_service: Arc<dyn LedgerService>,
}

impl BookStatusCommand {
    pub fn new(ledger_service: Arc<dyn LedgerService>) -> Self {
        Self {
            ledger_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BookStatusCommandRequest {
    pub book_id: String,
}

#[derive(Debug, Serialize)]
pub struct BookStatusCommandResponse {
    pub status: LendingDto,
}

#[async_trait]
impl Command<BookStatusCommandRequest, BookStatusCommandResponse> for BookStatusCommand {
    async fn execute(&self, req: BookStatusCommandRequest) -> Result<BookStatusCommandResponse, CommandError> {
        self.ledger_service.book_status(req.book_id.as_str())
            .await.map_err(CommandError::from).map(|status| BookStatusCommandResponse { status })
    }
}
