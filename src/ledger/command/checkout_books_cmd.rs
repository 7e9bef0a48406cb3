use std::sync::Arc;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::core::command::{Command, CommandError};
use crate::ledger::domain::LedgerService;
use crate::utils::date::opt_serializer;

pub struct CheckoutBooksCommand {
    ledger_service: Arc<dyn LedgerService>,
}

impl CheckoutBooksCommand {
    pub fn new(ledger_service: Arc<dyn LedgerService>) -> Self {
        Self {
            ledger_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckoutBooksCommandRequest {
    pub book_ids: Vec<String>,
    pub member_id: String,
    // defaults to the configured loan period from now
    #[serde(with = "opt_serializer", default)]
    pub due_at: Option<NaiveDateTime>,
}

impl CheckoutBooksCommandRequest {
    pub fn new(book_ids: &[&str], member_id: &str) -> Self {
        Self {
            book_ids: book_ids.iter().map(|id| id.to_string()).collect(),
            member_id: member_id.to_string(),
            due_at: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutBooksCommandResponse {
    pub books: Vec<BookDto>,
}

#[async_trait]
impl Command<CheckoutBooksCommandRequest, CheckoutBooksCommandResponse> for CheckoutBooksCommand {
    async fn execute(&self, req: CheckoutBooksCommandRequest) -> Result<CheckoutBooksCommandResponse, CommandError> {
        self.ledger_service.check_out(&req.book_ids, req.member_id.as_str(), req.due_at)
            .await.map_err(CommandError::from).map(|books| CheckoutBooksCommandResponse { books })
    }
}
