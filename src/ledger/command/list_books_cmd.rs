use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::ledger::domain::{BookFilter, LedgerService};
use crate::ledger::dto::LendingDto;

pub struct ListLendingCommand {
    ledger_service: Arc<dyn LedgerService>,
}

impl ListLendingCommand {
    pub fn new(ledger_service: Arc<dyn LedgerService>) -> Self {
        Self {
            ledger_service,
        }
    }
}

// filter is one of all, available, checked_out or overdue; q searches instead when present
#[derive(Debug, Default, Deserialize)]
pub struct ListLendingCommandRequest {
    pub filter: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListLendingCommandResponse {
    pub books: Vec<LendingDto>,
}

#[async_trait]
impl Command<ListLendingCommandRequest, ListLendingCommandResponse> for ListLendingCommand {
    async fn execute(&self, req: ListLendingCommandRequest) -> Result<ListLendingCommandResponse, CommandError> {
        let filter = BookFilter::parse(req.filter.as_deref(), req.q.as_deref())?;
        self.ledger_service.list_books(&filter)
            .await.map_err(CommandError::from).map(|books| ListLendingCommandResponse { books })
    }
}
