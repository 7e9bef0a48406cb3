use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::ledger::domain::LedgerService;
use crate::ledger::dto::LedgerSummaryDto;

pub struct SummaryCommand {
    ledger_service: Arc<dyn LedgerService>,
}

impl SummaryCommand {
    pub fn new(ledger_service: Arc<dyn LedgerService>) -> Self {
        Self {
            ledger_service,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryCommandRequest {}

#[derive(Debug, Serialize)]
pub struct SummaryCommandResponse {
    pub summary: LedgerSummaryDto,
}

#[async_trait]
impl Command<SummaryCommandRequest, SummaryCommandResponse> for SummaryCommand {
    async fn execute(&self, _req: SummaryCommandRequest) -> Result<SummaryCommandResponse, CommandError> {
        self.ledger_service.summary()
            .await.map_err(CommandError::from).map(|summary| SummaryCommandResponse { summary })
    }
}
