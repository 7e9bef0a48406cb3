use std::sync::Arc;
use crate::books::repository::BookRepository;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::ledger::domain::LedgerService;
use crate::ledger::domain::service::LedgerServiceImpl;
use crate::members::repository::MemberRepository;

pub fn create_ledger_service(config: &Configuration,
                             book_repository: Arc<dyn BookRepository>,
                             member_repository: Arc<dyn MemberRepository>,
                             clock: Arc<dyn Clock>) -> Arc<dyn LedgerService> {
    Arc::new(LedgerServiceImpl::new(config, book_repository, member_repository, clock))
}
