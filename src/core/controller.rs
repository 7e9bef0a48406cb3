use std::sync::Arc;
use axum::http::StatusCode;
use crate::books::factory::create_book_repository;
use crate::books::repository::BookRepository;
use crate::catalog::domain::CatalogService;
use crate::catalog::factory::create_catalog_service;
use crate::core::clock::{Clock, SystemClock};
use crate::core::command::CommandError;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::ledger::domain::LedgerService;
use crate::ledger::factory::create_ledger_service;
use crate::members::domain::MemberService;
use crate::members::factory::{create_member_repository, create_member_service};
use crate::members::repository::MemberRepository;

// AppState carries the services every handler shares; they are built once at start-up.
#[derive(Clone)]
pub struct AppState {
    pub config: Configuration,
    pub store: RepositoryStore,
    pub catalog: Arc<dyn CatalogService>,
    pub members: Arc<dyn MemberService>,
    pub ledger: Arc<dyn LedgerService>,
}

impl AppState {
    pub async fn build(config: Configuration, store: RepositoryStore) -> AppState {
        let book_repository = create_book_repository(store).await;
        let member_repository = create_member_repository(store).await;
        AppState::with_repositories(config, store, book_repository, member_repository, Arc::new(SystemClock))
    }

    pub fn with_repositories(config: Configuration, store: RepositoryStore,
                             book_repository: Arc<dyn BookRepository>,
                             member_repository: Arc<dyn MemberRepository>,
                             clock: Arc<dyn Clock>) -> AppState {
        AppState {
            catalog: create_catalog_service(&config, book_repository.clone(), clock.clone()),
            members: create_member_service(&config, member_repository.clone(), clock.clone()),
            ledger: create_ledger_service(&config, book_repository, member_repository, clock),
            config,
            store,
        }
    }
}

pub type ServerError = (StatusCode, String);

pub fn json_to_server_error(err: serde_json::Error) -> ServerError {
    (StatusCode::BAD_REQUEST, format!("{}", err))
}

impl From<CommandError> for ServerError {
    fn from(err: CommandError) -> Self {
        let status = match &err {
            CommandError::NotFound { .. } => StatusCode::NOT_FOUND,
            CommandError::DuplicateKey { .. } |
            CommandError::Conflict { .. } |
            CommandError::DuplicateReservation { .. } => StatusCode::CONFLICT,
            CommandError::InvalidState { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CommandError::Serialization { .. } |
            CommandError::Validation { .. } => StatusCode::BAD_REQUEST,
            CommandError::Runtime { retryable: true, .. } => StatusCode::SERVICE_UNAVAILABLE,
            CommandError::Database { .. } |
            CommandError::PartialCheckout { .. } |
            CommandError::Runtime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, format!("{:?}", err))
    }
}
