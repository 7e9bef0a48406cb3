use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};
use crate::ledger::command::book_status_cmd::{BookStatusCommand, BookStatusCommandRequest, BookStatusCommandResponse};
use crate::ledger::command::checkout_books_cmd::{CheckoutBooksCommand, CheckoutBooksCommandRequest, CheckoutBooksCommandResponse};
use crate::ledger::command::list_books_cmd::{ListLendingCommand, ListLendingCommandRequest, ListLendingCommandResponse};
use crate::ledger::command::reserve_book_cmd::{ReserveBookCommand, ReserveBookCommandRequest, ReserveBookCommandResponse};
use crate::ledger::command::return_book_cmd::{ReturnBookCommand, ReturnBookCommandRequest, ReturnBookCommandResponse};
use crate::ledger::command::summary_cmd::{SummaryCommand, SummaryCommandRequest, SummaryCommandResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ledger/checkout", post(checkout_books))
        .route("/ledger/books", get(list_books))
        .route("/ledger/books/:id", get(book_status))
        .route("/ledger/books/:id/return", post(return_book))
        .route("/ledger/books/:id/reserve", post(reserve_book))
        .route("/ledger/summary", get(summary))
}

pub async fn checkout_books(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<CheckoutBooksCommandResponse>, ServerError> {
    let req: CheckoutBooksCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let res = CheckoutBooksCommand::new(state.ledger.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn return_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>) -> Result<Json<ReturnBookCommandResponse>, ServerError> {
    let req = ReturnBookCommandRequest { book_id };
    let res = ReturnBookCommand::new(state.ledger.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn reserve_book(
    State(state): State<AppState>,
    Path(book_id): Path<String>,
    json: Json<Value>) -> Result<Json<ReserveBookCommandResponse>, ServerError> {
    let mut req: ReserveBookCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.book_id = book_id;
    let res = ReserveBookCommand::new(state.ledger.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn list_books(
    State(state): State<AppState>,
    Query(req): Query<ListLendingCommandRequest>) -> Result<Json<ListLendingCommandResponse>, ServerError> {
    let res = ListLendingCommand::new(state.ledger.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn book_status(
    State(state): State<AppState>,
    Path(book_id): Path<String>) -> Result<Json<BookStatusCommandResponse>, ServerError> {
    let req = BookStatusCommandRequest { book_id };
    let res = BookStatusCommand::new(state.ledger.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn summary(
    State(state): State<AppState>) -> Result<Json<SummaryCommandResponse>, ServerError> {
    let res = SummaryCommand::new(state.ledger.clone()).execute(SummaryCommandRequest::default()).await?;
    Ok(Json(res))
}
