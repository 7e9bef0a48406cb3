use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct ListBooksCommand {
    catalog_service: Arc<dyn CatalogService>,
}

impl ListBooksCommand {
    pub fn new(catalog_service: Arc<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

// an isbn narrows the listing to copies of that edition
#[derive(Debug, Default, Deserialize)]
pub struct ListBooksCommandRequest {
    pub isbn: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListBooksCommandResponse {
    pub books: Vec<BookDto>,
}

#[async_trait]
impl Command<ListBooksCommandRequest, ListBooksCommandResponse> for ListBooksCommand {
    async fn execute(&self, req: ListBooksCommandRequest) -> Result<ListBooksCommandResponse, CommandError> {
        let books = match req.isbn {
            Some(isbn) if !isbn.trim().is_empty() => self.catalog_service.find_book_by_isbn(isbn.as_str()).await,
            _ => self.catalog_service.list_books().await,
        }.map_err(CommandError::from)?;
        Ok(ListBooksCommandResponse { books })
    }
}
