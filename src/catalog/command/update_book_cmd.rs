use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::books::dto::BookDto;
use crate::catalog::domain::CatalogService;
use crate::core::command::{Command, CommandError};

pub struct UpdateBookCommand {
    catalog_service: Arc<dyn CatalogService>,
}

impl UpdateBookCommand {
    pub fn new(catalog_service: Arc<dyn CatalogService>) -> Self {
        Self {
            catalog_service,
        }
    }
}

// omitted fields keep their stored value; a version, when given, must match the stored one
#[derive(Debug, Default, Deserialize)]
pub struct UpdateBookCommandRequest {
    #[serde(default)]
    pub book_id: String,
    pub version: Option<i64>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: Option<String>,
    pub cover_image: Option<String>,
}

impl UpdateBookCommandRequest {
    pub fn new(book_id: &str, title: Option<&str>, author: Option<&str>) -> Self {
        Self {
            book_id: book_id.to_string(),
            title: title.map(|s| s.to_string()),
            author: author.map(|s| s.to_string()),
            ..Default::default()
        }
    }
    pub fn build_book(&self, current: BookDto) -> BookDto {
        let mut book = current;
        if let Some(version) = self.version {
            book.version = version;
        }
        if let Some(title) = &self.title {
            book.title = title.to_string();
        }
        if let Some(author) = &self.author {
            book.author = author.to_string();
        }
        if let Some(isbn) = &self.isbn {
            book.isbn = isbn.to_string();
        }
        if let Some(genre) = &self.genre {
            book.genre = genre.to_string();
        }
        if self.cover_image.is_some() {
            book.cover_image = self.cover_image.clone();
        }
        book
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateBookCommandResponse {
    pub book: BookDto,
}

impl UpdateBookCommandResponse {
    pub fn new(book: BookDto) -> Self {
        Self {
            book,
        }
    }
}

#[async_trait]
impl Command<UpdateBookCommandRequest, UpdateBookCommandResponse> for UpdateBookCommand {
    async fn execute(&self, req: UpdateBookCommandRequest) -> Result<UpdateBookCommandResponse, CommandError> {
        let current = self.catalog_service.find_book_by_id(req.book_id.as_str()).await?;
        let book = req.build_book(current);
        self.catalog_service.update_book(&book).await.map_err(CommandError::from).map(UpdateBookCommandResponse::new)
    }
}
