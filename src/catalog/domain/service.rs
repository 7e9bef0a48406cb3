use std::sync::Arc;
use async_trait::async_trait;
use tracing::{info, warn};
use crate::books::domain::model::BookEntity;
use crate::books::dto::BookDto;
use crate::books::repository::BookRepository;
use crate::catalog::domain::CatalogService;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};
use crate::core::repository::scan_all;
use crate::utils::isbn::normalize_isbn;

pub struct CatalogServiceImpl {
    book_repository: Arc<dyn BookRepository>,
    clock: Arc<dyn Clock>,
}

impl CatalogServiceImpl {
    pub fn new(_config: &Configuration, book_repository: Arc<dyn BookRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            book_repository,
            clock,
        }
    }
}

fn validate(book: &BookDto) -> LibraryResult<String> {
    if book.title.trim().is_empty() {
        return Err(LibraryError::validation("book title is required", Some("400".to_string())));
    }
    if book.author.trim().is_empty() {
        return Err(LibraryError::validation("book author is required", Some("400".to_string())));
    }
    normalize_isbn(book.isbn.as_str())
}

#[async_trait]
impl CatalogService for CatalogServiceImpl {
    async fn add_book(&self, book: &BookDto) -> LibraryResult<BookDto> {
        let isbn = validate(book)?;
        let mut entity = BookEntity::new(book.title.trim(), book.author.trim(), isbn.as_str(), book.genre.trim());
        entity.book_id = book.book_id.to_string();
        entity.cover_image = book.cover_image.clone();
        entity.created_at = self.clock.now();
        entity.updated_at = entity.created_at;
        self.book_repository.create(&entity).await?;
        info!(book_id = entity.book_id.as_str(), isbn = entity.isbn.as_str(), "book added to catalog");
        Ok(BookDto::from(&entity))
    }

    async fn remove_book(&self, id: &str) -> LibraryResult<()> {
        let book = self.book_repository.get(id).await?;
        if book.book_status == BookStatus::CheckedOut {
            warn!(book_id = id, "rejected removal of checked out book");
            return Err(LibraryError::invalid_state(
                format!("book {} is checked out; return it before removing", id).as_str()));
        }
        // a checkout landing after the read bumps the version and fails the delete
        self.book_repository.delete(&book).await.map_err(|err| {
            warn!(book_id = id, error = %err, "book changed while being removed");
            err
        })?;
        info!(book_id = id, "book removed from catalog");
        Ok(())
    }

    // copies metadata onto the stored record so lending attributes are never overwritten
    async fn update_book(&self, book: &BookDto) -> LibraryResult<BookDto> {
        let isbn = validate(book)?;
        let mut entity = self.book_repository.get(book.book_id.as_str()).await?;
        entity.version = book.version;
        entity.title = book.title.trim().to_string();
        entity.author = book.author.trim().to_string();
        entity.isbn = isbn;
        entity.genre = book.genre.trim().to_string();
        entity.cover_image = book.cover_image.clone();
        entity.updated_at = self.clock.now();
        self.book_repository.update(&entity).await?;
        entity.version += 1;
        Ok(BookDto::from(&entity))
    }

    async fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto> {
        self.book_repository.get(id).await.map(|b| BookDto::from(&b))
    }

    async fn find_book_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<BookDto>> {
        let isbn = normalize_isbn(isbn)?;
        let res = self.book_repository.find_by_isbn(isbn.as_str()).await?;
        Ok(res.iter().map(BookDto::from).collect())
    }

    async fn list_books(&self) -> LibraryResult<Vec<BookDto>> {
        let mut books: Vec<BookEntity> = scan_all(self.book_repository.as_ref()).await?;
        books.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.book_id.cmp(&b.book_id)));
        Ok(books.iter().map(BookDto::from).collect())
    }
}

impl From<&BookEntity> for BookDto {
    fn from(other: &BookEntity) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            version: other.version,
            title: other.title.to_string(),
            author: other.author.to_string(),
            isbn: other.isbn.to_string(),
            genre: other.genre.to_string(),
            cover_image: other.cover_image.clone(),
            book_status: other.book_status,
            borrower_id: other.borrower_id.clone(),
            checkout_at: other.checkout_at,
            due_at: other.due_at,
            reservations: other.reservations.clone(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&BookDto> for BookEntity {
    fn from(other: &BookDto) -> Self {
        Self {
            book_id: other.book_id.to_string(),
            version: other.version,
            title: other.title.to_string(),
            author: other.author.to_string(),
            isbn: other.isbn.to_string(),
            genre: other.genre.to_string(),
            cover_image: other.cover_image.clone(),
            book_status: other.book_status,
            borrower_id: other.borrower_id.clone(),
            checkout_at: other.checkout_at,
            due_at: other.due_at,
            reservations: other.reservations.clone(),
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
