use std::collections::HashMap;

use async_trait::async_trait;

use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::memory::MemoryStore;

#[derive(Debug)]
pub struct MemoryBookRepository {
    store: MemoryStore<BookEntity>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new("book"),
        }
    }
}

impl Default for MemoryBookRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository<BookEntity> for MemoryBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        self.store.create(entity).await
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        self.store.update(entity).await
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        self.store.get(id).await
    }

    async fn delete(&self, entity: &BookEntity) -> LibraryResult<usize> {
        self.store.delete(entity).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        self.store.query(predicate, page, page_size).await
    }

    async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        self.store.scan(page, page_size).await
    }
}

#[async_trait]
impl BookRepository for MemoryBookRepository {
    async fn find_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<BookEntity>> {
        let res = self.store.query(
            &HashMap::from([("isbn".to_string(), isbn.to_string())]), None, 500).await?;
        Ok(res.records)
    }
}
