use std::sync::Arc;
use crate::books::repository::BookRepository;
use crate::books::repository::ddb_book_repository::DDBBookRepository;
use crate::books::repository::memory_book_repository::MemoryBookRepository;
use crate::core::repository::RepositoryStore;
use crate::utils::ddb::{build_db_client, create_table};

pub async fn create_book_repository(store: RepositoryStore) -> Arc<dyn BookRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Arc::new(DDBBookRepository::new(client, "books", "books_ndx"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "books", "book_id", "book_status", "isbn").await;
            Arc::new(DDBBookRepository::new(client, "books", "books_ndx"))
        }
        RepositoryStore::Memory => {
            Arc::new(MemoryBookRepository::new())
        }
    }
}
