use async_trait::async_trait;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryResult, PaginatedResult};

#[async_trait]
pub trait Repository<Entity>: Sync + Send {
    // create an entity
    async fn create(&self, entity: &Entity) -> LibraryResult<usize>;

    // updates an entity if the stored version still matches entity.version, bumping it by one
    async fn update(&self, entity: &Entity) -> LibraryResult<usize>;

    // get an entity
    async fn get(&self, id: &str) -> LibraryResult<Entity>;

    // deletes an entity if the stored version still matches entity.version; a missing entity
    // deletes nothing
    async fn delete(&self, entity: &Entity) -> LibraryResult<usize>;

    // find by secondary keys and attribute filters
    async fn query(&self, predicate: &HashMap::<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<Entity>>;

    // page through every entity regardless of secondary keys
    async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<Entity>>;
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub enum RepositoryStore {
    DynamoDB,
    LocalDynamoDB,
    Memory,
}

impl RepositoryStore {
    // VERDANT_STORE selects the backend: dynamodb, local (DynamoDB local) or memory.
    pub fn from_env() -> Self {
        RepositoryStore::from(std::env::var("VERDANT_STORE").unwrap_or_default())
    }
}

impl From<String> for RepositoryStore {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "dynamodb" | "ddb" => RepositoryStore::DynamoDB,
            "local" | "localdynamodb" => RepositoryStore::LocalDynamoDB,
            _ => RepositoryStore::Memory,
        }
    }
}

// Drains every page of a scan; used by the ledger views which have no pagination contract.
pub async fn scan_all<Entity, R>(repository: &R) -> LibraryResult<Vec<Entity>>
    where R: Repository<Entity> + ?Sized {
    let mut records = vec![];
    let mut next_page: Option<String> = None;
    loop {
        let res = repository.scan(next_page.as_deref(), 500).await?;
        records.extend(res.records);
        next_page = res.next_page;
        if next_page.is_none() {
            break;
        }
    }
    Ok(records)
}
