use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::library::{LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::members::domain::model::MemberEntity;
use crate::members::repository::MemberRepository;
use crate::utils::memory::MemoryStore;

#[derive(Debug)]
pub struct MemoryMemberRepository {
    store: MemoryStore<MemberEntity>,
}

impl MemoryMemberRepository {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new("member"),
        }
    }
}

impl Default for MemoryMemberRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository<MemberEntity> for MemoryMemberRepository {
    async fn create(&self, entity: &MemberEntity) -> LibraryResult<usize> {
        self.store.create(entity).await
    }

    async fn update(&self, entity: &MemberEntity) -> LibraryResult<usize> {
        self.store.update(entity).await
    }

    async fn get(&self, id: &str) -> LibraryResult<MemberEntity> {
        self.store.get(id).await
    }

    async fn delete(&self, entity: &MemberEntity) -> LibraryResult<usize> {
        self.store.delete(entity).await
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<MemberEntity>> {
        self.store.query(predicate, page, page_size).await
    }

    async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<MemberEntity>> {
        self.store.scan(page, page_size).await
    }
}

#[async_trait]
impl MemberRepository for MemoryMemberRepository {
    async fn find_by_email(&self, email: &str) -> LibraryResult<Vec<MemberEntity>> {
        let res = self.store.query(
            &HashMap::from([("email".to_string(), email.to_string())]), None, 500).await?;
        Ok(res.records)
    }
}
