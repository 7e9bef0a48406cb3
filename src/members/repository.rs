pub mod ddb_member_repository;
pub mod memory_member_repository;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::core::repository::Repository;
use crate::members::domain::model::MemberEntity;

#[async_trait]
pub trait MemberRepository: Repository<MemberEntity> {
    async fn find_by_email(&self, email: &str) -> LibraryResult<Vec<MemberEntity>>;
}
