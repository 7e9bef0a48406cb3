pub mod model;
pub mod service;

use async_trait::async_trait;
use crate::core::library::LibraryResult;
use crate::members::dto::MemberDto;

#[async_trait]
pub trait MemberService: Sync + Send {
    async fn add_member(&self, member: &MemberDto) -> LibraryResult<MemberDto>;
    async fn remove_member(&self, id: &str) -> LibraryResult<()>;
    async fn update_member(&self, member: &MemberDto) -> LibraryResult<MemberDto>;
    async fn find_member_by_id(&self, id: &str) -> LibraryResult<MemberDto>;
    async fn find_member_by_email(&self, email: &str) -> LibraryResult<Vec<MemberDto>>;
    async fn list_members(&self) -> LibraryResult<Vec<MemberDto>>;
}
