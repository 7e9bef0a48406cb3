use std::sync::Arc;
use async_trait::async_trait;
use tracing::{info, warn};
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult};
use crate::core::repository::scan_all;
use crate::members::domain::MemberService;
use crate::members::domain::model::MemberEntity;
use crate::members::dto::MemberDto;
use crate::members::repository::MemberRepository;

pub struct MemberServiceImpl {
    member_repository: Arc<dyn MemberRepository>,
    clock: Arc<dyn Clock>,
}

impl MemberServiceImpl {
    pub fn new(_config: &Configuration, member_repository: Arc<dyn MemberRepository>, clock: Arc<dyn Clock>) -> Self {
        MemberServiceImpl {
            member_repository,
            clock,
        }
    }
}

fn validate(member: &MemberDto) -> LibraryResult<()> {
    if member.display_name.trim().is_empty() {
        return Err(LibraryError::validation("member name is required", Some("400".to_string())));
    }
    let email = member.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(LibraryError::validation(
            format!("invalid member email {}", member.email).as_str(), Some("400".to_string())));
    }
    Ok(())
}

#[async_trait]
impl MemberService for MemberServiceImpl {
    async fn add_member(&self, member: &MemberDto) -> LibraryResult<MemberDto> {
        validate(member)?;
        let mut entity = MemberEntity::from(member);
        entity.display_name = entity.display_name.trim().to_string();
        entity.email = entity.email.trim().to_string();
        entity.joined_at = self.clock.now();
        entity.created_at = entity.joined_at;
        entity.updated_at = entity.joined_at;
        self.member_repository.create(&entity).await?;
        info!(member_id = entity.member_id.as_str(), "member added");
        Ok(MemberDto::from(&entity))
    }

    async fn remove_member(&self, id: &str) -> LibraryResult<()> {
        let member = self.member_repository.get(id).await?;
        self.member_repository.delete(&member).await.map_err(|err| {
            warn!(member_id = id, error = %err, "member changed while being removed");
            err
        })?;
        info!(member_id = id, "member removed");
        Ok(())
    }

    async fn update_member(&self, member: &MemberDto) -> LibraryResult<MemberDto> {
        validate(member)?;
        let mut entity = self.member_repository.get(member.member_id.as_str()).await?;
        entity.version = member.version;
        entity.display_name = member.display_name.trim().to_string();
        entity.email = member.email.trim().to_string();
        entity.updated_at = self.clock.now();
        self.member_repository.update(&entity).await?;
        entity.version += 1;
        Ok(MemberDto::from(&entity))
    }

    async fn find_member_by_id(&self, id: &str) -> LibraryResult<MemberDto> {
        self.member_repository.get(id).await.map(|m| MemberDto::from(&m))
    }

    async fn find_member_by_email(&self, email: &str) -> LibraryResult<Vec<MemberDto>> {
        let res = self.member_repository.find_by_email(email.trim()).await?;
        Ok(res.iter().map(MemberDto::from).collect())
    }

    async fn list_members(&self) -> LibraryResult<Vec<MemberDto>> {
        let mut members: Vec<MemberEntity> = scan_all(self.member_repository.as_ref()).await?;
        members.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.member_id.cmp(&b.member_id)));
        Ok(members.iter().map(MemberDto::from).collect())
    }
}

impl From<&MemberEntity> for MemberDto {
    fn from(other: &MemberEntity) -> Self {
        Self {
            member_id: other.member_id.to_string(),
            version: other.version,
            display_name: other.display_name.to_string(),
            email: other.email.to_string(),
            joined_at: other.joined_at,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}

impl From<&MemberDto> for MemberEntity {
    fn from(other: &MemberDto) -> Self {
        Self {
            member_id: other.member_id.to_string(),
            version: other.version,
            display_name: other.display_name.to_string(),
            email: other.email.to_string(),
            joined_at: other.joined_at,
            created_at: other.created_at,
            updated_at: other.updated_at,
        }
    }
}
