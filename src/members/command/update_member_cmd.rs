use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::members::domain::MemberService;
use crate::members::dto::MemberDto;

pub struct UpdateMemberCommand {
    member_service: Arc<dyn MemberService>,
}

impl UpdateMemberCommand {
    pub fn new(member_service: Arc<dyn MemberService>) -> Self {
        Self {
            member_service,
        }
    }
}

// omitted fields keep their stored value; a version, when given, must match the stored one
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMemberCommandRequest {
    #[serde(default)]
    pub member_id: String,
    pub version: Option<i64>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl UpdateMemberCommandRequest {
    pub fn new(member_id: &str, display_name: Option<&str>, email: Option<&str>) -> Self {
        Self {
            member_id: member_id.to_string(),
            version: None,
            display_name: display_name.map(|s| s.to_string()),
            email: email.map(|s| s.to_string()),
        }
    }
    pub fn build_member(&self, current: MemberDto) -> MemberDto {
        let mut member = current;
        if let Some(version) = self.version {
            member.version = version;
        }
        if let Some(display_name) = &self.display_name {
            member.display_name = display_name.to_string();
        }
        if let Some(email) = &self.email {
            member.email = email.to_string();
        }
        member
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateMemberCommandResponse {
    pub member: MemberDto,
}

impl UpdateMemberCommandResponse {
    pub fn new(member: MemberDto) -> Self {
        Self {
            member,
        }
    }
}

#[async_trait]
impl Command<UpdateMemberCommandRequest, UpdateMemberCommandResponse> for UpdateMemberCommand {
    async fn execute(&self, req: UpdateMemberCommandRequest) -> Result<UpdateMemberCommandResponse, CommandError> {
        let current = self.member_service.find_member_by_id(req.member_id.as_str()).await?;
        let member = req.build_member(current);
        self.member_service.update_member(&member).await.map_err(CommandError::from).map(UpdateMemberCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::core::command::{Command, CommandError};
    use crate::core::clock::SystemClock;
    use crate::core::domain::Configuration;
    use crate::members::command::update_member_cmd::{UpdateMemberCommand, UpdateMemberCommandRequest};
    use crate::members::dto::MemberDto;
    use crate::members::factory;
    use crate::members::repository::memory_member_repository::MemoryMemberRepository;

    #[tokio::test]
    async fn test_should_run_update_member() {
        let svc = factory::create_member_service(&Configuration::new("test"), Arc::new(MemoryMemberRepository::new()), Arc::new(SystemClock));
        let member = svc.add_member(&MemberDto::new("Ada Lovelace", "ada@example.org")).await.expect("should add member");

        let cmd = UpdateMemberCommand::new(svc);
        let res = cmd.execute(UpdateMemberCommandRequest::new(member.member_id.as_str(), Some("Ada King"), None))
            .await.expect("should update member");
        assert_eq!("Ada King", res.member.display_name.as_str());
        assert_eq!("ada@example.org", res.member.email.as_str());

        let mut stale = UpdateMemberCommandRequest::new(member.member_id.as_str(), Some("Countess"), None);
        stale.version = Some(0);
        let res = cmd.execute(stale).await;
        assert!(matches!(res, Err(CommandError::Conflict { .. })));
    }
}
