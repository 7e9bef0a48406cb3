use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::members::domain::MemberService;

pub struct RemoveMemberCommand {
    member_service: Arc<dyn MemberService>,
}

impl RemoveMemberCommand {
    pub fn new(member_service: Arc<dyn MemberService>) -> Self {
        Self {
            member_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RemoveMemberCommandRequest {
    pub member_id: String,
}

impl RemoveMemberCommandRequest {
    pub fn new(member_id: &str) -> Self {
        Self {
            member_id: member_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RemoveMemberCommandResponse {
    pub member_id: String,
}

#[async_trait]
impl Command<RemoveMemberCommandRequest, RemoveMemberCommandResponse> for RemoveMemberCommand {
    async fn execute(&self, req: RemoveMemberCommandRequest) -> Result<RemoveMemberCommandResponse, CommandError> {
        self.member_service.remove_member(req.member_id.as_str()).await.map_err(CommandError::from)
            .map(|_| RemoveMemberCommandResponse { member_id: req.member_id })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::core::command::Command;
    use crate::core::clock::SystemClock;
    use crate::core::domain::Configuration;
    use crate::members::command::remove_member_cmd::{RemoveMemberCommand, RemoveMemberCommandRequest};
    use crate::members::dto::MemberDto;
    use crate::members::factory;
    use crate::members::repository::memory_member_repository::MemoryMemberRepository;

    #[tokio::test]
    async fn test_should_run_remove_member() {
        let svc = factory::create_member_service(&Configuration::new("test"), Arc::new(MemoryMemberRepository::new()), Arc::new(SystemClock));
        let member = svc.add_member(&MemberDto::new("Ada Lovelace", "ada@example.org")).await.expect("should add member");

        let res = RemoveMemberCommand::new(svc.clone())
            .execute(RemoveMemberCommandRequest::new(member.member_id.as_str())).await.expect("should remove member");
        assert_eq!(member.member_id, res.member_id);
        assert!(svc.find_member_by_id(member.member_id.as_str()).await.is_err());
    }
}
