use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::members::domain::MemberService;
use crate::members::dto::MemberDto;

pub struct AddMemberCommand {
    member_service: Arc<dyn MemberService>,
}

impl AddMemberCommand {
    pub fn new(member_service: Arc<dyn MemberService>) -> Self {
        Self {
            member_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMemberCommandRequest {
    pub display_name: String,
    pub email: String,
}

impl AddMemberCommandRequest {
    pub fn new(display_name: &str, email: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            email: email.to_string(),
        }
    }
    pub fn build_member(&self) -> MemberDto {
        MemberDto::new(self.display_name.as_str(), self.email.as_str())
    }
}

#[derive(Debug, Serialize)]
pub struct AddMemberCommandResponse {
    pub member: MemberDto,
}

impl AddMemberCommandResponse {
    pub fn new(member: MemberDto) -> Self {
        Self {
            member,
        }
    }
}

#[async_trait]
impl Command<AddMemberCommandRequest, AddMemberCommandResponse> for AddMemberCommand {
    async fn execute(&self, req: AddMemberCommandRequest) -> Result<AddMemberCommandResponse, CommandError> {
        let member = req.build_member();
        self.member_service.add_member(&member).await.map_err(CommandError::from).map(AddMemberCommandResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use lazy_static::lazy_static;
    use crate::core::command::{Command, CommandError};
    use crate::core::clock::SystemClock;
    use crate::core::domain::Configuration;
    use crate::members::command::add_member_cmd::{AddMemberCommand, AddMemberCommandRequest};
    use crate::members::domain::MemberService;
    use crate::members::factory;
    use crate::members::repository::memory_member_repository::MemoryMemberRepository;

    lazy_static! {
        static ref SUT_SVC: Arc<dyn MemberService> = factory::create_member_service(
            &Configuration::new("test"), Arc::new(MemoryMemberRepository::new()), Arc::new(SystemClock));
    }

    #[tokio::test]
    async fn test_should_run_add_member() {
        let cmd = AddMemberCommand::new(SUT_SVC.clone());
        let res = cmd.execute(AddMemberCommandRequest::new("Ada Lovelace", "ada@example.org"))
            .await.expect("should add member");
        assert_eq!("ada@example.org", res.member.email.as_str());
    }

    #[tokio::test]
    async fn test_should_fail_add_member_without_email() {
        let cmd = AddMemberCommand::new(SUT_SVC.clone());
        let res = cmd.execute(AddMemberCommandRequest::new("Ada Lovelace", "")).await;
        assert!(matches!(res, Err(CommandError::Validation { .. })));
    }
}
