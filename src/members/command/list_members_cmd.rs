use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::members::domain::MemberService;
use crate::members::dto::MemberDto;

pub struct ListMembersCommand {
    member_service: Arc<dyn MemberService>,
}

impl ListMembersCommand {
    pub fn new(member_service: Arc<dyn MemberService>) -> Self {
        Self {
            member_service,
        }
    }
}

// an email narrows the listing to that address
#[derive(Debug, Default, Deserialize)]
pub struct ListMembersCommandRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListMembersCommandResponse {
    pub members: Vec<MemberDto>,
}

#[async_trait]
impl Command<ListMembersCommandRequest, ListMembersCommandResponse> for ListMembersCommand {
    async fn execute(&self, req: ListMembersCommandRequest) -> Result<ListMembersCommandResponse, CommandError> {
        let members = match req.email {
            Some(email) if !email.trim().is_empty() => self.member_service.find_member_by_email(email.as_str()).await,
            _ => self.member_service.list_members().await,
        }.map_err(CommandError::from)?;
        Ok(ListMembersCommandResponse { members })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use crate::core::command::Command;
    use crate::core::clock::SystemClock;
    use crate::core::domain::Configuration;
    use crate::members::command::list_members_cmd::{ListMembersCommand, ListMembersCommandRequest};
    use crate::members::dto::MemberDto;
    use crate::members::factory;
    use crate::members::repository::memory_member_repository::MemoryMemberRepository;

    #[tokio::test]
    async fn test_should_run_list_members() {
        let svc = factory::create_member_service(&Configuration::new("test"), Arc::new(MemoryMemberRepository::new()), Arc::new(SystemClock));
        svc.add_member(&MemberDto::new("Ada Lovelace", "ada@example.org")).await.expect("should add member");
        svc.add_member(&MemberDto::new("Alan Turing", "alan@example.org")).await.expect("should add member");

        let cmd = ListMembersCommand::new(svc);
        let res = cmd.execute(ListMembersCommandRequest::default()).await.expect("should list members");
        assert_eq!(2, res.members.len());
        let res = cmd.execute(ListMembersCommandRequest { email: Some("alan@example.org".to_string()) })
            .await.expect("should list members");
        assert_eq!(1, res.members.len());
    }
}
