use std::sync::Arc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::core::command::{Command, CommandError};
use crate::members::domain::MemberService;
use crate::members::dto::MemberDto;

pub struct GetMemberCommand {
    member_service: Arc<dyn MemberService>,
}

impl GetMemberCommand {
    pub fn new(member_service: Arc<dyn MemberService>) -> Self {
        Self {
            member_service,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetMemberCommandRequest {
    pub member_id: String,
}

impl GetMemberCommandRequest {
    pub fn new(member_id: &str) -> Self {
        Self {
            member_id: member_id.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GetMemberCommandResponse {
    pub member: MemberDto,
}

impl GetMemberCommandResponse {
    pub fn new(member: MemberDto) -> Self {
        Self {
            member,
        }
    }
}

#[async_trait]
impl Command<GetMemberCommandRequest, GetMemberCommandResponse> for GetMemberCommand {
    async fn execute(&self, req: GetMemberCommandRequest) -> Result<GetMemberCommandResponse, CommandError> {
        self.member_service.find_member_by_id(req.member_id.as_str())
            .await.map_err(CommandError::from).map(GetMemberCommandResponse::new)
    }
}
