use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde_json::Value;
use crate::core::command::Command;
use crate::core::controller::{AppState, json_to_server_error, ServerError};
use crate::members::command::add_member_cmd::{AddMemberCommand, AddMemberCommandRequest, AddMemberCommandResponse};
use crate::members::command::get_member_cmd::{GetMemberCommand, GetMemberCommandRequest, GetMemberCommandResponse};
use crate::members::command::list_members_cmd::{ListMembersCommand, ListMembersCommandRequest, ListMembersCommandResponse};
use crate::members::command::remove_member_cmd::{RemoveMemberCommand, RemoveMemberCommandRequest, RemoveMemberCommandResponse};
use crate::members::command::update_member_cmd::{UpdateMemberCommand, UpdateMemberCommandRequest, UpdateMemberCommandResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/members", get(list_members).post(add_member))
        .route("/members/:id",
               get(find_member_by_id).put(update_member).delete(remove_member))
}

pub async fn add_member(
    State(state): State<AppState>,
    json: Json<Value>) -> Result<Json<AddMemberCommandResponse>, ServerError> {
    let req: AddMemberCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    let res = AddMemberCommand::new(state.members.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn list_members(
    State(state): State<AppState>,
    Query(req): Query<ListMembersCommandRequest>) -> Result<Json<ListMembersCommandResponse>, ServerError> {
    let res = ListMembersCommand::new(state.members.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn find_member_by_id(
    State(state): State<AppState>,
    Path(member_id): Path<String>) -> Result<Json<GetMemberCommandResponse>, ServerError> {
    let req = GetMemberCommandRequest { member_id };
    let res = GetMemberCommand::new(state.members.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn update_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>,
    json: Json<Value>) -> Result<Json<UpdateMemberCommandResponse>, ServerError> {
    let mut req: UpdateMemberCommandRequest = serde_json::from_value(json.0).map_err(json_to_server_error)?;
    req.member_id = member_id;
    let res = UpdateMemberCommand::new(state.members.clone()).execute(req).await?;
    Ok(Json(res))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Path(member_id): Path<String>) -> Result<Json<RemoveMemberCommandResponse>, ServerError> {
    let req = RemoveMemberCommandRequest { member_id };
    let res = RemoveMemberCommand::new(state.members.clone()).execute(req).await?;
    Ok(Json(res))
}
