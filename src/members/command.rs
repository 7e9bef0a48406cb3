pub mod add_member_cmd;
pub mod get_member_cmd;
pub mod list_members_cmd;
pub mod remove_member_cmd;
pub mod update_member_cmd;
