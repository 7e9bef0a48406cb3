use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::core::domain::Identifiable;
use crate::utils::date::serializer;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct MemberDto {
    pub member_id: String,
    pub version: i64,
    pub display_name: String,
    pub email: String,
    #[serde(with = "serializer")]
    pub joined_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl MemberDto {
    pub fn new(display_name: &str, email: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            member_id: Uuid::new_v4().to_string(),
            version: 0,
            display_name: display_name.to_string(),
            email: email.to_string(),
            joined_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identifiable for MemberDto {
    fn id(&self) -> String {
        self.member_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}
