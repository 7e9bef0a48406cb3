use std::sync::Arc;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::members::domain::MemberService;
use crate::members::domain::service::MemberServiceImpl;
use crate::members::repository::MemberRepository;
use crate::members::repository::ddb_member_repository::DDBMemberRepository;
use crate::members::repository::memory_member_repository::MemoryMemberRepository;
use crate::utils::ddb::{build_db_client, create_table};

pub async fn create_member_repository(store: RepositoryStore) -> Arc<dyn MemberRepository> {
    match store {
        RepositoryStore::DynamoDB => {
            let client = build_db_client(store).await;
            Arc::new(DDBMemberRepository::new(client, "members", "members_ndx"))
        }
        RepositoryStore::LocalDynamoDB => {
            let client = build_db_client(store).await;
            let _ = create_table(&client, "members", "member_id", "email", "joined_at").await;
            Arc::new(DDBMemberRepository::new(client, "members", "members_ndx"))
        }
        RepositoryStore::Memory => {
            Arc::new(MemoryMemberRepository::new())
        }
    }
}

pub fn create_member_service(config: &Configuration,
                             member_repository: Arc<dyn MemberRepository>,
                             clock: Arc<dyn Clock>) -> Arc<dyn MemberService> {
    Arc::new(MemberServiceImpl::new(config, member_repository, clock))
}
