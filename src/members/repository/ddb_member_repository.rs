use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use chrono::Utc;

use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::members::domain::model::MemberEntity;
use crate::members::repository::MemberRepository;
use crate::utils::ddb::{add_filter_expr, create_error, delete_error, from_ddb, parse_date_attribute, parse_item, parse_number_attribute, parse_string_attribute, string_date, to_ddb_page, update_error};

#[derive(Debug)]
pub struct DDBMemberRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBMemberRepository {
    pub(crate) fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<MemberEntity> for DDBMemberRepository {
    async fn create(&self, entity: &MemberEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(member_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| 1).map_err(|err| create_error(entity.member_id.as_str(), err))
    }

    async fn update(&self, entity: &MemberEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .update_item()
            .table_name(table_name)
            .key("member_id", AttributeValue::S(entity.member_id.clone()))
            .update_expression("SET version = :version, display_name = :display_name, email = :email, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":display_name", AttributeValue::S(entity.display_name.to_string()))
            .expression_attribute_values(":email", AttributeValue::S(entity.email.to_string()))
            .expression_attribute_values(":updated_at", string_date(entity.updated_at))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(|err| update_error(entity.member_id.as_str(), err))
    }

    async fn get(&self, id: &str) -> LibraryResult<MemberEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .query()
            .table_name(table_name)
            .limit(2)
            .consistent_read(true)
            .key_condition_expression(
                "member_id = :member_id",
            )
            .expression_attribute_values(
                ":member_id",
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await.map_err(LibraryError::from).and_then(|req| {
            if let Some(items) = req.items {
                if items.len() > 1 {
                    return Err(LibraryError::database(format!("too many members for {}", id).as_str(), None, false));
                } else if let Some(map) = items.first() {
                    return Ok(map_to_member(map));
                }
            }
            Err(LibraryError::not_found(format!("member not found for {}", id).as_str()))
        })
    }

    // a missing item is not an error; a newer version is
    async fn delete(&self, entity: &MemberEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("member_id", AttributeValue::S(entity.member_id.clone()))
            .condition_expression("attribute_not_exists(member_id) OR version = :old_version")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map(|out| out.attributes().map_or(0, |_| 1))
            .map_err(|err| delete_error(entity.member_id.as_str(), err))
    }

    // the index is keyed on email, so queries without one are rejected
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<MemberEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let email = predicate.get("email")
            .ok_or_else(|| LibraryError::validation("email is required to query members", Some("400".to_string())))?;
        let exclusive_start_key = to_ddb_page(page, predicate);
        let mut request = self.client
            .query()
            .table_name(table_name)
            .index_name(index_name)
            .limit(cmp::min(page_size, 500) as i32)
            .consistent_read(false)
            .set_exclusive_start_key(exclusive_start_key)
            .key_condition_expression("email = :email")
            .expression_attribute_values(":email", AttributeValue::S(email.to_string()));
        let mut filter_expr = String::new();
        for (k, v) in predicate {
            if k != "email" {
                let ks = add_filter_expr(k.as_str(), &mut filter_expr);
                request = request.expression_attribute_values(format!(":{}", ks).as_str(), AttributeValue::S(v.to_string()));
            }
        }
        if !filter_expr.is_empty() {
            request = request.filter_expression(filter_expr);
        }
        request
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            let records = req.items.as_ref().unwrap_or(&vec![]).iter()
                .map(map_to_member).collect();
            from_ddb(page, page_size, req.last_evaluated_key(), records)
        })
    }

    async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<MemberEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let exclusive_start_key = to_ddb_page(page, &HashMap::new());
        self.client
            .scan()
            .table_name(table_name)
            .consistent_read(true)
            .set_exclusive_start_key(exclusive_start_key)
            .limit(cmp::min(page_size, 500) as i32)
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            let records = req.items.as_ref().unwrap_or(&vec![]).iter()
                .map(map_to_member).collect();
            from_ddb(page, page_size, req.last_evaluated_key(), records)
        })
    }
}

#[async_trait]
impl MemberRepository for DDBMemberRepository {
    async fn find_by_email(&self, email: &str) -> LibraryResult<Vec<MemberEntity>> {
        let res = self.query(
            &HashMap::from([("email".to_string(), email.to_string())]), None, 500).await?;
        Ok(res.records)
    }
}

fn map_to_member(map: &HashMap<String, AttributeValue>) -> MemberEntity {
    let now = Utc::now().naive_utc();
    MemberEntity {
        member_id: parse_string_attribute("member_id", map).unwrap_or_default(),
        version: parse_number_attribute("version", map),
        display_name: parse_string_attribute("display_name", map).unwrap_or_default(),
        email: parse_string_attribute("email", map).unwrap_or_default(),
        joined_at: parse_date_attribute("joined_at", map).unwrap_or(now),
        created_at: parse_date_attribute("created_at", map).unwrap_or(now),
        updated_at: parse_date_attribute("updated_at", map).unwrap_or(now),
    }
}
