use std::collections::HashMap;
use std::time::Duration;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{AttributeDefinition, AttributeValue, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection, ProjectionType, ProvisionedThroughput, ScalarAttributeType, TableStatus};
use chrono::NaiveDateTime;
use serde_json::Value;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::RepositoryStore;
use crate::utils::date::DATE_FMT;

const TABLE_WAIT_SECS: u64 = 30;

fn key(name: &str, key_type: KeyType) -> KeySchemaElement {
    KeySchemaElement::builder().attribute_name(name).key_type(key_type).build()
}

fn string_attribute(name: &str) -> AttributeDefinition {
    AttributeDefinition::builder().attribute_name(name).attribute_type(ScalarAttributeType::S).build()
}

fn throughput() -> ProvisionedThroughput {
    ProvisionedThroughput::builder().read_capacity_units(10).write_capacity_units(10).build()
}

// Creates `table_name` keyed on `pk` with one all-attribute index `<table_name>_ndx` on
// (`gsi_pk`, `gsi_sk`), then waits for it to leave the Creating state.
pub(crate) async fn create_table(client: &Client,
                                 table_name: &str, pk: &str,
                                 gsi_pk: &str, gsi_sk: &str) -> LibraryResult<()> {
    let index = GlobalSecondaryIndex::builder()
        .index_name(format!("{}_ndx", table_name))
        .key_schema(key(gsi_pk, KeyType::Hash))
        .key_schema(key(gsi_sk, KeyType::Range))
        .projection(Projection::builder().projection_type(ProjectionType::All).build())
        .provisioned_throughput(throughput())
        .build();
    client.create_table()
        .table_name(table_name)
        .key_schema(key(pk, KeyType::Hash))
        .attribute_definitions(string_attribute(pk))
        .attribute_definitions(string_attribute(gsi_pk))
        .attribute_definitions(string_attribute(gsi_sk))
        .global_secondary_indexes(index)
        .provisioned_throughput(throughput())
        .send()
        .await
        .map_err(|err| LibraryError::database(format!("could not create table {}: {}", table_name, err).as_str(), None, false))?;
    wait_for_table(client, table_name, TableStatus::Creating).await;
    Ok(())
}

pub(crate) async fn delete_table(client: &Client, table_name: &str) -> LibraryResult<()> {
    client.delete_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|err| LibraryError::database(format!("could not delete table {}: {}", table_name, err).as_str(), None, false))?;
    wait_for_table(client, table_name, TableStatus::Deleting).await;
    Ok(())
}

// polls once a second until the table is out of `transient` or the wait runs out
async fn wait_for_table(client: &Client, table_name: &str, transient: TableStatus) {
    for _ in 0..TABLE_WAIT_SECS {
        let status = client.describe_table().table_name(table_name).send().await.ok()
            .and_then(|out| out.table().and_then(|t| t.table_status().cloned()));
        if matches!(status, Some(ref s) if *s != transient) {
            return;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}

pub(crate) fn parse_item(value: Value) -> Result<HashMap<String, AttributeValue>, String> {
    match value_to_item(value) {
        AttributeValue::M(map) => Ok(map),
        other => Err(format!("expected a json object for an item, got {:?}", other)),
    }
}

pub(crate) fn parse_string_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<String> {
    map.get(name).and_then(|v| v.as_s().ok()).cloned()
}

// empty strings and NULL both stand for an absent value
pub(crate) fn parse_opt_string_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<String> {
    parse_string_attribute(name, map).filter(|s| !s.is_empty())
}

pub(crate) fn parse_string_list_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Vec<String> {
    match map.get(name) {
        Some(AttributeValue::L(values)) => values.iter().filter_map(|v| v.as_s().ok()).cloned().collect(),
        _ => vec![],
    }
}

pub(crate) fn parse_date_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> Option<NaiveDateTime> {
    parse_opt_string_attribute(name, map)
        .and_then(|s| NaiveDateTime::parse_from_str(s.as_str(), DATE_FMT).ok())
}

pub(crate) fn parse_number_attribute(name: &str, map: &HashMap<String, AttributeValue>) -> i64 {
    map.get(name).and_then(|v| v.as_n().ok()).and_then(|n| n.parse::<i64>().ok()).unwrap_or(0)
}

pub(crate) fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().map(|v| AttributeValue::S(v.to_string())).collect())
}

pub(crate) fn opt_string(opt: &Option<String>) -> AttributeValue {
    AttributeValue::S(opt.clone().unwrap_or_default())
}

pub(crate) fn string_date(date: NaiveDateTime) -> AttributeValue {
    AttributeValue::S(date.format(DATE_FMT).to_string())
}

pub(crate) fn opt_string_date(opt_date: Option<NaiveDateTime>) -> AttributeValue {
    opt_date.map_or_else(|| AttributeValue::S(String::new()), string_date)
}

// Appends `attr op :attr` for a predicate key written as "attr" or "attr:op" and returns the
// attribute name, which doubles as the value placeholder.
pub(crate) fn add_filter_expr(k: &str, filter_expr: &mut String) -> String {
    let (attr, op) = k.split_once(':').unwrap_or((k, "="));
    if !filter_expr.is_empty() {
        filter_expr.push_str(" AND ");
    }
    filter_expr.push_str(format!("{} {} :{}", attr, op, attr).as_str());
    attr.to_string()
}

// page tokens are the json of the last evaluated key with string values only
pub(crate) fn to_ddb_page(page: Option<&str>,
                          predicate: &HashMap<String, String>) -> Option<HashMap<String, AttributeValue>> {
    let start = serde_json::from_str::<HashMap<String, String>>(page?).ok()?;
    Some(start.into_iter()
        .chain(predicate.iter().map(|(k, v)| (k.to_string(), v.to_string())))
        .map(|(k, v)| (k, AttributeValue::S(v)))
        .collect())
}

pub(crate) fn from_ddb<T>(page: Option<&str>, page_size: usize,
                          last_evaluated_key: Option<&HashMap<String, AttributeValue>>,
                          records: Vec<T>) -> PaginatedResult<T> {
    let next_page = last_evaluated_key.and_then(|attrs| {
        let keys: HashMap<&String, &String> = attrs.iter()
            .filter_map(|(k, v)| v.as_s().ok().map(|s| (k, s)))
            .collect();
        serde_json::to_string(&keys).ok()
    });
    PaginatedResult::new(page, page_size, next_page, records)
}

fn value_to_item(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(a) => AttributeValue::L(a.into_iter().map(value_to_item).collect()),
        Value::Object(o) => AttributeValue::M(o.into_iter().map(|(k, v)| (k, value_to_item(v))).collect()),
    }
}

// DynamoDB picks its settings from the aws-config environment chain; DynamoDB local listens on
// DYNAMODB_ENDPOINT or localhost:8000 with fixed credentials.
pub(crate) async fn build_db_client(store: RepositoryStore) -> Client {
    match store {
        RepositoryStore::DynamoDB => Client::new(&aws_config::load_from_env().await),
        RepositoryStore::LocalDynamoDB | RepositoryStore::Memory => {
            let endpoint = std::env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string());
            let local = aws_sdk_dynamodb::Config::builder()
                .region(Region::new("local"))
                .credentials_provider(Credentials::new("AKIDLOCAL", "localsecret", None, None, "verdant-local"))
                .endpoint_url(endpoint)
                .build();
            Client::from_conf(local)
        }
    }
}

// JSON lines without ANSI colours, module targets or timestamps, as CloudWatch expects them
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .json()
        .init();
}

fn condition_failed<E>(err: &SdkError<E>, is_condition: impl Fn(&E) -> bool) -> bool {
    matches!(err, SdkError::ServiceError(ctx) if is_condition(ctx.err()))
}

// `attribute_not_exists(<key>)` failing means the id is taken
pub(crate) fn create_error(id: &str, err: SdkError<PutItemError>) -> LibraryError {
    if condition_failed(&err, PutItemError::is_conditional_check_failed_exception) {
        return LibraryError::duplicate_key(format!("{} already exists", id).as_str());
    }
    LibraryError::from(err)
}

// a failed `version = :old_version` condition means another writer got there first
pub(crate) fn update_error(id: &str, err: SdkError<UpdateItemError>) -> LibraryError {
    if condition_failed(&err, UpdateItemError::is_conditional_check_failed_exception) {
        return LibraryError::conflict(
            format!("{} was modified concurrently", id).as_str(), vec![id.to_string()]);
    }
    LibraryError::from(err)
}

pub(crate) fn delete_error(id: &str, err: SdkError<DeleteItemError>) -> LibraryError {
    if condition_failed(&err, DeleteItemError::is_conditional_check_failed_exception) {
        return LibraryError::conflict(
            format!("{} was modified before it could be deleted", id).as_str(), vec![id.to_string()]);
    }
    LibraryError::from(err)
}

macro_rules! storage_error_from {
    ($($op:ty),+) => {
        $(
            impl From<SdkError<$op>> for LibraryError {
                fn from(err: SdkError<$op>) -> Self {
                    let (retryable, reason) = retryable_sdk_error(&err);
                    LibraryError::storage(format!("{:?}", err).as_str(), reason, retryable)
                }
            }
        )+
    };
}

storage_error_from!(PutItemError, UpdateItemError, DeleteItemError, QueryError, ScanError);

// Transport failures and 5xx answers are worth retrying, and so is throttling, which DynamoDB
// reports as a 400 whose body names an exceeded limit.
fn retryable_sdk_error<T>(err: &SdkError<T>) -> (bool, Option<String>) {
    match err {
        SdkError::ConstructionFailure(_) => (false, Some("ConstructionFailure".to_string())),
        SdkError::TimeoutError(_) => (true, Some("TimeoutError".to_string())),
        SdkError::DispatchFailure(_) => (true, Some("DispatchFailure".to_string())),
        SdkError::ResponseError { .. } => (true, Some("ResponseError".to_string())),
        SdkError::ServiceError(ctx) => {
            let http = ctx.raw().http();
            (http.status().is_server_error() || has_exceeded_limit(http.body().bytes()),
             Some(http.status().as_u16().to_string()))
        }
        _ => (true, Some("Unknown".to_string())),
    }
}

fn has_exceeded_limit(body: Option<&[u8]>) -> bool {
    body.map_or(false, |b| b.windows(8).any(|w| w == b"Exceeded"))
}
