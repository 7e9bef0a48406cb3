use std::cmp;
use std::collections::HashMap;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};

// MemoryStore keeps records in insertion order behind one lock so that the version check and the
// write of an update happen atomically, giving the same conditional-update contract as the
// DynamoDB repositories.
#[derive(Debug)]
pub struct MemoryStore<T> {
    name: String,
    records: RwLock<Vec<T>>,
}

impl<T: Identifiable + Clone + Serialize> MemoryStore<T> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: RwLock::new(vec![]),
        }
    }

    pub async fn create(&self, entity: &T) -> LibraryResult<usize> {
        let mut records = self.records.write().await;
        let id = entity.id();
        if records.iter().any(|r| r.id() == id) {
            return Err(LibraryError::duplicate_key(format!("{} already exists for {}", self.name, id).as_str()));
        }
        records.push(entity.clone());
        Ok(1)
    }

    pub async fn update(&self, entity: &T) -> LibraryResult<usize> {
        let mut records = self.records.write().await;
        let id = entity.id();
        let existing = records.iter_mut().find(|r| r.id() == id)
            .ok_or_else(|| LibraryError::not_found(format!("{} not found for {}", self.name, id).as_str()))?;
        if existing.version() != entity.version() {
            return Err(LibraryError::conflict(
                format!("{} {} was modified concurrently, expected version {} but found {}",
                        self.name, id, entity.version(), existing.version()).as_str(), vec![id]));
        }
        let mut updated = entity.clone();
        updated.set_version(entity.version() + 1);
        *existing = updated;
        Ok(1)
    }

    pub async fn get(&self, id: &str) -> LibraryResult<T> {
        let records = self.records.read().await;
        records.iter().find(|r| r.id() == id).cloned()
            .ok_or_else(|| LibraryError::not_found(format!("{} not found for {}", self.name, id).as_str()))
    }

    pub async fn delete(&self, entity: &T) -> LibraryResult<usize> {
        let mut records = self.records.write().await;
        let id = entity.id();
        let position = match records.iter().position(|r| r.id() == id) {
            Some(position) => position,
            None => return Ok(0),
        };
        let stored = records[position].version();
        if stored != entity.version() {
            return Err(LibraryError::conflict(
                format!("{} {} was modified before it could be deleted, expected version {} but found {}",
                        self.name, id, entity.version(), stored).as_str(), vec![id]));
        }
        records.remove(position);
        Ok(1)
    }

    // predicate keys follow the DynamoDB helper convention: "attr" for equality or "attr:op" with
    // op one of =, <, <=, >, >=; values are compared as strings.
    pub async fn query(&self, predicate: &HashMap<String, String>,
                       page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<T>> {
        let records = self.records.read().await;
        let mut matched = vec![];
        for record in records.iter() {
            if matches_predicate(&serde_json::to_value(record)?, predicate) {
                matched.push(record.clone());
            }
        }
        Ok(paginate(matched, page, page_size))
    }

    pub async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<T>> {
        let records = self.records.read().await;
        Ok(paginate(records.clone(), page, page_size))
    }
}

fn matches_predicate(value: &Value, predicate: &HashMap<String, String>) -> bool {
    predicate.iter().all(|(k, expected)| {
        let (attr, op) = match k.split_once(':') {
            Some((attr, op)) => (attr, op),
            None => (k.as_str(), "="),
        };
        let actual = match value.get(attr) {
            Some(Value::String(s)) => s.to_string(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        match op {
            "<" => actual.as_str() < expected.as_str(),
            "<=" => actual.as_str() <= expected.as_str(),
            ">" => actual.as_str() > expected.as_str(),
            ">=" => actual.as_str() >= expected.as_str(),
            _ => actual == *expected,
        }
    })
}

// the page token is the offset of the first record of the page
fn paginate<T>(records: Vec<T>, page: Option<&str>, page_size: usize) -> PaginatedResult<T> {
    let page_size = cmp::max(page_size, 1);
    let offset = page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0);
    let total = records.len();
    let end = cmp::min(offset.saturating_add(page_size), total);
    let next_page = if end < total { Some(end.to_string()) } else { None };
    let records = records.into_iter().skip(offset).take(page_size).collect();
    PaginatedResult::new(page, page_size, next_page, records)
}
