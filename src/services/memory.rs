use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    services::api::ResourceApi,
};

type Table = BTreeMap<String, Value>;

/// 进程内资源后端，行为与 REST 后端一致（含版本校验），用于离线模式和测试
#[derive(Clone, Default)]
pub struct MemoryApi {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入记录，不做版本校验
    pub fn seed(&self, resource: &str, record: Value) -> Result<Value> {
        let id = record_id(&record)
            .ok_or_else(|| AppError::validation("Seeded record needs an id"))?;
        let mut record = record;
        if record.get("version").map_or(true, Value::is_null) {
            record["version"] = json!(1);
        }

        self.tables
            .write()
            .entry(resource.to_string())
            .or_default()
            .insert(id, record.clone());
        Ok(record)
    }

    pub fn count(&self, resource: &str) -> usize {
        self.tables.read().get(resource).map_or(0, |t| t.len())
    }
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn field_matches(record: &Value, field: &str, expected: &str) -> bool {
    match record.get(field) {
        Some(Value::String(s)) => s == expected,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == expected,
    }
}

fn current_version(record: &Value) -> u64 {
    record.get("version").and_then(Value::as_u64).unwrap_or(0)
}

#[async_trait]
impl ResourceApi for MemoryApi {
    async fn list(&self, resource: &str, filter: &[(String, String)]) -> Result<Vec<Value>> {
        let tables = self.tables.read();
        let Some(table) = tables.get(resource) else {
            return Ok(Vec::new());
        };

        Ok(table
            .values()
            .filter(|record| {
                filter
                    .iter()
                    .all(|(field, value)| field_matches(record, field, value))
            })
            .cloned()
            .collect())
    }

    async fn get(&self, resource: &str, id: &str) -> Result<Option<Value>> {
        Ok(self
            .tables
            .read()
            .get(resource)
            .and_then(|t| t.get(id))
            .cloned())
    }

    async fn create(&self, resource: &str, body: Value) -> Result<Value> {
        if !body.is_object() {
            return Err(AppError::validation("Record body must be a JSON object"));
        }
        let mut record = body;
        let id = record_id(&record).unwrap_or_else(|| Uuid::new_v4().to_string());
        record["id"] = json!(id);
        record["version"] = json!(1);

        let mut tables = self.tables.write();
        let table = tables.entry(resource.to_string()).or_default();
        if table.contains_key(&id) {
            return Err(AppError::Conflict(format!("{}/{} already exists", resource, id)));
        }
        table.insert(id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        body: Value,
        expected_version: Option<u64>,
    ) -> Result<Value> {
        if !body.is_object() {
            return Err(AppError::validation("Record body must be a JSON object"));
        }
        let mut tables = self.tables.write();
        let stored = tables
            .get_mut(resource)
            .and_then(|t| t.get_mut(id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{} not found", resource, id)))?;

        let version = current_version(stored);
        if let Some(expected) = expected_version {
            if expected != version {
                return Err(AppError::Conflict(format!(
                    "{}/{} is at version {}, expected {}",
                    resource, id, version, expected
                )));
            }
        }

        let mut record = body;
        record["id"] = json!(id);
        record["version"] = json!(version + 1);
        *stored = record.clone();
        Ok(record)
    }

    async fn delete(&self, resource: &str, id: &str) -> Result<()> {
        let removed = self
            .tables
            .write()
            .get_mut(resource)
            .and_then(|t| t.remove(id));

        match removed {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("{}/{} not found", resource, id))),
        }
    }
}
