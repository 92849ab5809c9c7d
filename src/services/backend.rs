use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::Result,
    services::api::ResourceApi,
};

/// 资源后端的类型化封装
#[derive(Clone)]
pub struct Backend {
    api: Arc<dyn ResourceApi>,
}

impl Backend {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self { api }
    }

    /// 列出记录；无法解析的条目被跳过
    pub async fn list<T>(&self, resource: &str, filter: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let filter: Vec<(String, String)> = filter
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let values = self.api.list(resource, &filter).await?;
        let mut records = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<T>(value) {
                Ok(record) => records.push(record),
                Err(e) => warn!("Skipping malformed {} record: {}", resource, e),
            }
        }

        debug!("Listed {} {} records", records.len(), resource);
        Ok(records)
    }

    /// 按字段查找第一条记录
    pub async fn find_one<T>(&self, resource: &str, field: &str, value: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let records = self.list::<T>(resource, &[(field, value)]).await?;
        Ok(records.into_iter().next())
    }

    pub async fn get<T>(&self, resource: &str, id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        match self.api.get(resource, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn create<T>(&self, resource: &str, record: &T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let created = self.api.create(resource, serde_json::to_value(record)?).await?;
        Ok(serde_json::from_value(created)?)
    }

    /// 带版本令牌的整体更新
    pub async fn update<T>(
        &self,
        resource: &str,
        id: &str,
        record: &T,
        expected_version: Option<u64>,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let body: Value = serde_json::to_value(record)?;
        let updated = self.api.update(resource, id, body, expected_version).await?;
        Ok(serde_json::from_value(updated)?)
    }
}
