use async_trait::async_trait;
use reqwest::{header, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use crate::{
    config::Config,
    error::{AppError, Result},
};

/// 后端资源接口：按资源名做 CRUD 和等值过滤
///
/// `update` 的 `expected_version` 作为乐观并发令牌，版本不匹配时返回
/// [`AppError::Conflict`]。
#[async_trait]
pub trait ResourceApi: Send + Sync {
    async fn list(&self, resource: &str, filter: &[(String, String)]) -> Result<Vec<Value>>;

    async fn get(&self, resource: &str, id: &str) -> Result<Option<Value>>;

    async fn create(&self, resource: &str, body: Value) -> Result<Value>;

    async fn update(
        &self,
        resource: &str,
        id: &str,
        body: Value,
        expected_version: Option<u64>,
    ) -> Result<Value>;

    async fn delete(&self, resource: &str, id: &str) -> Result<()>;
}

/// 基于 reqwest 的 REST 客户端
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl RestClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(&config.api_base_url)?,
            token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::internal("API base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, "application/json");

        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 把非 2xx 响应映射为错误
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(AppError::NotFound(message)),
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(AppError::Conflict(message))
            }
            _ => {
                error!("API request failed with {}: {}", status, message);
                Err(AppError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

/// 兼容 `{ "data": ... }` 包装的响应
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[async_trait]
impl ResourceApi for RestClient {
    async fn list(&self, resource: &str, filter: &[(String, String)]) -> Result<Vec<Value>> {
        let url = self.endpoint(&[resource])?;
        debug!("GET {} filter={:?}", url, filter);

        let response = self.request(Method::GET, url).query(filter).send().await?;
        let body: Value = Self::check(response).await?.json().await?;

        match unwrap_envelope(body) {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(AppError::Internal(format!(
                "Expected a list from {}, got {}",
                resource, other
            ))),
        }
    }

    async fn get(&self, resource: &str, id: &str) -> Result<Option<Value>> {
        let url = self.endpoint(&[resource, id])?;
        debug!("GET {}", url);

        let response = self.request(Method::GET, url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: Value = Self::check(response).await?.json().await?;
        match unwrap_envelope(body) {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    async fn create(&self, resource: &str, body: Value) -> Result<Value> {
        let url = self.endpoint(&[resource])?;
        debug!("POST {}", url);

        let response = self.request(Method::POST, url).json(&body).send().await?;
        let created: Value = Self::check(response).await?.json().await?;
        Ok(unwrap_envelope(created))
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        body: Value,
        expected_version: Option<u64>,
    ) -> Result<Value> {
        let url = self.endpoint(&[resource, id])?;
        debug!("PUT {} if-match={:?}", url, expected_version);

        let mut request = self.request(Method::PUT, url).json(&body);
        if let Some(version) = expected_version {
            request = request.header(header::IF_MATCH, format!("\"{}\"", version));
        }

        let response = request.send().await?;
        let updated: Value = Self::check(response).await?.json().await?;
        Ok(unwrap_envelope(updated))
    }

    async fn delete(&self, resource: &str, id: &str) -> Result<()> {
        let url = self.endpoint(&[resource, id])?;
        debug!("DELETE {}", url);

        let response = self.request(Method::DELETE, url).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
