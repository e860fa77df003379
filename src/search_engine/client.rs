//! Search engine HTTP client / 搜索引擎 HTTP 客户端
//!
//! Wire contract (all keyed by resolved alias or index name):
//! - `PATCH {base}/indexes/{target}/schema`  schema-level settings
//! - `PUT   {base}/indexes/{target}/lexical` stopwords and synonyms
//! - `GET   {base}/indexes/{target}/schema`  introspection

use async_trait::async_trait;
use reqwest::{Client, Response, Url};

use super::{IndexSchema, SearchIndex};
use crate::config::SearchEngineConfig;
use crate::error::RemoteError;
use crate::search_config::{SchemaFields, StopwordsSynonymsConfig};

const API_KEY_HEADER: &str = "X-API-KEY";

/// HTTP search engine adapter / HTTP 搜索引擎适配器
pub struct HttpSearchIndex {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpSearchIndex {
    pub fn new(config: &SearchEngineConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim().to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn index_url(&self, target: &str, resource: &str) -> Result<Url, RemoteError> {
        if self.base_url.is_empty() {
            return Err(RemoteError::Unavailable("search engine base_url is not configured".to_string()));
        }
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| RemoteError::Unavailable(format!("invalid base_url {}: {}", self.base_url, e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| RemoteError::Unavailable(format!("base_url {} cannot carry a path", self.base_url)))?;
            segments.pop_if_empty().extend(["indexes", target, resource]);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        if self.api_key.is_empty() {
            req
        } else {
            req.header(API_KEY_HEADER, &self.api_key)
        }
    }
}

/// Turn non-2xx responses into `RemoteError::Status` / 检查响应状态
async fn check_status(resp: Response) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn push_schema(&self, target: &str, fields: &SchemaFields) -> Result<(), RemoteError> {
        let url = self.index_url(target, "schema")?;
        let resp = self.request(reqwest::Method::PATCH, url).json(fields).send().await?;
        check_status(resp).await?;
        tracing::debug!("Schema settings pushed to index {}", target);
        Ok(())
    }

    async fn push_lexical(&self, target: &str, lexical: &StopwordsSynonymsConfig) -> Result<(), RemoteError> {
        let url = self.index_url(target, "lexical")?;
        let resp = self.request(reqwest::Method::PUT, url).json(lexical).send().await?;
        check_status(resp).await?;
        tracing::debug!(
            "Lexical settings pushed to index {}: {} stopwords, {} synonym rules",
            target,
            lexical.stopwords.len(),
            lexical.synonyms.len()
        );
        Ok(())
    }

    async fn describe(&self, target: &str) -> Result<IndexSchema, RemoteError> {
        let url = self.index_url(target, "schema")?;
        let resp = self.request(reqwest::Method::GET, url).send().await?;
        let schema = check_status(resp).await?.json::<IndexSchema>().await?;
        Ok(schema)
    }
}
