// src/api/client.rs
//! Thin HTTP client for the Notion REST API.
//!
//! Handles authentication headers and request/response plumbing only. No
//! classification or retrying happens here; that is `NotionApi`'s job.

use super::parser;
use super::responses::PaginatedResponse;
use super::NotionRepository;
use crate::constants::{NOTION_API_BASE_URL, NOTION_API_VERSION};
use crate::error::AppError;
use crate::model::Block;
use crate::query::DatabaseQuery;
use crate::types::{ApiKey, BlockId, DatabaseId, PageId};
use reqwest::{header, Client, Response};
use serde::Serialize;
use serde_json::Value;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(api_key: &ApiKey) -> Result<Self, AppError> {
        Self::with_base_url(api_key, NOTION_API_BASE_URL)
    }

    /// Same as `new`, against a different API root (a proxy or a test server).
    pub fn with_base_url(api_key: &ApiKey, base_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_API_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    /// Makes a GET request to the specified endpoint.
    pub async fn get(&self, endpoint: &str) -> Result<Response, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("GET {}", url);
        Ok(self.client.get(url).send().await?)
    }

    /// Makes a POST request with JSON body to the specified endpoint.
    pub async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Response, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "POST {} body: {}",
                url,
                serde_json::to_string(body).unwrap_or_else(|_| "<unserializable>".to_string())
            );
        } else {
            log::debug!("POST {}", url);
        }

        Ok(self.client.post(url).json(body).send().await?)
    }
}

#[async_trait::async_trait]
impl NotionRepository for NotionHttpClient {
    async fn query_database(
        &self,
        database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        let endpoint = format!("databases/{}/query", database.to_dashed());
        let response = self.post(&endpoint, query).await?;
        let result = extract_response_text(response).await?;
        parser::parse_query_pagination(result)
    }

    async fn retrieve_page(&self, id: &PageId) -> Result<Value, AppError> {
        let endpoint = format!("pages/{}", id.to_dashed());
        let response = self.get(&endpoint).await?;
        let result = extract_response_text(response).await?;
        parser::parse_api_response(result)
    }

    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError> {
        let endpoint = format!("blocks/{}", id.to_dashed());
        let response = self.get(&endpoint).await?;
        let result = extract_response_text(response).await?;
        parser::parse_block_response(result)
    }

    async fn list_block_children(
        &self,
        parent: &BlockId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Block>, AppError> {
        let mut endpoint = format!(
            "blocks/{}/children?page_size={}",
            parent.to_dashed(),
            page_size
        );
        if let Some(cursor) = cursor {
            endpoint.push_str("&start_cursor=");
            endpoint.extend(url::form_urlencoded::byte_serialize(cursor.as_bytes()));
        }

        let response = self.get(&endpoint).await?;
        let result = extract_response_text(response).await?;
        parser::parse_blocks_pagination(result)
    }
}

/// Result of an HTTP operation with response metadata.
#[derive(Debug)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: reqwest::StatusCode,
    pub url: String,
    /// Raw `Retry-After` header, when present.
    pub retry_after: Option<String>,
}

/// Extracts the response body as text with metadata.
pub async fn extract_response_text(response: Response) -> Result<ApiResponse<String>, AppError> {
    let status = response.status();
    let url = response.url().to_string();
    let retry_after = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = response.text().await?;

    Ok(ApiResponse {
        data: text,
        status,
        url,
        retry_after,
    })
}
