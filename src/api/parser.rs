// src/api/parser.rs
//! Response parsing: success bodies into domain values, failures into
//! `AppError::NotionService` with the upstream code attached.

use super::client::ApiResponse;
use super::notion_client_adapter::convert_raw_block;
use super::responses::{ErrorBody, PaginatedResponse};
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionClientError, NotionErrorCode};
use crate::model::Block;
use serde_json::Value;

/// Parse any Notion API response, routing failures through the error parser.
pub fn parse_api_response<T>(result: ApiResponse<String>) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    if result.status.is_success() {
        parse_success(&result.data, &result.url)
    } else {
        Err(parse_error(result))
    }
}

fn parse_success<T>(body: &str, url: &str) -> Result<T, AppError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);

        NotionClientError::Deserialization {
            source: e,
            body: preview(body),
        }
        .into()
    })
}

/// Build the error for a non-2xx response.
///
/// The body's `code` wins when it parses; otherwise the HTTP status decides.
/// A 429 always counts as rate limiting, whatever the body says.
pub fn parse_error(result: ApiResponse<String>) -> AppError {
    let status = result.status;

    let (code, message) = match serde_json::from_str::<ErrorBody>(&result.data) {
        Ok(body) => (NotionErrorCode::from_api_response(&body.code), body.message),
        Err(_) => (
            NotionErrorCode::from_http_status(status.as_u16()),
            format!("HTTP {} from {}: {}", status, result.url, preview(&result.data)),
        ),
    };
    let code = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        NotionErrorCode::RateLimited
    } else {
        code
    };

    log::debug!("Notion returned {} ({}) for {}", status, code, result.url);

    AppError::NotionService {
        code,
        message,
        status,
        retry_after: result.retry_after,
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let cut: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

/// Parse a single block response. A partial block here is an error: the
/// caller asked for this exact block.
pub fn parse_block_response(result: ApiResponse<String>) -> Result<Block, AppError> {
    let raw: Value = parse_api_response(result)?;
    convert_raw_block(raw)?
        .ok_or_else(|| AppError::MalformedResponse("block response has no type".to_string()))
}

/// Parse one page of block children, dropping partial blocks.
pub fn parse_blocks_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Block>, AppError> {
    let page: PaginatedResponse<Value> = parse_api_response(result)?;

    let mut blocks = Vec::with_capacity(page.results.len());
    for raw in page.results {
        if let Some(block) = convert_raw_block(raw)? {
            blocks.push(block);
        }
    }

    Ok(PaginatedResponse {
        results: blocks,
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    })
}

/// Parse one page of a database query. Rows stay raw JSON; the extractor
/// decides which of them are usable.
pub fn parse_query_pagination(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Value>, AppError> {
    parse_api_response(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn response(status: StatusCode, body: &str, retry_after: Option<&str>) -> ApiResponse<String> {
        ApiResponse {
            data: body.to_string(),
            status,
            url: "https://api.notion.com/v1/blocks/abc".to_string(),
            retry_after: retry_after.map(str::to_string),
        }
    }

    #[test]
    fn test_error_body_code_is_used() {
        let body = r#"{
            "object": "error",
            "status": 404,
            "code": "object_not_found",
            "message": "Could not find block with ID: abc123",
            "request_id": "req_123"
        }"#;

        match parse_error(response(StatusCode::NOT_FOUND, body, None)) {
            AppError::NotionService { code, message, .. } => {
                assert_eq!(code, NotionErrorCode::ObjectNotFound);
                assert!(message.contains("abc123"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparseable_body_falls_back_to_status() {
        match parse_error(response(StatusCode::BAD_GATEWAY, "<html>oops</html>", None)) {
            AppError::NotionService { code, .. } => {
                assert_eq!(code, NotionErrorCode::HttpStatus(502))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rate_limit_keeps_retry_after() {
        let body = r#"{"object":"error","status":429,"code":"rate_limited","message":"slow down"}"#;
        match parse_error(response(StatusCode::TOO_MANY_REQUESTS, body, Some("2"))) {
            AppError::NotionService {
                code, retry_after, ..
            } => {
                assert!(code.is_rate_limited());
                assert_eq!(retry_after.as_deref(), Some("2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_children_page_drops_partial_blocks() {
        let body = r#"{
            "object": "list",
            "results": [
                { "object": "block", "id": "c02fc1d3db8b45c5a22227595b15aea7" }
            ],
            "next_cursor": "next",
            "has_more": true
        }"#;
        let page = parse_blocks_pagination(response(StatusCode::OK, body, None)).unwrap();
        assert!(page.results.is_empty());
        assert_eq!(page.continuation(), Some("next"));
    }
}
