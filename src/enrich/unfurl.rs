// src/enrich/unfurl.rs
use super::{EnrichError, LinkUnfurler};
use crate::constants::{FETCH_USER_AGENT, UNFURL_MAX_REDIRECTS, UNFURL_TIMEOUT};
use crate::model::WebMetadata;
use regex::Regex;
use reqwest::{redirect, Client};
use std::collections::HashMap;
use url::Url;

/// Fetches a page and reads its OpenGraph and HTML metadata.
///
/// Bounded by a short timeout and a small redirect budget.
#[derive(Clone)]
pub struct HttpUnfurler {
    client: Client,
}

impl HttpUnfurler {
    pub fn new() -> Result<Self, EnrichError> {
        let client = Client::builder()
            .user_agent(FETCH_USER_AGENT)
            .timeout(UNFURL_TIMEOUT)
            .redirect(redirect::Policy::limited(UNFURL_MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl LinkUnfurler for HttpUnfurler {
    async fn unfurl(&self, url: &str) -> Result<WebMetadata, EnrichError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let html = response.text().await?;
        Ok(parse_web_metadata(&html, &final_url))
    }
}

lazy_static::lazy_static! {
    static ref META_TAG: Regex = Regex::new(r"(?is)<meta\s[^>]*>").expect("meta regex is valid");
    static ref LINK_TAG: Regex = Regex::new(r"(?is)<link\s[^>]*>").expect("link regex is valid");
    static ref TITLE_TAG: Regex =
        Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex is valid");
    static ref ATTRIBUTE: Regex = Regex::new(r#"(?is)([a-z:_-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute regex is valid");
    static ref NUMERIC_ENTITY: Regex =
        Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("entity regex is valid");
}

fn attributes(tag: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(tag)
        .filter_map(|captures| {
            let name = captures.get(1)?.as_str().to_ascii_lowercase();
            let value = captures.get(2).or_else(|| captures.get(3))?.as_str();
            Some((name, value.to_string()))
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |captures: &regex::Captures| {
        let raw = &captures[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        };
        code.and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| captures[0].to_string())
    });

    numeric
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| decode_entities(v.trim()))
        .filter(|v| !v.is_empty())
}

/// Extracts link-preview metadata from an HTML document fetched from `page_url`.
///
/// OpenGraph properties win over plain HTML equivalents. Relative icon and
/// image links are resolved against `page_url`; with no icon link the site's
/// `/favicon.ico` is assumed.
pub fn parse_web_metadata(html: &str, page_url: &Url) -> WebMetadata {
    let mut meta: HashMap<String, String> = HashMap::new();
    for tag in META_TAG.find_iter(html) {
        let attrs = attributes(tag.as_str());
        let key = attrs.get("property").or_else(|| attrs.get("name"));
        if let (Some(key), Some(content)) = (key, attrs.get("content")) {
            meta.entry(key.to_ascii_lowercase())
                .or_insert_with(|| content.clone());
        }
    }

    let title = non_empty(meta.get("og:title").cloned()).or_else(|| {
        non_empty(
            TITLE_TAG
                .captures(html)
                .and_then(|captures| captures.get(1))
                .map(|m| m.as_str().to_string()),
        )
    });

    let description = non_empty(meta.get("og:description").cloned())
        .or_else(|| non_empty(meta.get("description").cloned()));

    let icon_href = LINK_TAG.find_iter(html).find_map(|tag| {
        let attrs = attributes(tag.as_str());
        let rel = attrs.get("rel")?.to_ascii_lowercase();
        if rel.split_whitespace().any(|part| part == "icon") {
            attrs.get("href").cloned()
        } else {
            None
        }
    });
    let icon = page_url
        .join(icon_href.as_deref().unwrap_or("/favicon.ico"))
        .ok()
        .map(String::from);

    let image = non_empty(meta.get("og:image").cloned())
        .and_then(|href| page_url.join(&href).ok())
        .map(String::from);

    let url = non_empty(meta.get("og:url").cloned()).unwrap_or_else(|| page_url.to_string());

    WebMetadata {
        title,
        description,
        icon,
        image,
        url,
    }
}
