// src/query/extract.rs
//! Turns raw database rows into `PageMeta`.
//!
//! The database schema is user-editable, so every property is read on its
//! own and falls back to its zero value when absent or of an unexpected
//! type. A row is only dropped when it is not a full page at all.

use crate::constants::properties;
use crate::model::PageMeta;
use crate::types::PageId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawProperty {
    Title {
        #[serde(default)]
        title: Vec<RawText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RawText>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<RawOption>,
    },
    Checkbox {
        #[serde(default)]
        checkbox: bool,
    },
    Date {
        #[serde(default)]
        date: Option<RawDate>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    plain_text: String,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawDate {
    #[serde(default)]
    start: Option<String>,
}

/// Whether a row is a page object at all (query results can mix in others).
pub fn is_page_object(row: &Value) -> bool {
    row.get("object").and_then(Value::as_str) == Some("page")
}

/// Extracts a `PageMeta`, or `None` when the row is not a usable page.
pub fn page_meta(row: &Value) -> Option<PageMeta> {
    if !is_page_object(row) {
        return None;
    }

    let Some(raw_id) = row.get("id").and_then(Value::as_str) else {
        log::debug!("Dropping page row without id");
        return None;
    };
    let id = match PageId::parse(raw_id) {
        Ok(id) => id,
        Err(e) => {
            log::debug!("Dropping page row with malformed id '{}': {}", raw_id, e);
            return None;
        }
    };
    let Some(props) = row.get("properties").and_then(Value::as_object) else {
        log::debug!("Dropping partial page {}", raw_id);
        return None;
    };

    let now = Utc::now();

    Some(PageMeta {
        id,
        path: text_property(props, properties::PATH),
        title: text_property(props, properties::NAME),
        author: text_property(props, properties::AUTHOR),
        description: text_property(props, properties::DESCRIPTION),
        tags: match property(props, properties::TAGS) {
            RawProperty::MultiSelect { multi_select } => {
                multi_select.into_iter().map(|option| option.name).collect()
            }
            _ => Vec::new(),
        },
        public: matches!(
            property(props, properties::PUBLIC),
            RawProperty::Checkbox { checkbox: true }
        ),
        published: match property(props, properties::PUBLISHED) {
            RawProperty::Date {
                date: Some(RawDate { start: Some(start) }),
            } => parse_timestamp(&start).unwrap_or(now),
            _ => now,
        },
        updated: row
            .get("last_edited_time")
            .and_then(Value::as_str)
            .and_then(parse_timestamp)
            .unwrap_or(now),
    })
}

fn property(props: &Map<String, Value>, name: &str) -> RawProperty {
    props
        .get(name)
        .and_then(|value| RawProperty::deserialize(value).ok())
        .unwrap_or(RawProperty::Other)
}

/// Plain text of a title or rich-text property; empty for anything else.
fn text_property(props: &Map<String, Value>, name: &str) -> String {
    match property(props, name) {
        RawProperty::Title { title: spans } | RawProperty::RichText { rich_text: spans } => {
            spans.into_iter().map(|span| span.plain_text).collect()
        }
        _ => String::new(),
    }
}

/// Accepts full RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
