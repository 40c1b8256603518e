// src/query/request.rs
//! Listing requests: which rows, in what order, from where.

use super::filter::{Combinator, Filter};
use crate::constants::properties;
use serde::{Deserialize, Serialize};

/// What a listing call is looking for. At most one shape is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    /// Continue a previous unfiltered listing.
    NextPage { cursor: String },
    /// Posts carrying all (`And`) or any (`Or`) of the tags.
    Tags { op: Combinator, tags: Vec<String> },
    /// Substring match on title and/or description.
    Content {
        op: Combinator,
        title: Option<String>,
        description: Option<String>,
    },
    /// The single post with this slug.
    Path { path: String },
}

impl Query {
    pub fn tags<I, S>(op: Combinator, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Tags {
            op,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Query::Path { path: path.into() }
    }

    /// The start cursor this query carries, if it is a continuation.
    pub fn cursor(&self) -> Option<&str> {
        match self {
            Query::NextPage { cursor } => Some(cursor),
            _ => None,
        }
    }
}

/// The loose wire form of a query, as callers send it.
///
/// Every field is optional. `into_query` picks the shape by which fields are
/// present, in a fixed order: tags, then title/description, then path, then
/// cursor. Anything else is "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawQuery {
    #[serde(default, rename = "type")]
    pub op: Option<Combinator>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl RawQuery {
    pub fn into_query(self) -> Option<Query> {
        let op = self.op.unwrap_or_default();

        if let Some(tags) = self.tags {
            Some(Query::Tags { op, tags })
        } else if self.title.is_some() || self.description.is_some() {
            Some(Query::Content {
                op,
                title: self.title,
                description: self.description,
            })
        } else if let Some(path) = self.path {
            Some(Query::Path { path })
        } else {
            self.cursor.map(|cursor| Query::NextPage { cursor })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampKind {
    CreatedTime,
    LastEditedTime,
}

/// One sort key, by property or by upstream timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sort {
    Property {
        property: String,
        direction: Direction,
    },
    Timestamp {
        timestamp: TimestampKind,
        direction: Direction,
    },
}

impl Sort {
    pub fn property(property: &str, direction: Direction) -> Self {
        Sort::Property {
            property: property.to_string(),
            direction,
        }
    }

    /// Newest publication first, the order every post listing uses.
    pub fn newest_first() -> Self {
        Self::property(properties::PUBLISHED, Direction::Descending)
    }
}

/// Body of a database query call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Sort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// The filter for `query` alone, without the public gate.
fn query_filter(query: Option<&Query>) -> Option<Filter> {
    match query? {
        Query::Tags { op, tags } => Filter::group(
            *op,
            tags.iter()
                .map(|tag| Filter::multi_select_contains(properties::TAGS, tag))
                .collect(),
        ),
        Query::Content {
            op,
            title,
            description,
        } => {
            let mut conditions = Vec::new();
            if let Some(title) = title.as_deref().filter(|t| !t.is_empty()) {
                conditions.push(Filter::text_contains(properties::NAME, title));
            }
            if let Some(description) = description.as_deref().filter(|d| !d.is_empty()) {
                conditions.push(Filter::text_contains(properties::DESCRIPTION, description));
            }
            Filter::group(*op, conditions)
        }
        Query::Path { path } => Some(Filter::And {
            and: vec![Filter::text_equals(properties::PATH, path)],
        }),
        Query::NextPage { .. } => None,
    }
}

fn public_gate(filter: Option<Filter>) -> Filter {
    let public = Filter::checkbox_equals(properties::PUBLIC, true);
    Filter::And {
        and: match filter {
            Some(filter) => vec![filter, public],
            None => vec![public],
        },
    }
}

/// Builds the filter for `query`, always restricted to public rows.
///
/// Pure: equal queries give equal filters.
pub fn build_filter(query: Option<&Query>) -> Filter {
    public_gate(query_filter(query))
}

/// One listing call.
///
/// Equal requests are the same memo key. The cursor lives beside the query so
/// a filtered listing can be continued without losing its filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingRequest {
    pub query: Option<Query>,
    pub cursor: Option<String>,
    pub sorts: Vec<Sort>,
    pub page_size: Option<u32>,
    public_only: bool,
}

impl Default for ListingRequest {
    fn default() -> Self {
        Self {
            query: None,
            cursor: None,
            sorts: Vec::new(),
            page_size: None,
            public_only: true,
        }
    }
}

impl ListingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a request from the loose wire form. Any cursor it carries is
    /// honoured, whatever shape the rest of it selects.
    pub fn from_raw(raw: RawQuery) -> Self {
        let cursor = raw.cursor.clone();
        Self {
            query: raw.into_query(),
            cursor,
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sorts.push(sort);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// The same request, continued from `cursor`.
    pub fn after(&self, cursor: Option<String>) -> Self {
        Self {
            cursor,
            ..self.clone()
        }
    }

    /// Lifts the public gate. Only for internal callers that re-check
    /// visibility themselves.
    pub(crate) fn include_private(mut self) -> Self {
        self.public_only = false;
        self
    }

    pub fn public_only(&self) -> bool {
        self.public_only
    }

    pub fn start_cursor(&self) -> Option<&str> {
        self.cursor
            .as_deref()
            .or_else(|| self.query.as_ref().and_then(Query::cursor))
    }

    pub fn to_database_query(&self) -> DatabaseQuery {
        let filter = if self.public_only {
            Some(build_filter(self.query.as_ref()))
        } else {
            query_filter(self.query.as_ref())
        };

        DatabaseQuery {
            filter,
            sorts: self.sorts.clone(),
            start_cursor: self.start_cursor().map(str::to_string),
            page_size: self.page_size,
        }
    }
}
