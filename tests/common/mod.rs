//! Shared fixtures: an in-memory Notion workspace and offline enrichers.
#![allow(dead_code)]

use notion2blog::api::PaginatedResponse;
use notion2blog::enrich::EnrichError;
use notion2blog::model::{
    BlockCommon, BookmarkBlock, EquationBlock, ExternalFile, FileObject, ImageBlock,
    ParagraphBlock, SyncedBlock, TextBlockContent, ToggleBlock,
};
use notion2blog::query::{
    CheckboxCondition, DatabaseQuery, Direction, MultiSelectCondition, PropertyCondition,
    PropertyFilter, Sort, TextCondition,
};
use notion2blog::{
    AppError, AppState, Block, BlockId, DatabaseId, Dimensions, Filter, ImageProbe, LinkUnfurler,
    NotionErrorCode, NotionRepository, PageId, RichTextItem, SiteConfig, WebMetadata,
};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A Notion workspace held in memory.
///
/// Evaluates filters and sorts the way the real database endpoint does for
/// the property types the blog uses, paginates with numeric cursors, and
/// counts every call.
#[derive(Default)]
pub struct FakeNotion {
    rows: Mutex<Vec<Value>>,
    children: Mutex<HashMap<BlockId, Vec<Block>>>,
    pub query_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub children_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    failing: AtomicBool,
    ignore_filters: AtomicBool,
    rate_limits_left: AtomicUsize,
    children_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_query: Mutex<Option<DatabaseQuery>>,
}

impl FakeNotion {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        let fake = Self::default();
        *fake.rows.lock() = rows;
        Arc::new(fake)
    }

    pub fn set_rows(&self, rows: Vec<Value>) {
        *self.rows.lock() = rows;
    }

    pub fn set_children(&self, parent: &BlockId, blocks: Vec<Block>) {
        self.children.lock().insert(parent.clone(), blocks);
    }

    /// Every subsequent call fails with an upstream 500.
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Answers queries with every row, as a misbehaving upstream might.
    pub fn ignore_filters(&self) {
        self.ignore_filters.store(true, Ordering::SeqCst);
    }

    /// The next `count` database queries answer 429 with `Retry-After: 2`.
    pub fn rate_limit_next(&self, count: usize) {
        self.rate_limits_left.store(count, Ordering::SeqCst);
    }

    pub fn delay_children(&self, delay: Duration) {
        *self.children_delay.lock() = Some(delay);
    }

    fn check_failing(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::service(
                NotionErrorCode::InternalError,
                "upstream is down",
                StatusCode::INTERNAL_SERVER_ERROR,
            ));
        }
        Ok(())
    }

    fn find_block(&self, id: &BlockId) -> Option<Block> {
        self.children
            .lock()
            .values()
            .flatten()
            .find(|block| block.id() == id)
            .cloned()
    }
}

fn not_found(what: impl std::fmt::Display) -> AppError {
    AppError::service(
        NotionErrorCode::ObjectNotFound,
        format!("Could not find {}", what),
        StatusCode::NOT_FOUND,
    )
}

fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, page_size: usize) -> PaginatedResponse<T> {
    let start = cursor.and_then(|c| c.parse().ok()).unwrap_or(0).min(items.len());
    let end = (start + page_size.max(1)).min(items.len());
    let next_cursor = (end < items.len()).then(|| end.to_string());
    PaginatedResponse {
        results: items[start..end].to_vec(),
        has_more: next_cursor.is_some(),
        next_cursor,
    }
}

fn plain_text(property: &Value) -> String {
    ["title", "rich_text"]
        .iter()
        .filter_map(|key| property[*key].as_array())
        .flatten()
        .filter_map(|span| span["plain_text"].as_str())
        .collect()
}

/// Evaluates a filter against one raw row.
pub fn matches(filter: &Filter, row: &Value) -> bool {
    match filter {
        Filter::And { and } => and.iter().all(|f| matches(f, row)),
        Filter::Or { or } => or.iter().any(|f| matches(f, row)),
        Filter::Property(PropertyFilter {
            property,
            condition,
        }) => {
            let value = &row["properties"][property.as_str()];
            match condition {
                PropertyCondition::MultiSelect(MultiSelectCondition::Contains(tag)) => value
                    ["multi_select"]
                    .as_array()
                    .is_some_and(|options| options.iter().any(|o| o["name"] == tag.as_str())),
                PropertyCondition::RichText(TextCondition::Contains(needle)) => plain_text(value)
                    .to_lowercase()
                    .contains(&needle.to_lowercase()),
                PropertyCondition::RichText(TextCondition::Equals(expected)) => {
                    plain_text(value) == *expected
                }
                PropertyCondition::Checkbox(CheckboxCondition::Equals(expected)) => {
                    value["checkbox"].as_bool() == Some(*expected)
                }
            }
        }
    }
}

fn sort_key(row: &Value, property: &str) -> String {
    row["properties"][property]["date"]["start"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

#[async_trait::async_trait]
impl NotionRepository for FakeNotion {
    async fn query_database(
        &self,
        _database: &DatabaseId,
        query: &DatabaseQuery,
    ) -> Result<PaginatedResponse<Value>, AppError> {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock() = Some(query.clone());
        self.check_failing()?;

        let limited = self
            .rate_limits_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if limited {
            return Err(AppError::NotionService {
                code: NotionErrorCode::RateLimited,
                message: "slow down".to_string(),
                status: StatusCode::TOO_MANY_REQUESTS,
                retry_after: Some("2".to_string()),
            });
        }

        let filter = query
            .filter
            .as_ref()
            .filter(|_| !self.ignore_filters.load(Ordering::SeqCst));
        let mut matched: Vec<Value> = self
            .rows
            .lock()
            .iter()
            .filter(|row| filter.map_or(true, |f| matches(f, row)))
            .cloned()
            .collect();

        for sort in query.sorts.iter().rev() {
            if let Sort::Property {
                property,
                direction,
            } = sort
            {
                matched.sort_by(|a, b| {
                    let ordering = sort_key(a, property).cmp(&sort_key(b, property));
                    match direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                });
            }
        }

        Ok(paginate(
            &matched,
            query.start_cursor.as_deref(),
            query.page_size.unwrap_or(100) as usize,
        ))
    }

    async fn retrieve_page(&self, id: &PageId) -> Result<Value, AppError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.rows
            .lock()
            .iter()
            .find(|row| row["id"].as_str().and_then(|raw| PageId::parse(raw).ok()).as_ref() == Some(id))
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn retrieve_block(&self, id: &BlockId) -> Result<Block, AppError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failing()?;
        self.find_block(id).ok_or_else(|| not_found(id))
    }

    async fn list_block_children(
        &self,
        parent: &BlockId,
        cursor: Option<&str>,
        page_size: u32,
    ) -> Result<PaginatedResponse<Block>, AppError> {
        self.children_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.children_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.check_failing()?;

        let blocks = self
            .children
            .lock()
            .get(parent)
            .cloned()
            .unwrap_or_default();
        Ok(paginate(&blocks, cursor, page_size as usize))
    }
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A deterministic page id for fixture number `n`.
pub fn page_id(n: u32) -> String {
    format!("{:08x}-0000-4000-8000-000000000000", n)
}

/// A full database row for a post.
pub fn post_row(n: u32, path: &str, tags: &[&str], public: bool, published: &str) -> Value {
    json!({
        "object": "page",
        "id": page_id(n),
        "last_edited_time": format!("{}T12:00:00.000Z", published),
        "properties": {
            "Path": { "type": "rich_text", "rich_text": [{ "plain_text": path }] },
            "Name": { "type": "title", "title": [{ "plain_text": format!("Post {}", path) }] },
            "Author": { "type": "rich_text", "rich_text": [{ "plain_text": "Ada" }] },
            "Description": { "type": "rich_text", "rich_text": [{ "plain_text": format!("About {}", path) }] },
            "Tags": {
                "type": "multi_select",
                "multi_select": tags.iter().map(|t| json!({ "name": t })).collect::<Vec<_>>()
            },
            "Public": { "type": "checkbox", "checkbox": public },
            "Published": { "type": "date", "date": { "start": published } }
        }
    })
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

pub fn paragraph(text: &str) -> Block {
    Block::Paragraph(ParagraphBlock {
        common: BlockCommon::new(BlockId::new_v4()),
        content: TextBlockContent {
            rich_text: vec![RichTextItem::plain_text(text)],
            ..Default::default()
        },
    })
}

pub fn toggle(id: &BlockId) -> Block {
    Block::Toggle(ToggleBlock {
        common: BlockCommon::new(id.clone()).with_has_children(true),
        content: TextBlockContent::default(),
    })
}

pub fn synced_copy(original: &BlockId) -> Block {
    Block::Synced(SyncedBlock {
        common: BlockCommon::new(BlockId::new_v4()).with_has_children(true),
        synced_from: Some(original.clone()),
    })
}

pub fn image(url: &str) -> Block {
    Block::Image(ImageBlock {
        common: BlockCommon::new(BlockId::new_v4()),
        image: FileObject::External {
            external: ExternalFile {
                url: url.to_string(),
            },
        },
        caption: Vec::new(),
        dim: None,
        cache_expiry_time: None,
    })
}

pub fn bookmark(url: &str) -> Block {
    Block::Bookmark(BookmarkBlock {
        common: BlockCommon::new(BlockId::new_v4()),
        url: url.to_string(),
        caption: Vec::new(),
        metadata: None,
    })
}

pub fn equation(expression: &str) -> Block {
    Block::Equation(EquationBlock {
        common: BlockCommon::new(BlockId::new_v4()),
        expression: expression.to_string(),
        markup: None,
    })
}

// ---------------------------------------------------------------------------
// Enrichers
// ---------------------------------------------------------------------------

/// Answers every probe with the same size, counting calls.
#[derive(Default)]
pub struct FixedProbe {
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl ImageProbe for FixedProbe {
    async fn dimensions(&self, _url: &str) -> Result<Dimensions, EnrichError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Dimensions {
            width: 800,
            height: 600,
        })
    }
}

/// Unfurls everything to a title derived from the URL, except hosts named
/// `broken`.
pub struct StubUnfurler;

#[async_trait::async_trait]
impl LinkUnfurler for StubUnfurler {
    async fn unfurl(&self, url: &str) -> Result<WebMetadata, EnrichError> {
        if url.contains("broken") {
            return Err(EnrichError::Status {
                url: url.to_string(),
                status: 500,
            });
        }
        Ok(WebMetadata {
            title: Some(format!("Title of {}", url)),
            url: url.to_string(),
            ..Default::default()
        })
    }
}

/// The whole stack over `fake`, with offline enrichers.
pub fn site(fake: &Arc<FakeNotion>) -> AppState {
    site_with(fake, SiteConfig::default())
}

pub fn site_with(fake: &Arc<FakeNotion>, config: SiteConfig) -> AppState {
    AppState::assemble(
        &config,
        fake.clone(),
        Arc::new(FixedProbe::default()),
        Arc::new(StubUnfurler),
    )
}
