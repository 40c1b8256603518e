// src/server/state.rs
//! The assembled content stack shared by every handler.

use crate::aggregate::PageData;
use crate::api::{NotionApi, NotionHttpClient, NotionRepository};
use crate::blocks::BlockMaterializer;
use crate::cache::{CacheService, CachedContent, CachedImageProbe, Revalidator};
use crate::config::SiteConfig;
use crate::enrich::{
    BlockEnricher, HttpImageProbe, HttpUnfurler, ImageProbe, LinkUnfurler, MathMlRenderer,
};
use crate::error::AppError;
use crate::query::ContentIndex;
use crate::types::BearerToken;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pages: PageData,
    pub revalidator: Revalidator,
    pub blocks: Arc<BlockMaterializer>,
    pub cache: Arc<CacheService>,
    pub revalidation_token: Option<BearerToken>,
    pub cache_warm_token: Option<BearerToken>,
}

impl AppState {
    /// Wires the production stack: HTTP repository, HTTP probes, MathML.
    pub fn from_config(config: &SiteConfig) -> Result<Self, AppError> {
        let repository = NotionHttpClient::new(&config.api_key)?;
        let probe = HttpImageProbe::new().map_err(enrich_setup_error)?;
        let unfurler = HttpUnfurler::new().map_err(enrich_setup_error)?;

        Ok(Self::assemble(
            config,
            Arc::new(repository),
            Arc::new(probe),
            Arc::new(unfurler),
        ))
    }

    /// Wires the stack over the given upstream and secondary fetchers.
    pub fn assemble(
        config: &SiteConfig,
        repository: Arc<dyn NotionRepository>,
        probe: Arc<dyn ImageProbe>,
        unfurler: Arc<dyn LinkUnfurler>,
    ) -> Self {
        let cache = Arc::new(CacheService::new(config.cache_ttls));
        let api = NotionApi::new(repository, config.retry_policy());

        let enricher = BlockEnricher::new(
            Arc::new(CachedImageProbe::new(cache.clone(), probe)),
            unfurler,
            Arc::new(MathMlRenderer),
            config.image_caching_time,
        );

        let index = Arc::new(ContentIndex::new(
            api.clone(),
            config.database_id.clone(),
            config.memo_capacity,
            config.memo_window,
        ));
        let blocks = Arc::new(BlockMaterializer::new(
            api,
            enricher,
            config.materialize_options(),
        ));

        let content = CachedContent::new(cache.clone(), index.clone(), blocks.clone());

        Self {
            pages: PageData::new(content)
                .with_page_sizes(config.posts_per_page, config.preview_posts),
            revalidator: Revalidator::new(cache.clone(), index, blocks.clone()),
            blocks,
            cache,
            revalidation_token: config.revalidation_token.clone(),
            cache_warm_token: config.cache_warm_token.clone(),
        }
    }
}

fn enrich_setup_error(e: crate::enrich::EnrichError) -> AppError {
    AppError::InternalError {
        message: format!("Failed to build enrichment client: {}", e),
        source: Some(Box::new(e)),
    }
}
