// src/enrich/mod.rs
//! Derived data attached to blocks after they are fetched: image sizes,
//! bookmark previews and rendered equations.
//!
//! Every enrichment is best effort. A failure leaves its one field empty and
//! never fails the block.

mod equation;
mod image;
mod unfurl;

use crate::model::Block;
use crate::model::{Dimensions, WebMetadata};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use equation::MathMlRenderer;
pub use image::HttpImageProbe;
pub use unfurl::{parse_web_metadata, HttpUnfurler};

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not read image dimensions from {url}")]
    UndecodableImage { url: String },

    #[error("equation did not render: {0}")]
    Render(String),
}

/// Reads the pixel size of a remote image.
#[async_trait::async_trait]
pub trait ImageProbe: Send + Sync {
    async fn dimensions(&self, url: &str) -> Result<Dimensions, EnrichError>;
}

/// Fetches link-preview metadata for a URL.
#[async_trait::async_trait]
pub trait LinkUnfurler: Send + Sync {
    async fn unfurl(&self, url: &str) -> Result<WebMetadata, EnrichError>;
}

/// Renders LaTeX to markup. `display` selects block rather than inline layout.
pub trait EquationRenderer: Send + Sync {
    fn render(&self, latex: &str, display: bool) -> Result<String, EnrichError>;
}

/// Applies every enrichment a single block is eligible for.
#[derive(Clone)]
pub struct BlockEnricher {
    images: Arc<dyn ImageProbe>,
    links: Arc<dyn LinkUnfurler>,
    equations: Arc<dyn EquationRenderer>,
    image_caching_time: Duration,
}

impl BlockEnricher {
    pub fn new(
        images: Arc<dyn ImageProbe>,
        links: Arc<dyn LinkUnfurler>,
        equations: Arc<dyn EquationRenderer>,
        image_caching_time: Duration,
    ) -> Self {
        Self {
            images,
            links,
            equations,
            image_caching_time,
        }
    }

    /// Enriches `block` in place. Children are left alone; the materializer
    /// visits them separately.
    pub async fn enrich(&self, block: &mut Block) {
        self.render_inline_equations(block);

        match block {
            Block::Image(image) => {
                let url = image.image.url().to_string();
                image.dim = match self.images.dimensions(&url).await {
                    Ok(dim) => Some(dim),
                    Err(e) => {
                        log::debug!("Image probe failed for {}: {}", url, e);
                        None
                    }
                };
                let caching_time = chrono::Duration::from_std(self.image_caching_time)
                    .unwrap_or_else(|_| chrono::Duration::days(1));
                image.cache_expiry_time = Some(Utc::now() + caching_time);
            }
            Block::Bookmark(bookmark) => {
                bookmark.metadata = match self.links.unfurl(&bookmark.url).await {
                    Ok(metadata) => Some(metadata),
                    Err(e) => {
                        log::debug!("Unfurl failed for {}: {}", bookmark.url, e);
                        None
                    }
                };
            }
            Block::Equation(equation) => {
                equation.markup = self.render(&equation.expression, true);
            }
            _ => {}
        }
    }

    /// Whether enriching `block` performs network I/O.
    pub fn needs_fetch(block: &Block) -> bool {
        matches!(block, Block::Image(_) | Block::Bookmark(_))
    }

    fn render_inline_equations(&self, block: &mut Block) {
        for spans in block.rich_text_mut() {
            for span in spans.iter_mut() {
                if let Some(equation) = span.equation_mut() {
                    equation.markup = self.render(&equation.expression, false);
                }
            }
        }
    }

    fn render(&self, latex: &str, display: bool) -> Option<String> {
        match self.equations.render(latex, display) {
            Ok(markup) => Some(markup),
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        }
    }
}
