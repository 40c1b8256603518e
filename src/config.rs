// src/config.rs
use crate::api::RetryPolicy;
use crate::blocks::MaterializeOptions;
use crate::cache::CacheTtls;
use crate::constants::{
    BLOCK_FETCH_CONCURRENCY, DEFAULT_DATABASE_ID, IMAGE_CACHING_TIME, MEMO_CAPACITY, MEMO_WINDOW,
    NOTION_API_PAGE_SIZE, NOTION_MAX_BLOCK_DEPTH, POSTS_PER_PAGE, PREVIEW_POSTS,
};
use crate::error::AppError;
use crate::types::{ApiKey, BearerToken, DatabaseId, ValidationError};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Notion database holding the posts (ID or URL)
    #[arg(long, global = true)]
    pub database_id: Option<String>,

    /// Address the HTTP server listens on
    #[arg(long, global = true)]
    pub bind: Option<String>,

    /// Objects requested per upstream page (1-100)
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Upstream fetches in flight while materializing a page
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Give up after this many rate-limit retries (default: retry forever)
    #[arg(long, global = true)]
    pub max_rate_limit_retries: Option<u32>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve the revalidation, block lookup and cache-warm endpoints
    Serve,
    /// Warm the cache once and print what was fetched
    Warm,
}

/// Resolved site configuration.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub api_key: ApiKey,
    pub database_id: DatabaseId,
    /// Guards the revalidation endpoint when set.
    pub revalidation_token: Option<BearerToken>,
    /// Guards the cache-warm endpoint when set.
    pub cache_warm_token: Option<BearerToken>,
    pub base_url: Url,
    pub bind_addr: SocketAddr,
    pub cache_ttls: CacheTtls,
    pub image_caching_time: Duration,
    pub posts_per_page: usize,
    pub preview_posts: usize,
    pub block_concurrency: usize,
    pub memo_window: Duration,
    pub memo_capacity: usize,
    pub page_size: u32,
    pub max_rate_limit_retries: Option<u32>,
    pub verbose: bool,
}

impl SiteConfig {
    /// Resolves configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with(cli, |name| std::env::var(name).ok())
    }

    /// Resolves configuration reading environment variables through `env`.
    pub fn resolve_with(
        cli: CommandLineInput,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let api_key_str = env("NOTION_API_KEY").ok_or_else(|| {
            AppError::MissingConfiguration(
                "NOTION_API_KEY environment variable not set".to_string(),
            )
        })?;
        let api_key = ApiKey::new(api_key_str)?;

        let database_id = DatabaseId::parse(
            cli.database_id
                .or_else(|| env("NOTION_DATABASE_ID"))
                .as_deref()
                .unwrap_or(DEFAULT_DATABASE_ID),
        )?;

        let token = |name: &str| -> Result<Option<BearerToken>, ValidationError> {
            env(name)
                .filter(|value| !value.trim().is_empty())
                .map(BearerToken::new)
                .transpose()
        };

        let base_url_str = env("SITE_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url_str).map_err(|e| ValidationError::InvalidUrl {
            url: base_url_str.clone(),
            reason: e.to_string(),
        })?;

        let bind_str = cli
            .bind
            .or_else(|| env("NOTION2BLOG_BIND_ADDR"))
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_str.parse().map_err(|e: std::net::AddrParseError| {
            AppError::MissingConfiguration(format!("Invalid bind address '{}': {}", bind_str, e))
        })?;

        let page_size = cli.page_size.unwrap_or(NOTION_API_PAGE_SIZE);
        if !(1..=NOTION_API_PAGE_SIZE).contains(&page_size) {
            return Err(ValidationError::OutOfBounds {
                value: page_size as u64,
                min: 1,
                max: NOTION_API_PAGE_SIZE as u64,
            }
            .into());
        }

        Ok(SiteConfig {
            api_key,
            database_id,
            revalidation_token: token("REVALIDATION_TOKEN")?,
            cache_warm_token: token("CACHE_WARM_TOKEN")?,
            base_url,
            bind_addr,
            page_size,
            block_concurrency: cli.concurrency.unwrap_or(BLOCK_FETCH_CONCURRENCY).max(1),
            max_rate_limit_retries: cli.max_rate_limit_retries,
            verbose: cli.verbose,
            ..Self::default()
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_rate_limit_retries,
        }
    }

    pub fn materialize_options(&self) -> MaterializeOptions {
        MaterializeOptions {
            concurrency: self.block_concurrency,
            page_size: self.page_size,
            max_depth: NOTION_MAX_BLOCK_DEPTH,
            memo_capacity: self.memo_capacity,
            memo_window: self.memo_window,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::new("secret_default_key_for_testing_only")
                .expect("Default API key should be valid"),
            database_id: DatabaseId::parse(DEFAULT_DATABASE_ID)
                .expect("Default database id should be valid"),
            revalidation_token: None,
            cache_warm_token: None,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("Default base URL should be valid"),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cache_ttls: CacheTtls::default(),
            image_caching_time: IMAGE_CACHING_TIME,
            posts_per_page: POSTS_PER_PAGE,
            preview_posts: PREVIEW_POSTS,
            block_concurrency: BLOCK_FETCH_CONCURRENCY,
            memo_window: MEMO_WINDOW,
            memo_capacity: MEMO_CAPACITY,
            page_size: NOTION_API_PAGE_SIZE,
            max_rate_limit_retries: None,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cli(args: &[&str]) -> CommandLineInput {
        CommandLineInput::try_parse_from(std::iter::once("notion2blog").chain(args.iter().copied()))
            .unwrap()
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_requires_api_key() {
        let result = SiteConfig::resolve_with(cli(&["serve"]), env_of(&[]));
        assert!(matches!(result, Err(AppError::MissingConfiguration(_))));
    }

    #[test]
    fn test_defaults() {
        let config = SiteConfig::resolve_with(
            cli(&["serve"]),
            env_of(&[("NOTION_API_KEY", "secret_abcdefghijklmnopqrs")]),
        )
        .unwrap();

        assert_eq!(config.database_id.as_str(), DEFAULT_DATABASE_ID);
        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.revalidation_token.is_none());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.materialize_options().concurrency, 2);
    }

    #[test]
    fn test_flags_and_tokens() {
        let config = SiteConfig::resolve_with(
            cli(&[
                "warm",
                "--page-size",
                "25",
                "--max-rate-limit-retries",
                "4",
                "--bind",
                "127.0.0.1:8080",
            ]),
            env_of(&[
                ("NOTION_API_KEY", "secret_abcdefghijklmnopqrs"),
                ("REVALIDATION_TOKEN", "s3cret"),
                ("CACHE_WARM_TOKEN", "  "),
            ]),
        )
        .unwrap();

        assert_eq!(config.page_size, 25);
        assert_eq!(config.retry_policy().max_retries, Some(4));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(config
            .revalidation_token
            .as_ref()
            .unwrap()
            .matches_header(Some("Bearer s3cret")));
        assert!(config.cache_warm_token.is_none());
    }

    #[test]
    fn test_rejects_oversized_page() {
        let result = SiteConfig::resolve_with(
            cli(&["serve", "--page-size", "500"]),
            env_of(&[("NOTION_API_KEY", "secret_abcdefghijklmnopqrs")]),
        );
        assert!(matches!(
            result,
            Err(AppError::ValidationError(ValidationError::OutOfBounds { .. }))
        ));
    }
}
