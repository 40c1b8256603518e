// src/cache/mod.rs
//! Tagged, time-boxed caching over the content layer, and its invalidation
//! surface.

mod content;
mod domain;
mod revalidate;
mod service;

pub use content::{CachedContent, CachedImageProbe};
pub use domain::{CacheDomain, CacheTag, CacheTtls};
pub use revalidate::{RevalidateAction, RevalidationReport, Revalidator};
pub use service::{CacheService, CacheStats};
