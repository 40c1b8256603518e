// src/query/mod.rs
//! Querying the blog database: filters, listing requests, row extraction
//! and the memoized listing orchestrator.

mod extract;
mod filter;
mod index;
mod request;

pub use extract::{page_meta, parse_timestamp};
pub use filter::{
    CheckboxCondition, Combinator, Filter, MultiSelectCondition, PropertyCondition,
    PropertyFilter, TextCondition,
};
pub use index::{ContentIndex, Listing};
pub use request::{
    build_filter, DatabaseQuery, Direction, ListingRequest, Query, RawQuery, Sort, TimestampKind,
};
