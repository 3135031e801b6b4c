//! Url rewrite regeneration for catalog categories and products
//!
//! When a category is saved or its product assignments change, the rewrite
//! rows currently stored for the affected entities must be recomputed:
//! stale autogenerated paths become permanent redirects to the new
//! canonical path, custom rows track entity moves, and removed subtrees
//! have their rewrites deleted.
//!
//! The crate is organized around three pieces:
//! - a pool of request-scoped [`map`]s that compute the affected id sets
//!   once per operation, backing the large ones with ephemeral indexed
//!   tables,
//! - the [`regenerator`] deciding per existing rewrite what to emit,
//! - the [`handler`] walking the category tree and collecting the final
//!   deduplicated batch for bulk persistence.

pub mod catalog;
pub mod collector;
pub mod error;
pub mod handler;
pub mod map;
pub mod path;
pub mod regenerator;
pub mod rewrite;
pub mod storage;

pub use catalog::{Category, Product};
pub use collector::RewriteCollector;
pub use error::{Result, RewriteError};
pub use handler::UrlRewriteHandler;
pub use map::{
	CategoryMap, CategoryRewrites, CategoryUsedInProductsMap, DataMap, MapPool, OperationScope,
	ProductMap, ProductRewrites, UrlRewriteMap,
};
pub use path::{SuffixPathGenerator, UrlPathGenerator};
pub use regenerator::CurrentUrlRewritesRegenerator;
pub use rewrite::{
	EntityType, RedirectType, RewriteFilter, RewriteKey, RewriteMetadata, UrlRewrite,
};
pub use storage::{
	CatalogSource, DerivedTableStore, RedbStore, StorageConfig, StorageError, UrlFinder,
	UrlPersist,
};
