//! Storage collaborators for rewrite regeneration
//!
//! The core consumes storage through the narrow traits defined here; the
//! shipped implementation is [`RedbStore`], an embedded redb database that
//! also materializes the ephemeral derived tables behind the data maps.

pub mod config;
pub mod derived;
pub mod error;
pub mod queries;
pub mod store;
pub mod tables;

pub use config::StorageConfig;
pub use error::{StorageError, StorageResult};
pub use store::{RedbStore, RewriteLink};

use crate::catalog::{Category, Product};
use crate::rewrite::{CategoryId, EntityId, EntityType, ProductId, RewriteFilter, UrlRewrite};

/// Point-query access to stored rewrites, no caching
pub trait UrlFinder: Send + Sync {
	fn find_all_by_data(&self, filter: &RewriteFilter) -> StorageResult<Vec<UrlRewrite>>;
}

/// Bulk persistence of rewrites
pub trait UrlPersist: Send + Sync {
	/// Save a batch, overwriting rows with the same rewrite identity.
	/// Returns the number of rows written.
	fn replace(&self, rewrites: &[UrlRewrite]) -> StorageResult<usize>;

	/// Delete every rewrite matching the criteria. Returns the number of
	/// rows removed.
	fn delete_by_data(&self, filter: &RewriteFilter) -> StorageResult<usize>;
}

/// Read access to the catalog structure
pub trait CatalogSource: Send + Sync {
	fn category(&self, id: CategoryId) -> StorageResult<Option<Category>>;

	/// Ids of the category plus all of its descendants, via path-prefix
	/// match on the materialized tree path
	fn category_subtree_ids(&self, root: CategoryId) -> StorageResult<Vec<CategoryId>>;

	/// Descendant categories of `root`, excluding `root` itself
	fn child_categories(&self, root: CategoryId) -> StorageResult<Vec<Category>>;

	/// Products by id, preserving input order and skipping unknown ids
	fn products_by_ids(&self, ids: &[ProductId]) -> StorageResult<Vec<Product>>;

	/// Products directly assigned to one category
	fn products_in_category(&self, id: CategoryId) -> StorageResult<Vec<Product>>;

	/// Deduplicated ids of products assigned to any of the categories
	fn product_ids_assigned_to_categories(
		&self,
		ids: &[CategoryId],
	) -> StorageResult<Vec<ProductId>>;

	/// Deduplicated ids of products holding a rewrite link into any of the
	/// categories
	fn product_ids_linked_to_categories(
		&self,
		ids: &[CategoryId],
	) -> StorageResult<Vec<ProductId>>;
}

/// Materialization surface for the ephemeral derived rewrite tables
pub trait DerivedTableStore: Send + Sync {
	/// Select rewrites of `entity_type` whose entity id is in `entity_ids`
	/// into a freshly named indexed table; returns the table name
	fn materialize_rewrites(
		&self,
		entity_type: EntityType,
		entity_ids: &[EntityId],
	) -> StorageResult<String>;

	fn fetch_all(&self, table: &str) -> StorageResult<Vec<UrlRewrite>>;

	/// Point lookup through the `hash_key` index ("{store_id}_{entity_id}")
	fn fetch_by_hash_key(&self, table: &str, hash_key: &str) -> StorageResult<Vec<UrlRewrite>>;

	/// Drop a derived table; dropping a table that no longer exists is a
	/// no-op
	fn drop_derived_table(&self, table: &str) -> StorageResult<()>;
}
