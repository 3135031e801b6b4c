//! Derived-table-backed rewrite maps
//!
//! The rewrite rows relevant to one regeneration operation are selected
//! once into an ephemeral indexed table; subsequent per-entity lookups are
//! point reads against its `hash_key` index instead of repeated scans.

use crate::error::Result;
use crate::map::{CategoryMap, CategoryUsedInProductsMap, DataMap};
use crate::rewrite::{CategoryId, EntityId, EntityType, StoreId, UrlRewrite};
use crate::storage::DerivedTableStore;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Entity type marker of a [`UrlRewriteMap`] instance.
/// Each marker gives the map its own identity in the pool.
pub trait RewriteEntityKind: Send + Sync + 'static {
	const ENTITY: EntityType;
}

/// Marker for the map over category rewrite rows
pub enum CategoryRewrites {}

/// Marker for the map over product rewrite rows
pub enum ProductRewrites {}

impl RewriteEntityKind for CategoryRewrites {
	const ENTITY: EntityType = EntityType::Category;
}

impl RewriteEntityKind for ProductRewrites {
	const ENTITY: EntityType = EntityType::Product;
}

/// Rewrite rows of one entity type whose entity id falls inside the scope's
/// id union (products with rewrite links plus subtree categories),
/// materialized as an ephemeral indexed table. Depends on
/// [`CategoryUsedInProductsMap`] and [`CategoryMap`].
pub struct UrlRewriteMap<K: RewriteEntityKind> {
	tables: Arc<dyn DerivedTableStore>,
	used_in_products: Arc<CategoryUsedInProductsMap>,
	categories: Arc<CategoryMap>,
	table_names: Mutex<HashMap<CategoryId, String>>,
	_kind: PhantomData<K>,
}

impl<K: RewriteEntityKind> UrlRewriteMap<K> {
	pub fn new(
		tables: Arc<dyn DerivedTableStore>,
		used_in_products: Arc<CategoryUsedInProductsMap>,
		categories: Arc<CategoryMap>,
	) -> Self {
		Self {
			tables,
			used_in_products,
			categories,
			table_names: Mutex::new(HashMap::new()),
			_kind: PhantomData,
		}
	}

	/// Every row for the scope, materializing the table on first access
	pub fn get_all(&self, scope: CategoryId) -> Result<Vec<UrlRewrite>> {
		let table = self.ensure_table(scope)?;
		Ok(self.tables.fetch_all(&table)?)
	}

	/// Rows matching `key` through the hash index; an empty key returns all
	/// rows for the scope
	pub fn get_data(&self, scope: CategoryId, key: &str) -> Result<Vec<UrlRewrite>> {
		if key.is_empty() {
			return self.get_all(scope);
		}
		let table = self.ensure_table(scope)?;
		Ok(self.tables.fetch_by_hash_key(&table, key)?)
	}

	/// Current rows of one entity in one store
	pub fn get_by_identifiers(
		&self,
		scope: CategoryId,
		store_id: StoreId,
		entity_id: EntityId,
	) -> Result<Vec<UrlRewrite>> {
		self.get_data(scope, &format!("{}_{}", store_id, entity_id))
	}

	/// Name of the materialized table for `scope`, if populated
	pub fn table_name(&self, scope: CategoryId) -> Option<String> {
		self.lock().get(&scope).cloned()
	}

	fn ensure_table(&self, scope: CategoryId) -> Result<String> {
		let mut names = self.lock();
		if let Some(name) = names.get(&scope) {
			return Ok(name.clone());
		}

		let mut entity_ids: Vec<EntityId> = self.used_in_products.get(scope)?.to_vec();
		entity_ids.extend(self.categories.get(scope)?.iter().copied());
		entity_ids.sort_unstable();
		entity_ids.dedup();

		let name = self.tables.materialize_rewrites(K::ENTITY, &entity_ids)?;
		debug!(scope, table = %name, entity = %K::ENTITY, "Populated url rewrite map");
		names.insert(scope, name.clone());
		Ok(name)
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<CategoryId, String>> {
		self.table_names
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl<K: RewriteEntityKind> DataMap for UrlRewriteMap<K> {
	type Value = Vec<UrlRewrite>;

	fn get(&self, scope: CategoryId) -> Result<Vec<UrlRewrite>> {
		self.get_all(scope)
	}

	fn reset(&self, scope: CategoryId) -> Result<()> {
		self.used_in_products.reset(scope)?;
		self.categories.reset(scope)?;

		let mut names = self.lock();
		if let Some(table) = names.remove(&scope) {
			self.tables.drop_derived_table(&table)?;
			debug!(scope, table = %table, "Reset url rewrite map");
		}
		// Map-level bookkeeping is released only once no scope remains
		if names.is_empty() {
			names.shrink_to_fit();
		}
		Ok(())
	}
}
