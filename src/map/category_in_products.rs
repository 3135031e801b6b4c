//! Map of products holding rewrite links into a category subtree

use crate::error::Result;
use crate::map::{CategoryMap, DataMap};
use crate::rewrite::{CategoryId, ProductId};
use crate::storage::CatalogSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Ids of products whose category assignment includes any id from the
/// subtree map, read from the rewrite link relation. Depends on
/// [`CategoryMap`].
pub struct CategoryUsedInProductsMap {
	catalog: Arc<dyn CatalogSource>,
	categories: Arc<CategoryMap>,
	cache: Mutex<HashMap<CategoryId, Arc<Vec<ProductId>>>>,
}

impl CategoryUsedInProductsMap {
	pub fn new(catalog: Arc<dyn CatalogSource>, categories: Arc<CategoryMap>) -> Self {
		Self { catalog, categories, cache: Mutex::new(HashMap::new()) }
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<CategoryId, Arc<Vec<ProductId>>>> {
		self.cache
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl DataMap for CategoryUsedInProductsMap {
	type Value = Arc<Vec<ProductId>>;

	fn get(&self, scope: CategoryId) -> Result<Arc<Vec<ProductId>>> {
		let mut cache = self.lock();
		if let Some(ids) = cache.get(&scope) {
			return Ok(Arc::clone(ids));
		}

		let category_ids = self.categories.get(scope)?;
		let ids = Arc::new(self.catalog.product_ids_linked_to_categories(&category_ids)?);
		debug!(scope, count = ids.len(), "Computed products-with-rewrite-links map");
		cache.insert(scope, Arc::clone(&ids));
		Ok(ids)
	}

	fn reset(&self, scope: CategoryId) -> Result<()> {
		self.categories.reset(scope)?;
		self.lock().remove(&scope);
		Ok(())
	}
}
