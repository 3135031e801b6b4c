//! Category subtree map

use crate::error::Result;
use crate::map::DataMap;
use crate::rewrite::CategoryId;
use crate::storage::CatalogSource;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Ids of a root category plus all of its descendants, computed once per
/// scope key via the catalog's path-prefix query
pub struct CategoryMap {
	catalog: Arc<dyn CatalogSource>,
	cache: Mutex<HashMap<CategoryId, Arc<Vec<CategoryId>>>>,
}

impl CategoryMap {
	pub fn new(catalog: Arc<dyn CatalogSource>) -> Self {
		Self { catalog, cache: Mutex::new(HashMap::new()) }
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<CategoryId, Arc<Vec<CategoryId>>>> {
		self.cache
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

impl DataMap for CategoryMap {
	type Value = Arc<Vec<CategoryId>>;

	fn get(&self, scope: CategoryId) -> Result<Arc<Vec<CategoryId>>> {
		let mut cache = self.lock();
		if let Some(ids) = cache.get(&scope) {
			return Ok(Arc::clone(ids));
		}

		let ids = Arc::new(self.catalog.category_subtree_ids(scope)?);
		debug!(scope, count = ids.len(), "Computed category subtree map");
		cache.insert(scope, Arc::clone(&ids));
		Ok(ids)
	}

	fn reset(&self, scope: CategoryId) -> Result<()> {
		self.lock().remove(&scope);
		Ok(())
	}
}
