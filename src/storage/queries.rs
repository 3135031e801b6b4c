//! Catalog, finder and persistence query surfaces of [`RedbStore`]
//!
//! Point queries scan and filter the fixed tables; the bulk path avoids
//! repeated scans by materializing derived tables instead (see `derived`).

use crate::catalog::{Category, Product};
use crate::rewrite::{CategoryId, ProductId, RewriteFilter, RewriteKey, UrlRewrite};
use crate::storage::store::RedbStore;
use crate::storage::tables::{
	CATEGORIES_TABLE, CATEGORY_PRODUCTS_TABLE, META_TABLE, PRODUCTS_TABLE, REWRITES_TABLE,
	REWRITE_LINKS_TABLE, REWRITE_SEQUENCE_KEY,
};
use crate::storage::{CatalogSource, StorageResult, UrlFinder, UrlPersist};
use redb::{ReadableMultimapTable, ReadableTable};
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

impl RedbStore {
	fn category_path(&self, id: CategoryId) -> StorageResult<Option<String>> {
		Ok(self.category(id)?.map(|category| category.path))
	}

	/// Decode every category whose materialized path sits under `root_path`
	fn categories_under(&self, root_path: &str) -> StorageResult<Vec<Category>> {
		let prefix = format!("{}/", root_path);
		let read_txn = self.database.begin_read()?;
		let table = read_txn.open_table(CATEGORIES_TABLE)?;
		let mut categories = Vec::new();
		for item in table.iter()? {
			let (_, value) = item?;
			let category: Category = Self::decode(value.value())?;
			if category.path.starts_with(&prefix) {
				categories.push(category);
			}
		}
		categories.sort_by_key(|category| category.id);
		Ok(categories)
	}
}

impl CatalogSource for RedbStore {
	fn category(&self, id: CategoryId) -> StorageResult<Option<Category>> {
		let read_txn = self.database.begin_read()?;
		let table = read_txn.open_table(CATEGORIES_TABLE)?;
		match table.get(id)? {
			Some(guard) => Ok(Some(Self::decode(guard.value())?)),
			None => Ok(None),
		}
	}

	fn category_subtree_ids(&self, root: CategoryId) -> StorageResult<Vec<CategoryId>> {
		let Some(root_path) = self.category_path(root)? else {
			return Ok(Vec::new());
		};
		let mut ids = vec![root];
		ids.extend(
			self.categories_under(&root_path)?
				.into_iter()
				.map(|category| category.id),
		);
		Ok(ids)
	}

	fn child_categories(&self, root: CategoryId) -> StorageResult<Vec<Category>> {
		let Some(root_path) = self.category_path(root)? else {
			return Ok(Vec::new());
		};
		self.categories_under(&root_path)
	}

	fn products_by_ids(&self, ids: &[ProductId]) -> StorageResult<Vec<Product>> {
		let read_txn = self.database.begin_read()?;
		let table = read_txn.open_table(PRODUCTS_TABLE)?;
		let mut products = Vec::new();
		for id in ids {
			if let Some(guard) = table.get(*id)? {
				products.push(Self::decode(guard.value())?);
			}
		}
		Ok(products)
	}

	fn products_in_category(&self, id: CategoryId) -> StorageResult<Vec<Product>> {
		let mut product_ids = Vec::new();
		{
			let read_txn = self.database.begin_read()?;
			let assignments = read_txn.open_multimap_table(CATEGORY_PRODUCTS_TABLE)?;
			for entry in assignments.get(id)? {
				product_ids.push(entry?.value());
			}
		}
		product_ids.sort_unstable();
		self.products_by_ids(&product_ids)
	}

	fn product_ids_assigned_to_categories(
		&self,
		ids: &[CategoryId],
	) -> StorageResult<Vec<ProductId>> {
		let read_txn = self.database.begin_read()?;
		let assignments = read_txn.open_multimap_table(CATEGORY_PRODUCTS_TABLE)?;
		// Grouped into a set so products assigned to several of the
		// categories come out once
		let mut product_ids = BTreeSet::new();
		for category_id in ids {
			for entry in assignments.get(*category_id)? {
				product_ids.insert(entry?.value());
			}
		}
		Ok(product_ids.into_iter().collect())
	}

	fn product_ids_linked_to_categories(
		&self,
		ids: &[CategoryId],
	) -> StorageResult<Vec<ProductId>> {
		let wanted: HashSet<CategoryId> = ids.iter().copied().collect();
		let read_txn = self.database.begin_read()?;
		let links = read_txn.open_table(REWRITE_LINKS_TABLE)?;
		let mut product_ids = BTreeSet::new();
		for item in links.iter()? {
			let (_, value) = item?;
			let (category_id, product_id) = value.value();
			if wanted.contains(&category_id) {
				product_ids.insert(product_id);
			}
		}
		Ok(product_ids.into_iter().collect())
	}
}

impl UrlFinder for RedbStore {
	fn find_all_by_data(&self, filter: &RewriteFilter) -> StorageResult<Vec<UrlRewrite>> {
		let read_txn = self.database.begin_read()?;
		let table = read_txn.open_table(REWRITES_TABLE)?;
		let mut matching = Vec::new();
		for item in table.iter()? {
			let (_, value) = item?;
			let rewrite: UrlRewrite = Self::decode(value.value())?;
			if filter.matches(&rewrite) {
				matching.push(rewrite);
			}
		}

		debug!(found = matching.len(), "Finder query against rewrite table");
		Ok(matching)
	}
}

impl UrlPersist for RedbStore {
	fn replace(&self, rewrites: &[UrlRewrite]) -> StorageResult<usize> {
		let mut total = 0;
		for chunk in rewrites.chunks(self.config.save_chunk_size) {
			let incoming: HashSet<RewriteKey> =
				chunk.iter().map(|rewrite| rewrite.key()).collect();

			let write_txn = self.database.begin_write()?;
			{
				let mut table = write_txn.open_table(REWRITES_TABLE)?;

				// Rows sharing an identity with the incoming batch give way
				let mut stale = Vec::new();
				for item in table.iter()? {
					let (key, value) = item?;
					let row: UrlRewrite = Self::decode(value.value())?;
					if incoming.contains(&row.key()) {
						stale.push(key.value());
					}
				}
				for key in stale {
					table.remove(key)?;
				}

				let mut meta = write_txn.open_table(META_TABLE)?;
				let mut sequence = meta
					.get(REWRITE_SEQUENCE_KEY)?
					.map(|guard| guard.value())
					.unwrap_or(0);
				for rewrite in chunk {
					sequence += 1;
					let data = Self::encode(rewrite)?;
					table.insert(sequence, data.as_slice())?;
				}
				meta.insert(REWRITE_SEQUENCE_KEY, sequence)?;
			}
			write_txn.commit()?;
			total += chunk.len();
		}

		debug!(written = total, "Replaced rewrite batch");
		Ok(total)
	}

	fn delete_by_data(&self, filter: &RewriteFilter) -> StorageResult<usize> {
		let write_txn = self.database.begin_write()?;
		let mut removed = 0;
		{
			let mut table = write_txn.open_table(REWRITES_TABLE)?;
			let mut to_remove = Vec::new();
			for item in table.iter()? {
				let (key, value) = item?;
				let rewrite: UrlRewrite = Self::decode(value.value())?;
				if filter.matches(&rewrite) {
					to_remove.push(key.value());
				}
			}
			for key in to_remove {
				table.remove(key)?;
				removed += 1;
			}
		}
		write_txn.commit()?;

		if removed > 0 {
			debug!(removed, "Deleted rewrites by criteria");
		}
		Ok(removed)
	}
}
