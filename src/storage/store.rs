//! Redb-backed store implementation
//!
//! One embedded database carries the fixed rewrite/catalog tables plus the
//! ephemeral derived tables. The struct lives here together with the write
//! operations; trait implementations are split across `queries` (catalog
//! and finder/persist surfaces) and `derived` (ephemeral tables).

use crate::catalog::{Category, Product};
use crate::rewrite::{CategoryId, ProductId, UrlRewrite};
use crate::storage::config::StorageConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::tables::{
	self, CATEGORIES_TABLE, CATEGORY_PRODUCTS_TABLE, META_TABLE, PRODUCTS_TABLE,
	REWRITES_TABLE, REWRITE_LINKS_TABLE, REWRITE_SEQUENCE_KEY,
};
use redb::{Database, ReadableTable};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

/// A row of the rewrite to category/product link relation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteLink {
	pub url_rewrite_id: u64,
	pub category_id: CategoryId,
	pub product_id: ProductId,
}

/// Embedded store for rewrites, catalog structure and derived tables
pub struct RedbStore {
	pub(crate) database: Database,
	pub(crate) config: StorageConfig,
}

impl RedbStore {
	/// Open (or create) the store at the configured path
	pub fn open(config: StorageConfig) -> StorageResult<Self> {
		config
			.validate()
			.map_err(StorageError::InvalidConfiguration)?;

		if let Some(parent) = config.database_path.parent() {
			std::fs::create_dir_all(parent)?;
		}

		let database = Database::create(&config.database_path).map_err(|e| {
			StorageError::InitializationFailed(format!("Failed to create database: {}", e))
		})?;
		tables::initialize_tables(&database)?;

		info!("Opened rewrite store at {:?}", config.database_path);
		Ok(Self { database, config })
	}

	pub(crate) fn encode<T: Serialize>(value: &T) -> StorageResult<Vec<u8>> {
		Ok(bincode::serialize(value)?)
	}

	pub(crate) fn decode<T: DeserializeOwned>(data: &[u8]) -> StorageResult<T> {
		Ok(bincode::deserialize(data)?)
	}

	/// Insert or overwrite a category record
	pub fn put_category(&self, category: &Category) -> StorageResult<()> {
		let data = Self::encode(category)?;
		let write_txn = self.database.begin_write()?;
		{
			let mut table = write_txn.open_table(CATEGORIES_TABLE)?;
			table.insert(category.id, data.as_slice())?;
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Insert or overwrite a product record
	pub fn put_product(&self, product: &Product) -> StorageResult<()> {
		let data = Self::encode(product)?;
		let write_txn = self.database.begin_write()?;
		{
			let mut table = write_txn.open_table(PRODUCTS_TABLE)?;
			table.insert(product.id, data.as_slice())?;
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Assign a product to a category
	pub fn assign_product(
		&self,
		category_id: CategoryId,
		product_id: ProductId,
	) -> StorageResult<()> {
		let write_txn = self.database.begin_write()?;
		{
			let mut table = write_txn.open_multimap_table(CATEGORY_PRODUCTS_TABLE)?;
			table.insert(category_id, product_id)?;
		}
		write_txn.commit()?;
		Ok(())
	}

	/// Insert a rewrite row, returning its generated row id
	pub fn insert_rewrite(&self, rewrite: &UrlRewrite) -> StorageResult<u64> {
		let data = Self::encode(rewrite)?;
		let write_txn = self.database.begin_write()?;
		let row_id;
		{
			let mut meta = write_txn.open_table(META_TABLE)?;
			let sequence = meta
				.get(REWRITE_SEQUENCE_KEY)?
				.map(|guard| guard.value())
				.unwrap_or(0);
			row_id = sequence + 1;
			meta.insert(REWRITE_SEQUENCE_KEY, row_id)?;

			let mut rewrites = write_txn.open_table(REWRITES_TABLE)?;
			rewrites.insert(row_id, data.as_slice())?;
		}
		write_txn.commit()?;

		debug!(
			row_id,
			entity_id = rewrite.entity_id,
			"Stored rewrite for request path {}",
			rewrite.request_path
		);
		Ok(row_id)
	}

	/// Bulk-insert link rows, one transaction per chunk
	pub fn save_links_multiple(&self, links: &[RewriteLink]) -> StorageResult<usize> {
		let mut total = 0;
		for chunk in links.chunks(self.config.save_chunk_size) {
			let write_txn = self.database.begin_write()?;
			{
				let mut table = write_txn.open_table(REWRITE_LINKS_TABLE)?;
				for link in chunk {
					table.insert(link.url_rewrite_id, (link.category_id, link.product_id))?;
				}
			}
			write_txn.commit()?;
			total += chunk.len();
			debug!(written = total, "Saved rewrite link chunk");
		}
		Ok(total)
	}

	/// Remove link rows by rewrite id
	pub fn remove_links_multiple(&self, rewrite_ids: &[u64]) -> StorageResult<usize> {
		let mut removed = 0;
		let write_txn = self.database.begin_write()?;
		{
			let mut table = write_txn.open_table(REWRITE_LINKS_TABLE)?;
			for rewrite_id in rewrite_ids {
				if table.remove(*rewrite_id)?.is_some() {
					removed += 1;
				}
			}
		}
		write_txn.commit()?;
		Ok(removed)
	}

	/// Remove link rows matching a category and/or product id
	pub fn remove_links_by_filter(
		&self,
		category_id: Option<CategoryId>,
		product_id: Option<ProductId>,
	) -> StorageResult<usize> {
		let write_txn = self.database.begin_write()?;
		let mut removed = 0;
		{
			let mut table = write_txn.open_table(REWRITE_LINKS_TABLE)?;
			let mut to_remove = Vec::new();
			for item in table.iter()? {
				let (key, value) = item?;
				let (link_category, link_product) = value.value();
				let category_matches = category_id.map_or(true, |id| id == link_category);
				let product_matches = product_id.map_or(true, |id| id == link_product);
				if category_matches && product_matches {
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
			debug!(removed, "Removed rewrite links by filter");
		}
		Ok(removed)
	}

	/// Ids of all link rows, in key order
	pub fn link_ids(&self) -> StorageResult<Vec<u64>> {
		let read_txn = self.database.begin_read()?;
		let table = read_txn.open_table(REWRITE_LINKS_TABLE)?;
		let mut ids = Vec::new();
		for item in table.iter()? {
			let (key, _) = item?;
			ids.push(key.value());
		}
		Ok(ids)
	}
}
