//! Ephemeral derived rewrite tables
//!
//! Bulk regeneration repeatedly point-reads the same slice of the rewrite
//! table. Instead of rescanning per lookup, the matching rows are selected
//! once into a throwaway table indexed by `hash_key` and by
//! `(entity_id, store_id)`. Table names carry a generated unique suffix so
//! concurrent operations in separate worker processes cannot collide, and
//! the owning operation drops the table deterministically on teardown.

use crate::rewrite::{EntityId, EntityType, UrlRewrite};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::store::RedbStore;
use crate::storage::tables::REWRITES_TABLE;
use crate::storage::DerivedTableStore;
use redb::{MultimapTableDefinition, ReadableMultimapTable, ReadableTable, TableDefinition};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

fn rows_definition(name: &str) -> TableDefinition<'_, u64, &'static [u8]> {
	TableDefinition::new(name)
}

fn hash_index_name(table: &str) -> String {
	format!("{}__hash", table)
}

fn entity_store_index_name(table: &str) -> String {
	format!("{}__entity_store", table)
}

fn missing(table: &str, error: redb::TableError) -> StorageError {
	match error {
		redb::TableError::TableDoesNotExist(_) => {
			StorageError::DerivedTableMissing(table.to_string())
		}
		other => other.into(),
	}
}

impl DerivedTableStore for RedbStore {
	fn materialize_rewrites(
		&self,
		entity_type: EntityType,
		entity_ids: &[EntityId],
	) -> StorageResult<String> {
		let wanted: HashSet<EntityId> = entity_ids.iter().copied().collect();
		let name = format!(
			"{}{}",
			self.config.derived_table_prefix,
			Uuid::new_v4().simple()
		);

		let write_txn = self.database.begin_write()?;
		let mut row_count = 0;
		{
			let source = write_txn.open_table(REWRITES_TABLE)?;
			let mut selected = Vec::new();
			for item in source.iter()? {
				let (key, value) = item?;
				let rewrite: UrlRewrite = Self::decode(value.value())?;
				if rewrite.entity_type == entity_type && wanted.contains(&rewrite.entity_id) {
					selected.push((key.value(), value.value().to_vec(), rewrite));
				}
			}

			let hash_name = hash_index_name(&name);
			let entity_store_name = entity_store_index_name(&name);
			let mut rows = write_txn.open_table(rows_definition(&name))?;
			let mut hash_index = write_txn
				.open_multimap_table(MultimapTableDefinition::<&str, u64>::new(&hash_name))?;
			let mut entity_store_index = write_txn.open_multimap_table(
				MultimapTableDefinition::<(u64, u32), u64>::new(&entity_store_name),
			)?;

			for (row_id, data, rewrite) in selected {
				rows.insert(row_id, data.as_slice())?;
				hash_index.insert(rewrite.hash_key().as_str(), row_id)?;
				entity_store_index.insert((rewrite.entity_id, rewrite.store_id), row_id)?;
				row_count += 1;
			}
		}
		write_txn.commit()?;

		info!(table = %name, rows = row_count, "Materialized derived rewrite table");
		Ok(name)
	}

	fn fetch_all(&self, table: &str) -> StorageResult<Vec<UrlRewrite>> {
		let read_txn = self.database.begin_read()?;
		let rows = read_txn
			.open_table(rows_definition(table))
			.map_err(|e| missing(table, e))?;
		let mut rewrites = Vec::new();
		for item in rows.iter()? {
			let (_, value) = item?;
			rewrites.push(Self::decode(value.value())?);
		}
		Ok(rewrites)
	}

	fn fetch_by_hash_key(&self, table: &str, hash_key: &str) -> StorageResult<Vec<UrlRewrite>> {
		let hash_name = hash_index_name(table);
		let read_txn = self.database.begin_read()?;
		let rows = read_txn
			.open_table(rows_definition(table))
			.map_err(|e| missing(table, e))?;
		let hash_index = read_txn
			.open_multimap_table(MultimapTableDefinition::<&str, u64>::new(&hash_name))
			.map_err(|e| missing(table, e))?;

		let mut rewrites = Vec::new();
		for entry in hash_index.get(hash_key)? {
			let row_id = entry?.value();
			if let Some(data) = rows.get(row_id)? {
				rewrites.push(Self::decode(data.value())?);
			}
		}

		debug!(table = %table, hash_key = %hash_key, found = rewrites.len(), "Derived table point lookup");
		Ok(rewrites)
	}

	fn drop_derived_table(&self, table: &str) -> StorageResult<()> {
		let hash_name = hash_index_name(table);
		let entity_store_name = entity_store_index_name(table);

		let write_txn = self.database.begin_write()?;
		// delete_table reports absence instead of failing, which keeps the
		// teardown path idempotent
		write_txn.delete_table(rows_definition(table))?;
		write_txn
			.delete_multimap_table(MultimapTableDefinition::<&str, u64>::new(&hash_name))?;
		write_txn.delete_multimap_table(MultimapTableDefinition::<(u64, u32), u64>::new(
			&entity_store_name,
		))?;
		write_txn.commit()?;

		info!(table = %table, "Dropped derived rewrite table");
		Ok(())
	}
}
