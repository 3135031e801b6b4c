//! Table definitions for the redb-backed store
//!
//! Fixed tables live here; ephemeral derived tables are created with
//! generated names at runtime (see `storage::derived`).

use crate::storage::error::StorageResult;
use redb::{Database, MultimapTableDefinition, TableDefinition};

/// Url rewrite rows (rewrite id -> bincode row)
pub const REWRITES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("url_rewrites");

/// Category records (category id -> bincode row)
pub const CATEGORIES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("categories");

/// Product records (product id -> bincode row)
pub const PRODUCTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("products");

/// Category to product assignment (category id -> [product ids])
pub const CATEGORY_PRODUCTS_TABLE: MultimapTableDefinition<u64, u64> =
	MultimapTableDefinition::new("category_products");

/// Rewrite to category/product link rows
/// (rewrite id -> (category id, product id))
pub const REWRITE_LINKS_TABLE: TableDefinition<u64, (u64, u64)> =
	TableDefinition::new("rewrite_product_categories");

/// Storage counters and bookkeeping
pub const META_TABLE: TableDefinition<&str, u64> = TableDefinition::new("storage_meta");

/// Key for the rewrite row sequence in META_TABLE.
/// Incremented transactionally on every rewrite insert.
pub const REWRITE_SEQUENCE_KEY: &str = "rewrite_sequence";

/// All fixed tables, for initialization
pub const FIXED_TABLES: &[&str] = &[
	"url_rewrites",
	"categories",
	"products",
	"category_products",
	"rewrite_product_categories",
	"storage_meta",
];

/// Initialize all fixed tables in a single transaction
pub fn initialize_tables(database: &Database) -> StorageResult<()> {
	let write_txn = database.begin_write()?;
	{
		let _rewrites = write_txn.open_table(REWRITES_TABLE)?;
		let _categories = write_txn.open_table(CATEGORIES_TABLE)?;
		let _products = write_txn.open_table(PRODUCTS_TABLE)?;
		let _assignments = write_txn.open_multimap_table(CATEGORY_PRODUCTS_TABLE)?;
		let _links = write_txn.open_table(REWRITE_LINKS_TABLE)?;
		let _meta = write_txn.open_table(META_TABLE)?;
	}
	write_txn.commit()?;
	Ok(())
}
