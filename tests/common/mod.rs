//! Common test utilities for the catalog-rewriter library

#![allow(dead_code)]

use catalog_rewriter::storage::RewriteLink;
use catalog_rewriter::{
	Category, CurrentUrlRewritesRegenerator, EntityType, MapPool, Product, RedbStore,
	RewriteCollector, StorageConfig, SuffixPathGenerator, UrlRewrite, UrlRewriteHandler,
};
use std::sync::Arc;
use tempfile::TempDir;

/// Open a store on a fresh uniquely-named database file
pub fn setup_store() -> (Arc<RedbStore>, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let db_path = temp_dir
		.path()
		.join(format!("rewrites-{}.redb", uuid::Uuid::new_v4()));
	let store = RedbStore::open(StorageConfig::with_path(db_path)).expect("Failed to open store");
	(Arc::new(store), temp_dir)
}

/// Seed the standard catalog tree used across the integration tests:
///
/// ```text
/// 1 (root, "catalog")
/// ├── 3 ("shoes")   products 10, 11
/// │   └── 5 ("boots") products 11, 12
/// └── 4 ("hats")    product 13
/// ```
pub fn seed_catalog(store: &RedbStore) {
	let categories = [
		Category::new(1, 1, "1", "catalog"),
		Category::new(3, 1, "1/3", "shoes"),
		Category::new(4, 1, "1/4", "hats"),
		Category::new(5, 1, "1/3/5", "boots"),
	];
	for category in &categories {
		store.put_category(category).expect("put category");
	}

	let products = [
		Product::new(10, "sneaker"),
		Product::new(11, "sandal"),
		Product::new(12, "wader"),
		Product::new(13, "fedora"),
	];
	for product in &products {
		store.put_product(product).expect("put product");
	}

	for (category_id, product_id) in [(3, 10), (3, 11), (5, 11), (5, 12), (4, 13)] {
		store.assign_product(category_id, product_id).expect("assign product");
	}
}

/// Insert a rewrite row and its category link so the derived product map
/// can see the product
pub fn seed_product_rewrite(store: &RedbStore, rewrite: &UrlRewrite, category_id: u64) {
	assert_eq!(rewrite.entity_type, EntityType::Product);
	let row_id = store.insert_rewrite(rewrite).expect("insert rewrite");
	store
		.save_links_multiple(&[RewriteLink {
			url_rewrite_id: row_id,
			category_id,
			product_id: rewrite.entity_id,
		}])
		.expect("save link");
}

/// Wire the full regeneration stack over one store
pub fn setup_stack(store: &Arc<RedbStore>) -> (Arc<MapPool>, Arc<UrlRewriteHandler>) {
	let catalog = Arc::clone(store) as Arc<dyn catalog_rewriter::CatalogSource>;
	let tables = Arc::clone(store) as Arc<dyn catalog_rewriter::DerivedTableStore>;
	let finder = Arc::clone(store) as Arc<dyn catalog_rewriter::UrlFinder>;
	let persist = Arc::clone(store) as Arc<dyn catalog_rewriter::UrlPersist>;

	let pool = Arc::new(MapPool::standard(Arc::clone(&catalog), tables));
	let collector = Arc::new(RewriteCollector::new());
	let regenerator = Arc::new(CurrentUrlRewritesRegenerator::new(
		Arc::new(SuffixPathGenerator::html()),
		finder,
		Arc::clone(&pool),
		Arc::clone(&collector),
	));
	let handler = Arc::new(UrlRewriteHandler::new(
		catalog,
		regenerator,
		persist,
		collector,
	));
	(pool, handler)
}
