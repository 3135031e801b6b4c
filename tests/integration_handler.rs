//! Integration tests for the url rewrite handler
//!
//! Exercises the orchestrator against a real store:
//! - Full category save walks descendants, each product processed once
//! - Targeted updates only touch the affected products
//! - Deletion fans out two calls per subtree category id

mod common;

use catalog_rewriter::storage::StorageResult;
use catalog_rewriter::{
	CatalogSource, CurrentUrlRewritesRegenerator, EntityType, MapPool, RedirectType,
	RewriteCollector, RewriteFilter, SuffixPathGenerator, UrlFinder, UrlPersist,
	UrlRewrite, UrlRewriteHandler,
};
use common::{seed_catalog, seed_product_rewrite, setup_stack, setup_store};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn stale_product_rewrite(product_id: u64, request_path: &str) -> UrlRewrite {
	UrlRewrite::new(EntityType::Product, product_id, 1, request_path, request_path)
		.autogenerated()
}

#[test]
fn test_full_save_walks_descendants_once_per_product() {
	let (store, _temp_dir) = setup_store();
	seed_catalog(&store);
	seed_product_rewrite(&store, &stale_product_rewrite(10, "sneaker-old.html"), 3);
	seed_product_rewrite(&store, &stale_product_rewrite(11, "sandal-old.html"), 5);
	seed_product_rewrite(&store, &stale_product_rewrite(13, "fedora-old.html"), 4);

	let (_pool, handler) = setup_stack(&store);
	let root = store
		.category(1)
		.expect("category")
		.expect("category")
		.with_history(true);

	let batch = handler.generate_product_url_rewrites(&root).expect("generate");
	let by_request: HashMap<&str, &UrlRewrite> = batch
		.iter()
		.map(|rewrite| (rewrite.request_path.as_str(), rewrite))
		.collect();

	// Product 11 is assigned to categories 3 and 5 but was processed only
	// under category 3, the first to reach it
	assert_eq!(batch.len(), 3);
	assert_eq!(by_request["sneaker-old.html"].target_path, "shoes/sneaker.html");
	assert_eq!(by_request["sandal-old.html"].target_path, "shoes/sandal.html");
	assert_eq!(by_request["fedora-old.html"].target_path, "hats/fedora.html");
	assert!(batch
		.iter()
		.all(|rewrite| rewrite.redirect_type == RedirectType::Permanent));
	assert!(batch.iter().all(|rewrite| !rewrite.is_autogenerated));
}

#[test]
fn test_history_disabled_yields_empty_batch() {
	let (store, _temp_dir) = setup_store();
	seed_catalog(&store);
	seed_product_rewrite(&store, &stale_product_rewrite(10, "sneaker-old.html"), 3);

	let (_pool, handler) = setup_stack(&store);
	let root = store.category(1).expect("category").expect("category");

	assert!(handler.generate_product_url_rewrites(&root).expect("generate").is_empty());
}

#[test]
fn test_targeted_update_only_touches_affected_products() {
	let (store, _temp_dir) = setup_store();
	seed_catalog(&store);
	seed_product_rewrite(&store, &stale_product_rewrite(10, "sneaker-old.html"), 3);
	seed_product_rewrite(&store, &stale_product_rewrite(11, "sandal-old.html"), 3);

	let (_pool, handler) = setup_stack(&store);
	let category = store
		.category(3)
		.expect("category")
		.expect("category")
		.with_history(true)
		.with_affected_products(vec![10]);

	let batch = handler.generate_product_url_rewrites(&category).expect("generate");
	assert_eq!(batch.len(), 1);
	assert_eq!(batch[0].entity_id, 10);
	assert_eq!(batch[0].target_path, "shoes/sneaker.html");
}

/// Persistence wrapper counting deletion calls
struct CountingPersist {
	inner: Arc<dyn UrlPersist>,
	delete_calls: AtomicUsize,
}

impl CountingPersist {
	fn wrap(inner: Arc<dyn UrlPersist>) -> Arc<Self> {
		Arc::new(Self { inner, delete_calls: AtomicUsize::new(0) })
	}
}

impl UrlPersist for CountingPersist {
	fn replace(&self, rewrites: &[UrlRewrite]) -> StorageResult<usize> {
		self.inner.replace(rewrites)
	}

	fn delete_by_data(&self, filter: &RewriteFilter) -> StorageResult<usize> {
		self.delete_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.delete_by_data(filter)
	}
}

#[test]
fn test_deletion_fans_out_per_subtree_category() {
	let (store, _temp_dir) = setup_store();
	seed_catalog(&store);
	// A category rewrite for the subtree root and a category-scoped product
	// rewrite under its child
	store
		.insert_rewrite(
			&UrlRewrite::new(EntityType::Category, 3, 1, "shoes.html", "shoes.html")
				.autogenerated(),
		)
		.expect("insert");
	let mut scoped = stale_product_rewrite(12, "boots/wader.html");
	scoped
		.metadata
		.insert("category_id".to_string(), "5".to_string());
	store.insert_rewrite(&scoped).expect("insert");

	let catalog = Arc::clone(&store) as Arc<dyn CatalogSource>;
	let tables = Arc::clone(&store) as Arc<dyn catalog_rewriter::DerivedTableStore>;
	let finder = Arc::clone(&store) as Arc<dyn UrlFinder>;
	let persist = CountingPersist::wrap(Arc::clone(&store) as Arc<dyn UrlPersist>);

	let pool = Arc::new(MapPool::standard(Arc::clone(&catalog), tables));
	let collector = Arc::new(RewriteCollector::new());
	let regenerator = Arc::new(CurrentUrlRewritesRegenerator::new(
		Arc::new(SuffixPathGenerator::html()),
		finder,
		pool,
		Arc::clone(&collector),
	));
	let handler = UrlRewriteHandler::new(
		catalog,
		regenerator,
		Arc::clone(&persist) as Arc<dyn UrlPersist>,
		collector,
	);

	// Category 3 has one descendant (5): two deletions per id
	let category = store.category(3).expect("category").expect("category");
	let deleted = handler.delete_category_rewrites_for_children(&category).expect("delete");
	assert_eq!(persist.delete_calls.load(Ordering::SeqCst), 4);
	assert_eq!(deleted, 2);

	assert!(store
		.find_all_by_data(&RewriteFilter::for_entity(EntityType::Category, 3))
		.expect("find")
		.is_empty());
	assert!(store
		.find_all_by_data(&RewriteFilter::for_entity(EntityType::Product, 12))
		.expect("find")
		.is_empty());
}
