//! Regeneration of existing rewrites
//!
//! For every rewrite currently stored for an entity, decide whether it must
//! be replaced, turned into a redirect, or left alone. Category and product
//! rewrites run through the same decision function; only path generation
//! and which fields a replacement carries over differ per entity type.

use crate::catalog::{Category, Product};
use crate::collector::RewriteCollector;
use crate::error::Result;
use crate::map::{CategoryRewrites, MapPool, ProductRewrites, UrlRewriteMap};
use crate::path::UrlPathGenerator;
use crate::rewrite::{
	CategoryId, EntityId, EntityType, RedirectType, RewriteFilter, StoreId, UrlRewrite,
};
use crate::storage::UrlFinder;
use std::sync::Arc;
use tracing::debug;

/// What a regeneration call targets
enum Target<'a> {
	Category(&'a Category),
	Product {
		product: &'a Product,
		category: Option<&'a Category>,
	},
}

impl Target<'_> {
	fn entity_type(&self) -> EntityType {
		match self {
			Target::Category(_) => EntityType::Category,
			Target::Product { .. } => EntityType::Product,
		}
	}

	fn entity_id(&self) -> EntityId {
		match self {
			Target::Category(category) => category.id,
			Target::Product { product, .. } => product.id,
		}
	}

	/// Product replacements carry the old row's description and metadata on
	/// every branch; category replacements only on the custom branch
	fn copies_history_fields(&self) -> bool {
		matches!(self, Target::Product { .. })
	}
}

/// Decides, per existing rewrite row, what the save must emit
pub struct CurrentUrlRewritesRegenerator {
	path_generator: Arc<dyn UrlPathGenerator>,
	url_finder: Arc<dyn UrlFinder>,
	map_pool: Arc<MapPool>,
	collector: Arc<RewriteCollector>,
}

impl CurrentUrlRewritesRegenerator {
	pub fn new(
		path_generator: Arc<dyn UrlPathGenerator>,
		url_finder: Arc<dyn UrlFinder>,
		map_pool: Arc<MapPool>,
		collector: Arc<RewriteCollector>,
	) -> Self {
		Self { path_generator, url_finder, map_pool, collector }
	}

	/// Regenerate the current rewrites of a category.
	///
	/// With `root_category_id` the rows come from the cached derived table
	/// of that scope; without it a direct finder query is used (the
	/// single-entity, non-bulk path).
	pub fn generate_for_category(
		&self,
		store_id: StoreId,
		category: &Category,
		root_category_id: Option<CategoryId>,
	) -> Result<Vec<UrlRewrite>> {
		self.generate(
			store_id,
			&Target::Category(category),
			root_category_id,
			category.save_rewrites_history,
		)
	}

	/// Regenerate the current rewrites of a product, optionally scoped
	/// under a category context. `save_history` is the history flag of the
	/// save that triggered regeneration.
	pub fn generate_for_product(
		&self,
		store_id: StoreId,
		product: &Product,
		category: Option<&Category>,
		root_category_id: Option<CategoryId>,
		save_history: bool,
	) -> Result<Vec<UrlRewrite>> {
		self.generate(
			store_id,
			&Target::Product { product, category },
			root_category_id,
			save_history,
		)
	}

	fn generate(
		&self,
		store_id: StoreId,
		target: &Target<'_>,
		root_category_id: Option<CategoryId>,
		save_history: bool,
	) -> Result<Vec<UrlRewrite>> {
		let current = self.current_rewrites(store_id, target, root_category_id)?;
		debug!(
			entity = %target.entity_type(),
			entity_id = target.entity_id(),
			current = current.len(),
			"Regenerating current rewrites"
		);

		for rewrite in &current {
			let emitted = if rewrite.is_autogenerated {
				self.regenerate_autogenerated(rewrite, store_id, target, save_history)?
			} else {
				self.regenerate_custom(rewrite, store_id, target)?
			};
			self.collector.add(emitted);
		}

		Ok(self.collector.get_reset_data())
	}

	fn current_rewrites(
		&self,
		store_id: StoreId,
		target: &Target<'_>,
		root_category_id: Option<CategoryId>,
	) -> Result<Vec<UrlRewrite>> {
		match root_category_id {
			Some(root) => match target.entity_type() {
				EntityType::Category => self
					.map_pool
					.get_map::<UrlRewriteMap<CategoryRewrites>>()?
					.get_by_identifiers(root, store_id, target.entity_id()),
				EntityType::Product => self
					.map_pool
					.get_map::<UrlRewriteMap<ProductRewrites>>()?
					.get_by_identifiers(root, store_id, target.entity_id()),
			},
			None => Ok(self.url_finder.find_all_by_data(
				&RewriteFilter::for_entity_in_store(
					target.entity_type(),
					target.entity_id(),
					store_id,
				),
			)?),
		}
	}

	/// An autogenerated path that is no longer canonical becomes a
	/// permanent redirect to the new canonical path, demoted to custom so
	/// later regenerations treat it as history
	fn regenerate_autogenerated(
		&self,
		old: &UrlRewrite,
		store_id: StoreId,
		target: &Target<'_>,
		save_history: bool,
	) -> Result<Vec<UrlRewrite>> {
		if !save_history {
			return Ok(Vec::new());
		}

		let target_path = self.canonical_path(target, store_id)?;
		if old.request_path == target_path {
			// Already canonical; emitting would create a self-redirect
			return Ok(Vec::new());
		}

		let mut replacement = UrlRewrite::new(
			target.entity_type(),
			target.entity_id(),
			store_id,
			old.request_path.clone(),
			target_path,
		)
		.with_redirect(RedirectType::Permanent);
		if target.copies_history_fields() {
			replacement.description = old.description.clone();
			replacement.metadata = old.metadata.clone();
		}
		Ok(vec![replacement])
	}

	/// A custom row that is already a redirect keeps pointing at its stored
	/// target; a direct custom mapping tracks the canonical path instead
	fn regenerate_custom(
		&self,
		old: &UrlRewrite,
		store_id: StoreId,
		target: &Target<'_>,
	) -> Result<Vec<UrlRewrite>> {
		let target_path = if old.redirect_type.is_redirect() {
			old.target_path.clone()
		} else {
			self.canonical_path(target, store_id)?
		};
		if old.request_path == target_path {
			return Ok(Vec::new());
		}

		let mut replacement = UrlRewrite::new(
			target.entity_type(),
			target.entity_id(),
			store_id,
			old.request_path.clone(),
			target_path,
		)
		.with_redirect(old.redirect_type);
		replacement.description = old.description.clone();
		replacement.metadata = old.metadata.clone();
		Ok(vec![replacement])
	}

	fn canonical_path(&self, target: &Target<'_>, store_id: StoreId) -> Result<String> {
		match target {
			Target::Category(category) => {
				self.path_generator.category_path_with_suffix(category, store_id)
			}
			Target::Product { product, category } => {
				self.path_generator
					.product_path_with_suffix(product, *category, store_id)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::RewriteError;
	use crate::rewrite::RewriteMetadata;
	use crate::storage::{StorageResult, UrlFinder};
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Mutex;

	struct StubFinder {
		rows: Mutex<Vec<UrlRewrite>>,
	}

	impl StubFinder {
		fn with(rows: Vec<UrlRewrite>) -> Arc<Self> {
			Arc::new(Self { rows: Mutex::new(rows) })
		}
	}

	impl UrlFinder for StubFinder {
		fn find_all_by_data(&self, filter: &RewriteFilter) -> StorageResult<Vec<UrlRewrite>> {
			Ok(self
				.rows
				.lock()
				.unwrap()
				.iter()
				.filter(|row| filter.matches(row))
				.cloned()
				.collect())
		}
	}

	/// Path generator returning a fixed path and counting invocations
	struct FixedPathGenerator {
		path: String,
		calls: AtomicUsize,
	}

	impl FixedPathGenerator {
		fn with(path: &str) -> Arc<Self> {
			Arc::new(Self { path: path.to_string(), calls: AtomicUsize::new(0) })
		}
	}

	impl UrlPathGenerator for FixedPathGenerator {
		fn category_path_with_suffix(
			&self,
			_category: &Category,
			_store_id: StoreId,
		) -> Result<String> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.path.clone())
		}

		fn product_path_with_suffix(
			&self,
			_product: &Product,
			_category: Option<&Category>,
			_store_id: StoreId,
		) -> Result<String> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			Ok(self.path.clone())
		}
	}

	fn regenerator(
		finder: Arc<StubFinder>,
		paths: Arc<FixedPathGenerator>,
	) -> CurrentUrlRewritesRegenerator {
		CurrentUrlRewritesRegenerator::new(
			paths,
			finder,
			Arc::new(MapPool::builder().build()),
			Arc::new(RewriteCollector::new()),
		)
	}

	fn history_category() -> Category {
		Category::new(3, 1, "1/3", "shoes").with_history(true)
	}

	#[test]
	fn test_autogenerated_becomes_permanent_redirect() {
		let old = UrlRewrite::new(EntityType::Category, 3, 1, "old.html", "old.html")
			.autogenerated();
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("new.html");
		let regenerator = regenerator(finder, paths);

		let batch = regenerator
			.generate_for_category(1, &history_category(), None)
			.unwrap();
		assert_eq!(batch.len(), 1);
		assert_eq!(batch[0].request_path, "old.html");
		assert_eq!(batch[0].target_path, "new.html");
		assert_eq!(batch[0].redirect_type, RedirectType::Permanent);
		assert!(!batch[0].is_autogenerated);
		// Category replacements do not inherit description/metadata
		assert_eq!(batch[0].description, None);
		assert!(batch[0].metadata.is_empty());
	}

	#[test]
	fn test_history_disabled_suppresses_regeneration() {
		let old = UrlRewrite::new(EntityType::Category, 3, 1, "old.html", "old.html")
			.autogenerated();
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("new.html");
		let regenerator = regenerator(finder, paths);

		let category = history_category().with_history(false);
		assert!(regenerator
			.generate_for_category(1, &category, None)
			.unwrap()
			.is_empty());
	}

	#[test]
	fn test_idempotence_when_path_is_canonical() {
		let old = UrlRewrite::new(EntityType::Category, 3, 1, "same.html", "same.html")
			.autogenerated();
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("same.html");
		let regenerator = regenerator(finder, paths);

		assert!(regenerator
			.generate_for_category(1, &history_category(), None)
			.unwrap()
			.is_empty());
	}

	#[test]
	fn test_custom_with_redirect_keeps_stored_target() {
		let old = UrlRewrite::new(EntityType::Category, 3, 1, "old.html", "custom-target.html")
			.with_redirect(RedirectType::Permanent)
			.with_description("kept");
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("canonical.html");
		let regenerator = regenerator(finder, Arc::clone(&paths));

		let batch = regenerator
			.generate_for_category(1, &history_category(), None)
			.unwrap();
		assert_eq!(batch.len(), 1);
		assert_eq!(batch[0].target_path, "custom-target.html");
		assert_eq!(batch[0].redirect_type, RedirectType::Permanent);
		assert_eq!(batch[0].description.as_deref(), Some("kept"));
		// The canonical path generator is never invoked on this branch
		assert_eq!(paths.calls.load(Ordering::SeqCst), 0);
	}

	#[test]
	fn test_custom_without_redirect_tracks_canonical_path() {
		let mut metadata = RewriteMetadata::new();
		metadata.insert("category_id".to_string(), "3".to_string());
		let old = UrlRewrite::new(EntityType::Product, 10, 1, "old.html", "stale.html")
			.with_metadata(metadata.clone());
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("canonical.html");
		let regenerator = regenerator(finder, paths);

		let product = Product::new(10, "sneaker");
		let batch = regenerator
			.generate_for_product(1, &product, None, None, true)
			.unwrap();
		assert_eq!(batch.len(), 1);
		assert_eq!(batch[0].target_path, "canonical.html");
		assert_eq!(batch[0].redirect_type, RedirectType::None);
		assert_eq!(batch[0].metadata, metadata);
	}

	#[test]
	fn test_custom_direct_mapping_already_canonical_emits_nothing() {
		let old = UrlRewrite::new(EntityType::Category, 3, 1, "same.html", "anything.html");
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("same.html");
		let regenerator = regenerator(finder, paths);

		assert!(regenerator
			.generate_for_category(1, &history_category(), None)
			.unwrap()
			.is_empty());
	}

	#[test]
	fn test_product_autogenerated_copies_history_fields() {
		let mut metadata = RewriteMetadata::new();
		metadata.insert("category_id".to_string(), "3".to_string());
		let old = UrlRewrite::new(EntityType::Product, 10, 1, "old.html", "old.html")
			.autogenerated()
			.with_description("imported")
			.with_metadata(metadata.clone());
		let finder = StubFinder::with(vec![old]);
		let paths = FixedPathGenerator::with("new.html");
		let regenerator = regenerator(finder, paths);

		let product = Product::new(10, "sneaker");
		let batch = regenerator
			.generate_for_product(1, &product, None, None, true)
			.unwrap();
		assert_eq!(batch.len(), 1);
		assert_eq!(batch[0].redirect_type, RedirectType::Permanent);
		assert_eq!(batch[0].description.as_deref(), Some("imported"));
		assert_eq!(batch[0].metadata, metadata);
	}

	#[test]
	fn test_bulk_path_requires_registered_maps() {
		let finder = StubFinder::with(Vec::new());
		let paths = FixedPathGenerator::with("new.html");
		// The empty pool has no rewrite maps registered
		let regenerator = regenerator(finder, paths);

		let error = regenerator
			.generate_for_category(1, &history_category(), Some(1))
			.unwrap_err();
		assert!(matches!(error, RewriteError::UnregisteredMap { .. }));
	}
}
