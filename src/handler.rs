//! Orchestration of rewrite regeneration for a saved category
//!
//! Walks the saved category and its descendants, regenerates the rewrites
//! of every affected product through the shared collector, and fans out
//! deletions when a subtree goes away.

use crate::catalog::Category;
use crate::collector::RewriteCollector;
use crate::error::Result;
use crate::regenerator::CurrentUrlRewritesRegenerator;
use crate::rewrite::{CategoryId, EntityType, ProductId, RewriteFilter, StoreId, UrlRewrite};
use crate::storage::{CatalogSource, UrlPersist};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Regenerates and deletes rewrites in response to category saves
pub struct UrlRewriteHandler {
	catalog: Arc<dyn CatalogSource>,
	regenerator: Arc<CurrentUrlRewritesRegenerator>,
	url_persist: Arc<dyn UrlPersist>,
	collector: Arc<RewriteCollector>,
}

impl UrlRewriteHandler {
	pub fn new(
		catalog: Arc<dyn CatalogSource>,
		regenerator: Arc<CurrentUrlRewritesRegenerator>,
		url_persist: Arc<dyn UrlPersist>,
		collector: Arc<RewriteCollector>,
	) -> Self {
		Self { catalog, regenerator, url_persist, collector }
	}

	/// Regenerate rewrites for the products affected by a category save.
	///
	/// A targeted update (explicit affected-product list) regenerates only
	/// those products against this category. A full save walks every
	/// product assigned to the category, then each descendant category's
	/// products; a product assigned to several categories in the subtree is
	/// processed once.
	pub fn generate_product_url_rewrites(&self, category: &Category) -> Result<Vec<UrlRewrite>> {
		let mut processed: HashSet<ProductId> = HashSet::new();
		let save_history = category.save_rewrites_history;
		let store_id = category.store_id;

		if let Some(affected) = category.targeted_product_ids() {
			processed.extend(affected.iter().copied());
			for product in self.catalog.products_by_ids(affected)? {
				let batch = self.regenerator.generate_for_product(
					store_id,
					&product,
					Some(category),
					Some(category.id),
					save_history,
				)?;
				self.collector.add(batch);
			}
			let batch = self.collector.get_reset_data();
			debug!(
				category = category.id,
				rewrites = batch.len(),
				"Generated rewrites for targeted product update"
			);
			return Ok(batch);
		}

		self.category_products_rewrites(
			category,
			store_id,
			save_history,
			category.id,
			&mut processed,
		)?;
		for child in self.catalog.child_categories(category.id)? {
			self.category_products_rewrites(
				&child,
				store_id,
				save_history,
				category.id,
				&mut processed,
			)?;
		}

		let batch = self.collector.get_reset_data();
		debug!(
			category = category.id,
			products = processed.len(),
			rewrites = batch.len(),
			"Generated product url rewrites"
		);
		Ok(batch)
	}

	fn category_products_rewrites(
		&self,
		category: &Category,
		store_id: StoreId,
		save_history: bool,
		root_category_id: CategoryId,
		processed: &mut HashSet<ProductId>,
	) -> Result<()> {
		for product in self.catalog.products_in_category(category.id)? {
			// Descendant traversal revisits products assigned to several
			// categories
			if !processed.insert(product.id) {
				continue;
			}
			let batch = self.regenerator.generate_for_product(
				store_id,
				&product,
				Some(category),
				Some(root_category_id),
				save_history,
			)?;
			self.collector.add(batch);
		}
		Ok(())
	}

	/// Delete the category-level and category-scoped product rewrites of a
	/// category and all of its descendants. Two deletions are issued per
	/// category id; returns the total number of rows removed.
	pub fn delete_category_rewrites_for_children(&self, category: &Category) -> Result<usize> {
		let mut category_ids = self.catalog.category_subtree_ids(category.id)?;
		if !category_ids.contains(&category.id) {
			category_ids.push(category.id);
		}

		let mut deleted = 0;
		for category_id in category_ids {
			deleted += self
				.url_persist
				.delete_by_data(&RewriteFilter::for_entity(EntityType::Category, category_id))?;
			deleted += self
				.url_persist
				.delete_by_data(&RewriteFilter::for_category_products(category_id))?;
		}

		info!(category = category.id, deleted, "Deleted rewrites for category subtree");
		Ok(deleted)
	}
}
