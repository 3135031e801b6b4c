//! Catalog entity records consumed by rewrite regeneration
//!
//! These are plain data records; attribute loading and the catalog's own
//! persistence are external concerns.

use crate::rewrite::{CategoryId, ProductId, StoreId};
use serde::{Deserialize, Serialize};

/// A catalog category as seen by the rewrite layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
	pub id: CategoryId,
	pub store_id: StoreId,

	/// Materialized tree path ("1/5/7"), ending in the category's own id.
	/// Descendants are found by prefix match on this path.
	pub path: String,

	pub url_key: String,

	/// Precomputed url path; falls back to `url_key` when absent
	pub url_path: Option<String>,

	/// Whether old autogenerated paths should be preserved as permanent
	/// redirects when the canonical path changes
	pub save_rewrites_history: bool,

	/// When set, a save only touched these product assignments and
	/// regeneration is restricted to them
	pub affected_product_ids: Option<Vec<ProductId>>,
}

impl Category {
	pub fn new(
		id: CategoryId,
		store_id: StoreId,
		path: impl Into<String>,
		url_key: impl Into<String>,
	) -> Self {
		Self {
			id,
			store_id,
			path: path.into(),
			url_key: url_key.into(),
			url_path: None,
			save_rewrites_history: false,
			affected_product_ids: None,
		}
	}

	pub fn with_history(mut self, save_rewrites_history: bool) -> Self {
		self.save_rewrites_history = save_rewrites_history;
		self
	}

	pub fn with_affected_products(mut self, product_ids: Vec<ProductId>) -> Self {
		self.affected_product_ids = Some(product_ids);
		self
	}

	/// The explicit affected-product list of a targeted update, or `None`
	/// when the save affects the whole category (an empty list counts as
	/// no list)
	pub fn targeted_product_ids(&self) -> Option<&[ProductId]> {
		self.affected_product_ids
			.as_deref()
			.filter(|ids| !ids.is_empty())
	}
}

/// A catalog product as seen by the rewrite layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
	pub id: ProductId,
	pub url_key: String,
	/// Precomputed url path; falls back to `url_key` when absent
	pub url_path: Option<String>,
}

impl Product {
	pub fn new(id: ProductId, url_key: impl Into<String>) -> Self {
		Self { id, url_key: url_key.into(), url_path: None }
	}
}
