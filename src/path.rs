//! Canonical url path generation
//!
//! The regeneration core only needs "the currently-correct path for this
//! entity in this store"; anything beyond that (naming rules, store
//! overrides) stays behind [`UrlPathGenerator`].

use crate::catalog::{Category, Product};
use crate::error::{Result, RewriteError};
use crate::rewrite::StoreId;

/// Computes canonical target paths for catalog entities.
/// Implementations must be deterministic for a given entity and store.
pub trait UrlPathGenerator: Send + Sync {
	fn category_path_with_suffix(&self, category: &Category, store_id: StoreId) -> Result<String>;

	/// Canonical product path, scoped under `category` when present
	fn product_path_with_suffix(
		&self,
		product: &Product,
		category: Option<&Category>,
		store_id: StoreId,
	) -> Result<String>;
}

/// Path generator appending a configured suffix to the entity's url path
/// (falling back to its url key)
pub struct SuffixPathGenerator {
	suffix: String,
}

impl SuffixPathGenerator {
	pub fn new(suffix: impl Into<String>) -> Self {
		Self { suffix: suffix.into() }
	}

	/// The conventional ".html" suffix
	pub fn html() -> Self {
		Self::new(".html")
	}

	fn category_base<'a>(&self, category: &'a Category) -> Result<&'a str> {
		let base = category.url_path.as_deref().unwrap_or(&category.url_key);
		if base.is_empty() {
			return Err(RewriteError::PathGeneration {
				entity: "category",
				id: category.id,
				reason: "url key is empty".to_string(),
			});
		}
		Ok(base)
	}
}

impl UrlPathGenerator for SuffixPathGenerator {
	fn category_path_with_suffix(
		&self,
		category: &Category,
		_store_id: StoreId,
	) -> Result<String> {
		Ok(format!("{}{}", self.category_base(category)?, self.suffix))
	}

	fn product_path_with_suffix(
		&self,
		product: &Product,
		category: Option<&Category>,
		_store_id: StoreId,
	) -> Result<String> {
		let base = product.url_path.as_deref().unwrap_or(&product.url_key);
		if base.is_empty() {
			return Err(RewriteError::PathGeneration {
				entity: "product",
				id: product.id,
				reason: "url key is empty".to_string(),
			});
		}
		match category {
			Some(category) => {
				Ok(format!("{}/{}{}", self.category_base(category)?, base, self.suffix))
			}
			None => Ok(format!("{}{}", base, self.suffix)),
		}
	}
}
