//! Request-scoped data maps
//!
//! Each map lazily computes a result set keyed by a root category (the
//! scope key) and memoizes it until reset. Maps may depend on other maps,
//! forming a DAG; resetting a map cascades to its dependencies for the same
//! scope key. The [`MapPool`] owns the single live instance of every map
//! type for the current unit of work.

mod category_in_products;
mod category_map;
mod pool;
mod product_map;
mod url_rewrite_map;

pub use category_in_products::CategoryUsedInProductsMap;
pub use category_map::CategoryMap;
pub use pool::{MapPool, MapPoolBuilder, OperationScope};
pub use product_map::ProductMap;
pub use url_rewrite_map::{CategoryRewrites, ProductRewrites, RewriteEntityKind, UrlRewriteMap};

use crate::error::Result;
use crate::rewrite::CategoryId;

/// A lazily-computed lookup table scoped by root category
///
/// The result is computed at most once per scope key until `reset`; `reset`
/// must cascade to the map's dependency maps for the same scope key and is
/// a no-op for an unpopulated key.
pub trait DataMap: Send + Sync + 'static {
	type Value;

	fn get(&self, scope: CategoryId) -> Result<Self::Value>;

	fn reset(&self, scope: CategoryId) -> Result<()>;
}
