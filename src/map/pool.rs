//! Registry of data map instances
//!
//! The pool hands out the single live instance of a map type, building it
//! on first request from a registered closure. Builders receive the pool so
//! a dependent map can fetch its upstream maps and take them by
//! constructor; requesting a type that was never registered is a
//! configuration error, and re-entering a builder for a type that is
//! already being built reports the dependency cycle instead of hanging.

use crate::error::{Result, RewriteError};
use crate::map::{
	CategoryMap, CategoryRewrites, CategoryUsedInProductsMap, DataMap, ProductMap,
	ProductRewrites, UrlRewriteMap,
};
use crate::rewrite::CategoryId;
use crate::storage::{CatalogSource, DerivedTableStore};
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

type AnyMap = Arc<dyn Any + Send + Sync>;
type MapBuilder = Box<dyn FnOnce(&MapPool) -> Result<AnyMap> + Send>;

enum MapSlot {
	Ready(AnyMap),
	Deferred(MapBuilder),
	Building,
}

/// Pool owning one live instance per map type
pub struct MapPool {
	slots: Mutex<HashMap<TypeId, MapSlot>>,
}

/// Registers map builders before the pool goes live
#[derive(Default)]
pub struct MapPoolBuilder {
	slots: HashMap<TypeId, MapSlot>,
}

impl MapPoolBuilder {
	/// Register a deferred builder for map type `M`. The closure runs on the
	/// first `get_map::<M>()` and may request `M`'s dependency maps from the
	/// pool it receives.
	pub fn register<M, F>(mut self, build: F) -> Self
	where
		M: Any + Send + Sync,
		F: FnOnce(&MapPool) -> Result<M> + Send + 'static,
	{
		self.slots.insert(
			TypeId::of::<M>(),
			MapSlot::Deferred(Box::new(move |pool| Ok(Arc::new(build(pool)?) as AnyMap))),
		);
		self
	}

	pub fn build(self) -> MapPool {
		MapPool { slots: Mutex::new(self.slots) }
	}
}

impl MapPool {
	pub fn builder() -> MapPoolBuilder {
		MapPoolBuilder::default()
	}

	/// Pool wired with the standard map set: category subtree, products
	/// used in rewrites, assigned products, and the two derived rewrite
	/// tables
	pub fn standard(
		catalog: Arc<dyn CatalogSource>,
		tables: Arc<dyn DerivedTableStore>,
	) -> MapPool {
		Self::builder()
			.register({
				let catalog = Arc::clone(&catalog);
				move |_| Ok(CategoryMap::new(catalog))
			})
			.register({
				let catalog = Arc::clone(&catalog);
				move |pool: &MapPool| {
					Ok(CategoryUsedInProductsMap::new(catalog, pool.get_map::<CategoryMap>()?))
				}
			})
			.register({
				let catalog = Arc::clone(&catalog);
				move |pool: &MapPool| {
					Ok(ProductMap::new(catalog, pool.get_map::<CategoryMap>()?))
				}
			})
			.register({
				let tables = Arc::clone(&tables);
				move |pool: &MapPool| {
					Ok(UrlRewriteMap::<CategoryRewrites>::new(
						tables,
						pool.get_map::<CategoryUsedInProductsMap>()?,
						pool.get_map::<CategoryMap>()?,
					))
				}
			})
			.register({
				let tables = Arc::clone(&tables);
				move |pool: &MapPool| {
					Ok(UrlRewriteMap::<ProductRewrites>::new(
						tables,
						pool.get_map::<CategoryUsedInProductsMap>()?,
						pool.get_map::<CategoryMap>()?,
					))
				}
			})
			.build()
	}

	/// The live instance of map type `M`, built on first request
	pub fn get_map<M: Any + Send + Sync>(&self) -> Result<Arc<M>> {
		let type_id = TypeId::of::<M>();

		let builder = {
			let mut slots = self.lock();
			match slots.get_mut(&type_id) {
				None => {
					return Err(RewriteError::UnregisteredMap { map_type: type_name::<M>() })
				}
				Some(MapSlot::Ready(instance)) => {
					let instance = Arc::clone(instance);
					return Self::downcast::<M>(instance);
				}
				Some(MapSlot::Building) => {
					return Err(RewriteError::MapCycle { map_type: type_name::<M>() })
				}
				Some(slot) => match std::mem::replace(slot, MapSlot::Building) {
					MapSlot::Deferred(builder) => builder,
					// get_mut already ruled these out
					_ => return Err(RewriteError::MapCycle { map_type: type_name::<M>() }),
				},
			}
		};

		// Lock released while the builder runs so it can request its
		// dependency maps
		let built = builder(self)?;
		self.lock().insert(type_id, MapSlot::Ready(Arc::clone(&built)));
		Self::downcast::<M>(built)
	}

	/// Forward a reset to the map's own `reset`, cascading through its
	/// dependencies. A map that was never built has nothing to reset.
	pub fn reset_map<M>(&self, scope: CategoryId) -> Result<()>
	where
		M: DataMap + Any,
	{
		let existing = {
			let slots = self.lock();
			match slots.get(&TypeId::of::<M>()) {
				None => {
					return Err(RewriteError::UnregisteredMap { map_type: type_name::<M>() })
				}
				Some(MapSlot::Ready(instance)) => Some(Arc::clone(instance)),
				Some(_) => None,
			}
		};
		match existing {
			Some(instance) => Self::downcast::<M>(instance)?.reset(scope),
			None => Ok(()),
		}
	}

	/// Guard that tears down the rewrite maps for one scope key when the
	/// owning operation ends
	pub fn operation_scope(self: &Arc<Self>, root: CategoryId) -> OperationScope {
		OperationScope { pool: Arc::clone(self), root }
	}

	fn downcast<M: Any + Send + Sync>(instance: AnyMap) -> Result<Arc<M>> {
		instance
			.downcast::<M>()
			.map_err(|_| RewriteError::MapTypeMismatch { map_type: type_name::<M>() })
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, MapSlot>> {
		self.slots
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

/// Scoped teardown of one regeneration operation
///
/// Dropping the scope resets both rewrite maps for its root category, which
/// cascades into the id maps and drops the ephemeral derived tables. This
/// runs on early-exit and error paths alike.
pub struct OperationScope {
	pool: Arc<MapPool>,
	root: CategoryId,
}

impl OperationScope {
	pub fn root(&self) -> CategoryId {
		self.root
	}
}

impl Drop for OperationScope {
	fn drop(&mut self) {
		let results = [
			self.pool.reset_map::<UrlRewriteMap<CategoryRewrites>>(self.root),
			self.pool.reset_map::<UrlRewriteMap<ProductRewrites>>(self.root),
		];
		for result in results {
			if let Err(error) = result {
				warn!(root = self.root, %error, "Failed to tear down rewrite maps");
			}
		}
	}
}
