//! Value objects for url rewrites
//!
//! A rewrite maps a public request path to an internal target path for one
//! catalog entity in one store. Batches are deduplicated by [`RewriteKey`];
//! finder and deletion criteria are expressed as a [`RewriteFilter`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store (storefront view) identifier.
pub type StoreId = u32;

/// Identifier of a catalog entity (category or product).
pub type EntityId = u64;

/// Category identifier, also used as the scope key of the data maps.
pub type CategoryId = u64;

/// Product identifier.
pub type ProductId = u64;

/// Opaque key-value metadata attached to a rewrite, e.g. the category a
/// product rewrite was generated under.
pub type RewriteMetadata = BTreeMap<String, String>;

/// Metadata key carrying the category scope of a product rewrite.
pub const CATEGORY_ID_META: &str = "category_id";

/// Kind of catalog entity a rewrite belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
	Category,
	Product,
}

impl EntityType {
	/// Stable string form used in stored rows and criteria
	pub fn as_str(self) -> &'static str {
		match self {
			EntityType::Category => "category",
			EntityType::Product => "product",
		}
	}
}

impl fmt::Display for EntityType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Redirect behavior of a rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RedirectType {
	/// Direct mapping, served without a redirect
	#[default]
	None,
	/// 301 redirect
	Permanent,
	/// 302 redirect
	Temporary,
}

impl RedirectType {
	/// HTTP status code for the redirect, 0 for a direct mapping
	pub fn code(self) -> u16 {
		match self {
			RedirectType::None => 0,
			RedirectType::Permanent => 301,
			RedirectType::Temporary => 302,
		}
	}

	pub fn is_redirect(self) -> bool {
		self != RedirectType::None
	}
}

/// A single url rewrite row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRewrite {
	pub entity_type: EntityType,
	pub entity_id: EntityId,
	pub request_path: String,
	pub target_path: String,
	pub redirect_type: RedirectType,
	pub store_id: StoreId,

	/// Whether the system generated this rewrite from naming rules, as
	/// opposed to a user-entered ("custom") rewrite
	pub is_autogenerated: bool,

	pub description: Option<String>,
	pub metadata: RewriteMetadata,
}

impl UrlRewrite {
	/// Create a direct (non-redirect, non-autogenerated) rewrite
	pub fn new(
		entity_type: EntityType,
		entity_id: EntityId,
		store_id: StoreId,
		request_path: impl Into<String>,
		target_path: impl Into<String>,
	) -> Self {
		Self {
			entity_type,
			entity_id,
			request_path: request_path.into(),
			target_path: target_path.into(),
			redirect_type: RedirectType::None,
			store_id,
			is_autogenerated: false,
			description: None,
			metadata: RewriteMetadata::new(),
		}
	}

	pub fn with_redirect(mut self, redirect_type: RedirectType) -> Self {
		self.redirect_type = redirect_type;
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_metadata(mut self, metadata: RewriteMetadata) -> Self {
		self.metadata = metadata;
		self
	}

	pub fn autogenerated(mut self) -> Self {
		self.is_autogenerated = true;
		self
	}

	/// Deduplication identity within a batch
	pub fn key(&self) -> RewriteKey {
		RewriteKey {
			entity_type: self.entity_type,
			entity_id: self.entity_id,
			store_id: self.store_id,
			request_path: self.request_path.clone(),
		}
	}

	/// Point-lookup key of the derived rewrite tables
	pub fn hash_key(&self) -> String {
		format!("{}_{}", self.store_id, self.entity_id)
	}
}

/// Composite identity of a rewrite; later writes for the same key overwrite
/// earlier ones within a batch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RewriteKey {
	pub entity_type: EntityType,
	pub entity_id: EntityId,
	pub store_id: StoreId,
	pub request_path: String,
}

/// Criteria map for finder queries and deletions
///
/// Every populated field must match; `metadata` matches when each of its
/// pairs is present in the row's metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewriteFilter {
	pub entity_type: Option<EntityType>,
	pub entity_id: Option<EntityId>,
	pub store_id: Option<StoreId>,
	pub request_path: Option<String>,
	pub metadata: Option<RewriteMetadata>,
}

impl RewriteFilter {
	/// Match every rewrite of one entity across all stores
	pub fn for_entity(entity_type: EntityType, entity_id: EntityId) -> Self {
		Self {
			entity_type: Some(entity_type),
			entity_id: Some(entity_id),
			..Self::default()
		}
	}

	/// Match every rewrite of one entity in one store
	pub fn for_entity_in_store(
		entity_type: EntityType,
		entity_id: EntityId,
		store_id: StoreId,
	) -> Self {
		Self {
			entity_type: Some(entity_type),
			entity_id: Some(entity_id),
			store_id: Some(store_id),
			..Self::default()
		}
	}

	/// Match product rewrites generated under the given category
	pub fn for_category_products(category_id: CategoryId) -> Self {
		let mut metadata = RewriteMetadata::new();
		metadata.insert(CATEGORY_ID_META.to_string(), category_id.to_string());
		Self {
			entity_type: Some(EntityType::Product),
			metadata: Some(metadata),
			..Self::default()
		}
	}

	pub fn matches(&self, rewrite: &UrlRewrite) -> bool {
		if let Some(entity_type) = self.entity_type {
			if rewrite.entity_type != entity_type {
				return false;
			}
		}
		if let Some(entity_id) = self.entity_id {
			if rewrite.entity_id != entity_id {
				return false;
			}
		}
		if let Some(store_id) = self.store_id {
			if rewrite.store_id != store_id {
				return false;
			}
		}
		if let Some(ref request_path) = self.request_path {
			if &rewrite.request_path != request_path {
				return false;
			}
		}
		if let Some(ref metadata) = self.metadata {
			for (key, value) in metadata {
				if rewrite.metadata.get(key) != Some(value) {
					return false;
				}
			}
		}
		true
	}
}
