//! Rewrite collector
//!
//! Accumulates rewrites across nested generation calls, keyed by the
//! composite rewrite identity. A later add for the same identity overwrites
//! the earlier entry but keeps its position. [`RewriteCollector::get_reset_data`]
//! drains atomically, so an outer batch never sees what an inner call
//! already drained from the shared instance.

use crate::rewrite::{RewriteKey, UrlRewrite};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct MergeBuffer {
	order: Vec<RewriteKey>,
	entries: HashMap<RewriteKey, UrlRewrite>,
}

/// Insertion-ordered, identity-keyed buffer of pending rewrites
#[derive(Default)]
pub struct RewriteCollector {
	buffer: Mutex<MergeBuffer>,
}

impl RewriteCollector {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append rewrites, overwriting buffered entries with the same identity
	pub fn add<I>(&self, rewrites: I)
	where
		I: IntoIterator<Item = UrlRewrite>,
	{
		let mut buffer = self.lock();
		for rewrite in rewrites {
			let key = rewrite.key();
			if buffer.entries.insert(key.clone(), rewrite).is_none() {
				buffer.order.push(key);
			}
		}
	}

	/// Read the buffered batch in insertion order and clear the buffer
	pub fn get_reset_data(&self) -> Vec<UrlRewrite> {
		let mut buffer = self.lock();
		let order = std::mem::take(&mut buffer.order);
		let mut entries = std::mem::take(&mut buffer.entries);
		order
			.into_iter()
			.filter_map(|key| entries.remove(&key))
			.collect()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().order.is_empty()
	}

	fn lock(&self) -> std::sync::MutexGuard<'_, MergeBuffer> {
		self.buffer
			.lock()
			.unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}
