//! Block lifecycle rules
//!
//! Deletion is limited to custom blocks; plugin-provided blocks live and die
//! with their plugin. Duplicates start life unplaced.

use crate::block::{Block, CUSTOM_HANDLER};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unsaved block produced by [`duplicate`]
pub type NewBlockDraft = Block;

/// Whether the block may be deleted through the admin.
///
/// # Examples
///
/// ```
/// use reinhardt_blocks::block::Block;
/// use reinhardt_blocks::lifecycle::can_delete;
///
/// assert!(can_delete(&Block::custom()));
/// assert!(!can_delete(&Block::new("Menu")));
/// ```
pub fn can_delete(block: &Block) -> bool {
	block.handler == CUSTOM_HANDLER
}

/// Draft a copy of `original`.
///
/// Columns, settings and handler are copied. The draft has no identity and
/// no delta, links back through `copy_id`, and carries neither region
/// assignments nor roles.
pub fn duplicate(original: &Block) -> NewBlockDraft {
	Block {
		id: None,
		copy_id: original.id.clone(),
		handler: original.handler.clone(),
		delta: None,
		columns: original.columns.clone(),
		settings: original.settings.clone(),
		regions: Vec::new(),
		roles: BTreeSet::new(),
	}
}

/// Source of block delta keys
pub trait DeltaGenerator: Send + Sync {
	/// Produce a delta for a block that has none
	fn generate(&self, block: &Block) -> String;
}

/// Random delta keys
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidDeltaGenerator;

impl DeltaGenerator for UuidDeltaGenerator {
	fn generate(&self, _block: &Block) -> String {
		Uuid::new_v4().simple().to_string()
	}
}

/// Fill in the block's delta if it is missing or empty
pub fn calculate_delta(block: &mut Block, generator: &dyn DeltaGenerator) {
	if block.delta.as_deref().is_none_or(str::is_empty) {
		block.delta = Some(generator.generate(block));
	}
}
