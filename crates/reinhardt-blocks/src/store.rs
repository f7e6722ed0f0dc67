//! Block persistence
//!
//! [`BlockStore`] is the persistence collaborator used by the admin flows.
//! [`InMemoryBlockStore`] keeps everything behind a single lock and serves
//! embedded setups and tests.

use crate::block::{AssignmentId, Block, BlockId, RegionAssignment};
use crate::error::{BlockError, BlockResult};
use crate::reconcile::{ReconciledData, ReorderUpdate};
use indexmap::IndexMap;
use parking_lot::RwLock;

/// Equality filters for [`BlockStore::find`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockFilter {
	/// Match on block id
	pub id: Option<BlockId>,

	/// Match on handler
	pub handler: Option<String>,
}

impl BlockFilter {
	/// Filter matching every block
	pub fn new() -> Self {
		Self::default()
	}

	/// Restrict to one block id
	pub fn id(mut self, id: BlockId) -> Self {
		self.id = Some(id);
		self
	}

	/// Restrict to one handler
	pub fn handler(mut self, handler: impl Into<String>) -> Self {
		self.handler = Some(handler.into());
		self
	}

	/// Whether the block passes every set filter
	pub fn matches(&self, block: &Block) -> bool {
		self.id
			.as_ref()
			.is_none_or(|id| block.id.as_ref() == Some(id))
			&& self
				.handler
				.as_deref()
				.is_none_or(|handler| block.handler == handler)
	}
}

/// Persistence collaborator
pub trait BlockStore: Send + Sync {
	/// Load a block with its region assignments and roles
	///
	/// # Errors
	///
	/// Returns [`BlockError::NotFound`] if no block has this id.
	fn get(&self, id: &BlockId) -> BlockResult<Block>;

	/// Load every block passing the filter
	fn find(&self, filter: &BlockFilter) -> BlockResult<Vec<Block>>;

	/// Insert a new block or update a persisted one.
	///
	/// Returns the stored block, with ids assigned to the block and to any
	/// new region assignment.
	fn save(&self, block: Block) -> BlockResult<Block>;

	/// Remove a block and its region assignments
	fn delete(&self, block: &Block) -> BlockResult<()>;

	/// Set the region and ordering of the block's assignment in the update's
	/// theme, creating the assignment if the block has none there
	fn upsert_region(&self, update: &ReorderUpdate) -> BlockResult<()>;

	/// Apply a whole reorder batch
	fn apply_reordering(&self, updates: &[ReorderUpdate]) -> BlockResult<()> {
		for update in updates {
			self.upsert_region(update)?;
		}
		Ok(())
	}

	/// Build an unsaved block from reconciled data
	fn new_entity(&self, data: &ReconciledData) -> Block {
		let mut block = Block::custom();
		data.apply_to(&mut block);
		block
	}
}

#[derive(Debug, Default)]
struct StoreState {
	blocks: IndexMap<BlockId, Block>,
	last_block_id: u64,
	last_assignment_id: AssignmentId,
}

impl StoreState {
	fn assign_ids(&mut self, block: &mut Block) {
		let block_id = match &block.id {
			Some(id) => id.clone(),
			None => {
				self.last_block_id += 1;
				let id = BlockId::from(self.last_block_id);
				block.id = Some(id.clone());
				id
			}
		};

		for assignment in &mut block.regions {
			assignment.block_id = Some(block_id.clone());
			if assignment.id.is_none() {
				self.last_assignment_id += 1;
				assignment.id = Some(self.last_assignment_id);
			}
		}
	}

	fn upsert(&mut self, update: &ReorderUpdate) -> BlockResult<()> {
		let next_assignment_id = self.last_assignment_id + 1;
		let block = self
			.blocks
			.get_mut(&update.block_id)
			.ok_or_else(|| BlockError::NotFound(update.block_id.to_string()))?;

		match block
			.regions
			.iter_mut()
			.find(|assignment| assignment.theme == update.theme)
		{
			Some(assignment) => {
				assignment.region = update.region.clone();
				assignment.ordering = update.ordering;
			}
			None => {
				let mut assignment = RegionAssignment::new(
					Some(update.block_id.clone()),
					update.theme.clone(),
					update.region.clone(),
				);
				assignment.id = Some(next_assignment_id);
				assignment.ordering = update.ordering;
				block.regions.push(assignment);
				self.last_assignment_id = next_assignment_id;
			}
		}
		Ok(())
	}
}

/// Block store held in memory
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
	state: RwLock<StoreState>,
}

impl InMemoryBlockStore {
	/// Create an empty store
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of stored blocks
	pub fn len(&self) -> usize {
		self.state.read().blocks.len()
	}

	/// Whether the store holds no blocks
	pub fn is_empty(&self) -> bool {
		self.state.read().blocks.is_empty()
	}
}

impl BlockStore for InMemoryBlockStore {
	fn get(&self, id: &BlockId) -> BlockResult<Block> {
		self.state
			.read()
			.blocks
			.get(id)
			.cloned()
			.ok_or_else(|| BlockError::NotFound(id.to_string()))
	}

	fn find(&self, filter: &BlockFilter) -> BlockResult<Vec<Block>> {
		Ok(self
			.state
			.read()
			.blocks
			.values()
			.filter(|block| filter.matches(block))
			.cloned()
			.collect())
	}

	fn save(&self, mut block: Block) -> BlockResult<Block> {
		let mut state = self.state.write();
		if let Some(id) = &block.id
			&& !state.blocks.contains_key(id)
		{
			return Err(BlockError::NotFound(id.to_string()));
		}

		state.assign_ids(&mut block);
		if let Some(id) = &block.id {
			state.blocks.insert(id.clone(), block.clone());
		}
		Ok(block)
	}

	fn delete(&self, block: &Block) -> BlockResult<()> {
		let id = block
			.id
			.as_ref()
			.ok_or_else(|| BlockError::Persistence("cannot delete an unsaved block".to_string()))?;

		self.state
			.write()
			.blocks
			.shift_remove(id)
			.map(|_| ())
			.ok_or_else(|| BlockError::NotFound(id.to_string()))
	}

	fn upsert_region(&self, update: &ReorderUpdate) -> BlockResult<()> {
		self.state.write().upsert(update)
	}

	// The whole batch is checked before anything is written.
	fn apply_reordering(&self, updates: &[ReorderUpdate]) -> BlockResult<()> {
		let mut state = self.state.write();
		if let Some(missing) = updates
			.iter()
			.find(|update| !state.blocks.contains_key(&update.block_id))
		{
			return Err(BlockError::NotFound(missing.block_id.to_string()));
		}

		for update in updates {
			state.upsert(update)?;
		}
		Ok(())
	}
}
