//! Block admin flows
//!
//! [`BlockManager`] drives listing, reordering, creation, editing, deletion
//! and duplication of blocks over a [`BlockStore`]. Rendering, flash
//! messages and redirects are left to the calling view layer.

use crate::block::{Block, BlockId, CUSTOM_HANDLER};
use crate::config::BlockConfig;
use crate::error::{BlockError, BlockResult};
use crate::lifecycle::{self, DeltaGenerator, UuidDeltaGenerator, calculate_delta, can_delete};
use crate::reconcile::{BlockFormReconciler, SubmittedFields};
use crate::schema::{BlockSchema, BlocksTable};
use crate::store::{BlockFilter, BlockStore};
use crate::validation::{
	BlockValidator, HandlerHooks, RequiredFieldsValidator, ValidationErrors,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Form field carrying the reorder payload on the index page
pub const REORDER_FIELD: &str = "regions";

/// Blocks grouped for the index page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BlockListing {
	/// Front theme: region → blocks in display order
	pub front: IndexMap<String, Vec<Block>>,

	/// Back theme: region → blocks in display order
	pub back: IndexMap<String, Vec<Block>>,

	/// Blocks not placed in any region
	pub unused: Vec<Block>,
}

/// Theme section of the block form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionOption {
	/// Theme machine name
	pub theme_machine_name: String,

	/// Theme display name
	pub theme_human_name: String,

	/// Theme description
	pub description: String,

	/// Selectable regions, machine name → label
	pub regions: IndexMap<String, String>,

	/// Region currently selected for the block, or empty
	pub value: String,
}

/// Initial state of the edit page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditForm {
	/// Block being edited
	pub block: Block,

	/// Field values, settings flattened in
	pub values: IndexMap<String, JsonValue>,

	/// Theme region selectors
	pub regions: Vec<RegionOption>,
}

/// Block admin service
pub struct BlockManager<S: BlockStore> {
	store: S,
	config: BlockConfig,
	reconciler: BlockFormReconciler,
	hooks: HandlerHooks,
	default_validator: Box<dyn BlockValidator>,
	custom_validator: Box<dyn BlockValidator>,
	delta: Box<dyn DeltaGenerator>,
}

impl<S: BlockStore> BlockManager<S> {
	/// Create a manager over the stock blocks table
	pub fn new(store: S, config: BlockConfig) -> Self {
		Self::with_schema(store, config, &BlocksTable)
	}

	/// Create a manager over a custom schema
	pub fn with_schema(store: S, config: BlockConfig, schema: &dyn BlockSchema) -> Self {
		Self {
			store,
			config,
			reconciler: BlockFormReconciler::new(schema.known_columns()),
			hooks: HandlerHooks::new(),
			default_validator: Box::new(RequiredFieldsValidator::default_profile()),
			custom_validator: Box::new(RequiredFieldsValidator::custom_profile()),
			delta: Box::new(UuidDeltaGenerator),
		}
	}

	/// Replace the per-handler validation hooks
	pub fn with_hooks(mut self, hooks: HandlerHooks) -> Self {
		self.hooks = hooks;
		self
	}

	/// Replace the validators for plugin-provided and custom blocks
	pub fn with_validators(
		mut self,
		default_validator: impl BlockValidator + 'static,
		custom_validator: impl BlockValidator + 'static,
	) -> Self {
		self.default_validator = Box::new(default_validator);
		self.custom_validator = Box::new(custom_validator);
		self
	}

	/// Replace the delta generator
	pub fn with_delta_generator(mut self, delta: impl DeltaGenerator + 'static) -> Self {
		self.delta = Box::new(delta);
		self
	}

	/// Underlying store
	pub fn store(&self) -> &S {
		&self.store
	}

	/// Active configuration
	pub fn config(&self) -> &BlockConfig {
		&self.config
	}

	/// Form reconciler in use
	pub fn reconciler(&self) -> &BlockFormReconciler {
		&self.reconciler
	}

	/// Group every block for the index page
	pub fn listing(&self) -> BlockResult<BlockListing> {
		let blocks = self.store.find(&BlockFilter::new())?;

		Ok(BlockListing {
			front: self.blocks_in_theme(&blocks, &self.config.front_theme),
			back: self.blocks_in_theme(&blocks, &self.config.back_theme),
			unused: blocks
				.iter()
				.filter(|block| !block.is_placed())
				.cloned()
				.collect(),
		})
	}

	/// Handle a post to the index page.
	///
	/// Returns `true` when the submission carried a reorder payload and the
	/// new orderings were stored, `false` when there was nothing to reorder.
	pub fn index(&self, submission: &SubmittedFields) -> BlockResult<bool> {
		let updates = BlockFormReconciler::compute_reordering(submission.get(REORDER_FIELD))?;
		if updates.is_empty() {
			return Ok(false);
		}

		self.store.apply_reordering(&updates)?;
		tracing::info!(updates = updates.len(), "Blocks ordering updated");
		Ok(true)
	}

	/// Create a custom block from a submitted form
	///
	/// # Errors
	///
	/// Returns [`BlockError::Validation`] with the field errors when the
	/// submission is invalid; nothing is stored in that case.
	pub fn add(&self, submission: &SubmittedFields) -> BlockResult<Block> {
		let mut data = self.reconciler.reconcile(submission, None);
		data.fields
			.insert("handler".to_string(), JsonValue::from(CUSTOM_HANDLER));

		let errors = self.custom_validator.validate(&data);
		if !errors.is_empty() {
			tracing::warn!(
				fields = ?errors.keys().collect::<Vec<_>>(),
				"Block could not be created"
			);
			return Err(BlockError::Validation(errors));
		}

		let mut block = self.store.new_entity(&data);
		calculate_delta(&mut block, self.delta.as_ref());
		let block = self.store.save(block)?;

		tracing::info!(block_id = ?block.id, "Block created");
		Ok(block)
	}

	/// Update a block from a submitted form.
	///
	/// Hooks registered for the block's handler run first. Custom blocks are
	/// then checked with the custom validator, plugin blocks with the default
	/// one.
	pub fn edit(&self, id: &BlockId, submission: &SubmittedFields) -> BlockResult<Block> {
		let mut block = self.store.get(id)?;
		let data = self.reconciler.reconcile(submission, Some(&block));

		let validator = if block.is_custom() {
			&self.custom_validator
		} else {
			&self.default_validator
		};
		let mut errors = ValidationErrors::new();
		self.hooks.run(&block.handler, &data, &mut errors);
		for (field, messages) in validator.validate(&data) {
			errors.entry(field).or_default().extend(messages);
		}

		if !errors.is_empty() {
			tracing::warn!(
				block_id = %id,
				handler = %block.handler,
				fields = ?errors.keys().collect::<Vec<_>>(),
				"Block could not be updated"
			);
			return Err(BlockError::Validation(errors));
		}

		data.apply_to(&mut block);
		let block = self.store.save(block)?;

		tracing::info!(block_id = %id, "Block updated");
		Ok(block)
	}

	/// Initial state of the edit page for a block
	pub fn edit_form(&self, id: &BlockId) -> BlockResult<EditForm> {
		let block = self.store.get(id)?;

		Ok(EditForm {
			values: block.form_values(),
			regions: self.region_options(Some(&block)),
			block,
		})
	}

	/// Region selectors for every configured theme.
	///
	/// With a block, each selector is pre-set to the region the block
	/// occupies in that theme.
	pub fn region_options(&self, block: Option<&Block>) -> Vec<RegionOption> {
		self.config
			.themes
			.iter()
			.map(|theme| RegionOption {
				theme_machine_name: theme.name.clone(),
				theme_human_name: theme.display_name().to_string(),
				description: theme.description.clone(),
				regions: theme.regions.clone(),
				value: block
					.and_then(|block| block.region_in(&theme.name))
					.map(|assignment| assignment.region.clone())
					.unwrap_or_default(),
			})
			.collect()
	}

	/// Delete a custom block.
	///
	/// # Errors
	///
	/// Returns [`BlockError::NotDeletable`] for plugin-provided blocks, before
	/// the store is asked to delete anything.
	pub fn delete(&self, id: &BlockId) -> BlockResult<Block> {
		let block = self.store.get(id)?;
		if !can_delete(&block) {
			tracing::warn!(block_id = %id, handler = %block.handler, "Refusing to delete plugin block");
			return Err(BlockError::NotDeletable {
				id: id.to_string(),
				handler: block.handler,
			});
		}

		self.store.delete(&block)?;
		tracing::info!(block_id = %id, "Block removed");
		Ok(block)
	}

	/// Store an unplaced copy of a block
	pub fn duplicate(&self, id: &BlockId) -> BlockResult<Block> {
		let original = self.store.get(id)?;
		let mut draft = lifecycle::duplicate(&original);
		calculate_delta(&mut draft, self.delta.as_ref());
		let copy = self.store.save(draft)?;

		tracing::info!(block_id = %id, copy_id = ?copy.id, "Block duplicated");
		Ok(copy)
	}

	fn blocks_in_theme(&self, blocks: &[Block], theme: &str) -> IndexMap<String, Vec<Block>> {
		let mut grouped: IndexMap<String, Vec<(u32, Block)>> = self
			.config
			.theme(theme)
			.map(|config| {
				config
					.regions
					.keys()
					.map(|region| (region.clone(), Vec::new()))
					.collect()
			})
			.unwrap_or_default();

		for block in blocks {
			if let Some(assignment) = block
				.regions
				.iter()
				.find(|assignment| assignment.theme == theme && assignment.is_placed())
			{
				grouped
					.entry(assignment.region.clone())
					.or_default()
					.push((assignment.ordering, block.clone()));
			}
		}

		grouped
			.into_iter()
			.map(|(region, mut entries)| {
				entries.sort_by_key(|(ordering, _)| *ordering);
				let blocks: Vec<Block> = entries.into_iter().map(|(_, block)| block).collect();
				(region, blocks)
			})
			.collect()
	}
}

impl<S: BlockStore> std::fmt::Debug for BlockManager<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BlockManager")
			.field("config", &self.config)
			.field("reconciler", &self.reconciler)
			.field("hooks", &self.hooks)
			.finish()
	}
}
