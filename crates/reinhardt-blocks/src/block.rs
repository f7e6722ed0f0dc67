//! Block entities
//!
//! A block is a placeable content widget. Its `handler` names the subsystem
//! that renders it: [`CUSTOM_HANDLER`] for blocks authored in the admin,
//! otherwise the name of the plugin that provides it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeSet;
use std::fmt;

/// Handler of blocks created and owned by the admin itself
pub const CUSTOM_HANDLER: &str = "Block";

/// Region assignment identifier
pub type AssignmentId = u64;

/// Role identifier
pub type RoleId = u64;

/// Block identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
	/// Create a block identifier
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	/// Get the identifier as a string slice
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Read an identifier from a form value.
	///
	/// Strings and numbers are accepted; empty strings and every other
	/// value kind yield `None`.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_blocks::block::BlockId;
	/// use serde_json::json;
	///
	/// assert_eq!(BlockId::from_value(&json!(7)), Some(BlockId::from(7u64)));
	/// assert_eq!(BlockId::from_value(&json!("b3")), Some(BlockId::from("b3")));
	/// assert_eq!(BlockId::from_value(&json!("")), None);
	/// assert_eq!(BlockId::from_value(&json!(null)), None);
	/// ```
	pub fn from_value(value: &JsonValue) -> Option<Self> {
		match value {
			JsonValue::String(s) if !s.is_empty() => Some(Self(s.clone())),
			JsonValue::Number(n) => Some(Self(n.to_string())),
			_ => None,
		}
	}
}

impl fmt::Display for BlockId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for BlockId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

impl From<String> for BlockId {
	fn from(id: String) -> Self {
		Self(id)
	}
}

impl From<u64> for BlockId {
	fn from(id: u64) -> Self {
		Self(id.to_string())
	}
}

/// Placement of a block into one region of one theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionAssignment {
	/// Assignment identity, `None` until persisted
	pub id: Option<AssignmentId>,

	/// Owning block
	pub block_id: Option<BlockId>,

	/// Theme machine name
	pub theme: String,

	/// Region machine name within the theme; empty means "none selected"
	pub region: String,

	/// Position among the blocks of the same (theme, region)
	pub ordering: u32,
}

impl RegionAssignment {
	/// Create an unsaved assignment at ordering 0
	pub fn new(
		block_id: Option<BlockId>,
		theme: impl Into<String>,
		region: impl Into<String>,
	) -> Self {
		Self {
			id: None,
			block_id,
			theme: theme.into(),
			region: region.into(),
			ordering: 0,
		}
	}

	/// Whether this assignment actually places the block somewhere
	pub fn is_placed(&self) -> bool {
		!self.region.is_empty()
	}
}

/// A block record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
	/// Block identity, `None` until persisted
	pub id: Option<BlockId>,

	/// Source block when this block was produced by duplication
	pub copy_id: Option<BlockId>,

	/// Owning handler
	pub handler: String,

	/// Uniqueness key among blocks sharing a handler
	pub delta: Option<String>,

	/// Plain schema columns (title, body, status, ...)
	pub columns: IndexMap<String, JsonValue>,

	/// Handler-specific configuration
	pub settings: IndexMap<String, JsonValue>,

	/// Theme region placements
	pub regions: Vec<RegionAssignment>,

	/// Roles allowed to see the block; empty means everyone
	pub roles: BTreeSet<RoleId>,
}

impl Block {
	/// Create an empty, unsaved block for the given handler
	pub fn new(handler: impl Into<String>) -> Self {
		Self {
			id: None,
			copy_id: None,
			handler: handler.into(),
			delta: None,
			columns: IndexMap::new(),
			settings: IndexMap::new(),
			regions: Vec::new(),
			roles: BTreeSet::new(),
		}
	}

	/// Create an empty, unsaved custom block
	pub fn custom() -> Self {
		Self::new(CUSTOM_HANDLER)
	}

	/// Whether the block is owned by the admin rather than a plugin
	pub fn is_custom(&self) -> bool {
		self.handler == CUSTOM_HANDLER
	}

	/// Whether the block has not been persisted yet
	pub fn is_new(&self) -> bool {
		self.id.is_none()
	}

	/// Set a schema column
	pub fn with_column(mut self, name: impl Into<String>, value: JsonValue) -> Self {
		self.columns.insert(name.into(), value);
		self
	}

	/// Set a settings entry
	pub fn with_setting(mut self, name: impl Into<String>, value: JsonValue) -> Self {
		self.settings.insert(name.into(), value);
		self
	}

	/// Get a schema column
	pub fn column(&self, name: &str) -> Option<&JsonValue> {
		self.columns.get(name)
	}

	/// Get the block title, if set
	pub fn title(&self) -> Option<&str> {
		self.columns.get("title").and_then(JsonValue::as_str)
	}

	/// First assignment of this block in the given theme
	pub fn region_in(&self, theme: &str) -> Option<&RegionAssignment> {
		self.regions.iter().find(|assignment| assignment.theme == theme)
	}

	/// Whether the block occupies a region in any theme
	pub fn is_placed(&self) -> bool {
		self.regions.iter().any(RegionAssignment::is_placed)
	}

	/// Values used to pre-fill the edit form.
	///
	/// Settings entries are flattened in as top-level fields so that the
	/// handler's own inputs find their stored values; a setting shadows a
	/// column of the same name.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_blocks::block::Block;
	/// use serde_json::json;
	///
	/// let block = Block::custom()
	///     .with_column("title", json!("Menu"))
	///     .with_setting("depth", json!(2));
	///
	/// let values = block.form_values();
	/// assert_eq!(values["title"], json!("Menu"));
	/// assert_eq!(values["depth"], json!(2));
	/// ```
	pub fn form_values(&self) -> IndexMap<String, JsonValue> {
		let mut values = self.columns.clone();
		for (name, value) in &self.settings {
			values.insert(name.clone(), value.clone());
		}
		values
	}
}

impl Default for Block {
	fn default() -> Self {
		Self::custom()
	}
}

/// Parse a submitted roles value into role identifiers.
///
/// Accepts a list of ids, an `{"_ids": [...]}` object as produced by
/// multi-checkbox widgets, or an empty string for "no roles selected".
/// Entries may be numbers or numeric strings; anything else is skipped.
pub(crate) fn role_ids(value: &JsonValue) -> BTreeSet<RoleId> {
	let items: &[JsonValue] = match value {
		JsonValue::Array(items) => items.as_slice(),
		JsonValue::Object(map) => match map.get("_ids") {
			Some(JsonValue::Array(items)) => items.as_slice(),
			_ => &[],
		},
		_ => &[],
	};

	items
		.iter()
		.filter_map(|item| match item {
			JsonValue::Number(n) => n.as_u64(),
			JsonValue::String(s) => s.trim().parse().ok(),
			_ => None,
		})
		.collect()
}
