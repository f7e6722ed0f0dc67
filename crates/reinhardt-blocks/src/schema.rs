//! Known block columns
//!
//! Every submitted form field is either a first-class column of the blocks
//! table or folded into the block's settings bag. The schema decides which.

use indexmap::IndexSet;

/// Structural field carrying theme → region selections
pub const REGION_FIELD: &str = "region";

/// Structural field carrying role selections
pub const ROLES_FIELD: &str = "roles";

/// Column holding the settings bag itself
pub const SETTINGS_FIELD: &str = "settings";

/// Columns of the blocks table
pub const BLOCKS_TABLE_COLUMNS: &[&str] = &[
	"id",
	"copy_id",
	"handler",
	"title",
	"description",
	"body",
	"visibility",
	"pages",
	"locale",
	"settings",
	"status",
	"delta",
];

/// Source of the blocks table column list
pub trait BlockSchema: Send + Sync {
	/// Column names of the blocks table
	fn columns(&self) -> Vec<String>;

	/// Column names plus the structural fields
	fn known_columns(&self) -> KnownColumns {
		KnownColumns::new(self.columns())
	}
}

/// The stock blocks table layout
#[derive(Debug, Clone, Copy, Default)]
pub struct BlocksTable;

impl BlockSchema for BlocksTable {
	fn columns(&self) -> Vec<String> {
		BLOCKS_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect()
	}
}

/// Set of field names that are first-class record columns.
///
/// Always contains [`REGION_FIELD`] and [`ROLES_FIELD`].
///
/// # Examples
///
/// ```
/// use reinhardt_blocks::schema::KnownColumns;
///
/// let columns = KnownColumns::new(["title", "body"]);
/// assert!(columns.contains("title"));
/// assert!(columns.contains("region"));
/// assert!(columns.contains("roles"));
/// assert!(!columns.contains("limit"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownColumns {
	names: IndexSet<String>,
}

impl KnownColumns {
	/// Build the set from schema columns
	pub fn new<I, S>(columns: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut names: IndexSet<String> = columns.into_iter().map(Into::into).collect();
		names.insert(REGION_FIELD.to_string());
		names.insert(ROLES_FIELD.to_string());
		Self { names }
	}

	/// Known columns of the stock blocks table
	pub fn blocks_table() -> Self {
		BlocksTable.known_columns()
	}

	/// Treat extra names as columns so they are never folded into settings
	pub fn with_ignored<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.names.extend(names.into_iter().map(Into::into));
		self
	}

	/// Whether the name is a known column
	pub fn contains(&self, name: &str) -> bool {
		self.names.contains(name)
	}

	/// Iterate over the known names
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.names.iter().map(String::as_str)
	}

	/// Number of known names
	pub fn len(&self) -> usize {
		self.names.len()
	}

	/// Whether the set is empty (never true in practice)
	pub fn is_empty(&self) -> bool {
		self.names.is_empty()
	}
}
