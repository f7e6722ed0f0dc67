//! Form reconciliation
//!
//! Reshapes a submitted block form into a block record: schema columns are
//! kept as columns, every other field lands in the settings bag, and the
//! per-theme region selections become region assignments. On edit, an
//! assignment keeps its identity when its theme is submitted again.

use crate::block::{AssignmentId, Block, BlockId, RegionAssignment, role_ids};
use crate::error::{BlockError, BlockResult};
use crate::schema::{KnownColumns, REGION_FIELD, ROLES_FIELD, SETTINGS_FIELD};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Decoded form submission, in submission order
pub type SubmittedFields = IndexMap<String, JsonValue>;

/// Build a submission from a JSON object.
///
/// Non-object values yield an empty submission.
///
/// # Examples
///
/// ```
/// use reinhardt_blocks::reconcile::submission;
/// use serde_json::json;
///
/// let fields = submission(json!({"title": "About", "body": "..."}));
/// assert_eq!(fields.len(), 2);
/// assert!(submission(json!("not a form")).is_empty());
/// ```
pub fn submission(value: JsonValue) -> SubmittedFields {
	match value {
		JsonValue::Object(map) => map.into_iter().collect(),
		_ => SubmittedFields::new(),
	}
}

/// A (theme, region) choice from the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSelection {
	/// Identity of the existing assignment to update; `None` inserts
	pub id: Option<AssignmentId>,

	/// Theme machine name
	pub theme: String,

	/// Selected region; empty means "none"
	pub region: String,
}

/// Result of reconciling a submitted form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciledData {
	/// Known columns, copied verbatim
	pub fields: IndexMap<String, JsonValue>,

	/// Everything that is not a known column
	pub settings: IndexMap<String, JsonValue>,

	/// One entry per submitted (theme, region) pair
	pub regions: Vec<RegionSelection>,
}

impl ReconciledData {
	/// Get a column value
	pub fn field(&self, name: &str) -> Option<&JsonValue> {
		self.fields.get(name)
	}

	/// Patch a block with this data.
	///
	/// The store assigns ids, so a submitted `id` is never applied. The
	/// handler of a persisted block cannot be changed. A non-empty settings
	/// bag replaces the stored one. Region selections update the assignment
	/// they carry the identity of, or the unsaved assignment of the same
	/// theme, and otherwise append a new one. Assignments for themes that
	/// were not submitted are left untouched.
	pub fn apply_to(&self, block: &mut Block) {
		let persisted = !block.is_new();

		for (name, value) in &self.fields {
			match name.as_str() {
				"id" => {}
				"handler" if persisted => {}
				"handler" => {
					if let Some(handler) = value.as_str() {
						block.handler = handler.to_string();
					}
				}
				"copy_id" => block.copy_id = BlockId::from_value(value),
				"delta" => {
					block.delta = value
						.as_str()
						.filter(|delta| !delta.is_empty())
						.map(str::to_string);
				}
				ROLES_FIELD => block.roles = role_ids(value),
				_ => {
					block.columns.insert(name.clone(), value.clone());
				}
			}
		}

		if !self.settings.is_empty() {
			block.settings = self.settings.clone();
		}

		for selection in &self.regions {
			let existing = match selection.id {
				Some(id) => block
					.regions
					.iter_mut()
					.find(|assignment| assignment.id == Some(id)),
				None => block.regions.iter_mut().find(|assignment| {
					assignment.id.is_none() && assignment.theme == selection.theme
				}),
			};

			match existing {
				Some(assignment) => {
					assignment.theme = selection.theme.clone();
					assignment.region = selection.region.clone();
				}
				None => {
					let assignment = RegionAssignment::new(
						block.id.clone(),
						selection.theme.clone(),
						selection.region.clone(),
					);
					block.regions.push(assignment);
				}
			}
		}
	}
}

/// One ordering update produced by a drag-and-drop reorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderUpdate {
	/// Block being positioned
	pub block_id: BlockId,

	/// Theme machine name
	pub theme: String,

	/// Region machine name
	pub region: String,

	/// Zero-based position within (theme, region)
	pub ordering: u32,
}

/// Turns submitted block forms into block records
#[derive(Debug, Clone)]
pub struct BlockFormReconciler {
	columns: KnownColumns,
}

impl BlockFormReconciler {
	/// Create a reconciler over the given known columns
	pub fn new(columns: KnownColumns) -> Self {
		Self { columns }
	}

	/// Known columns in use
	pub fn columns(&self) -> &KnownColumns {
		&self.columns
	}

	/// Split a submission into columns, settings and region selections.
	///
	/// When `existing` is given, a submitted theme that the block already
	/// has an assignment for reuses that assignment's identity (first match
	/// in the block's assignment order); other themes produce fresh
	/// selections. A submitted `settings` object is merged entry by entry
	/// into the settings bag, so a later field with the same key wins.
	pub fn reconcile(
		&self,
		submitted: &SubmittedFields,
		existing: Option<&Block>,
	) -> ReconciledData {
		let identities = existing.map(theme_index).unwrap_or_default();
		let mut data = ReconciledData::default();

		for (name, value) in submitted {
			match name.as_str() {
				REGION_FIELD => {
					let Some(themes) = value.as_object() else {
						tracing::warn!(
							value = %value,
							"Ignoring region selection that is not a theme mapping"
						);
						continue;
					};
					for (theme, region) in themes {
						data.regions.push(RegionSelection {
							id: identities.get(theme.as_str()).copied(),
							theme: theme.clone(),
							region: region_name(region),
						});
					}
				}
				SETTINGS_FIELD => match value {
					JsonValue::Object(entries) => {
						for (key, entry) in entries {
							if self.columns.contains(key) {
								tracing::warn!(
									field = %key,
									"Ignoring settings entry named after a column"
								);
								continue;
							}
							data.settings.insert(key.clone(), entry.clone());
						}
					}
					JsonValue::Null => {}
					other => {
						tracing::warn!(value = %other, "Ignoring settings value that is not a mapping");
					}
				},
				_ if self.columns.contains(name) => {
					data.fields.insert(name.clone(), value.clone());
				}
				_ => {
					data.settings.insert(name.clone(), value.clone());
				}
			}
		}

		data
	}

	/// Compute ordering updates from a reorder payload.
	///
	/// The payload maps theme → region → block ids in top-to-bottom order.
	/// Each id receives its zero-based position within its region. An absent,
	/// null or empty payload yields no updates.
	///
	/// # Errors
	///
	/// Returns [`BlockError::InvalidPayload`] when the payload is not nested
	/// mappings of id lists, or an entry is not a usable block id.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_blocks::reconcile::BlockFormReconciler;
	/// use serde_json::json;
	///
	/// let payload = json!({"default": {"sidebar": ["b3", "b1", "b2"]}});
	/// let updates = BlockFormReconciler::compute_reordering(Some(&payload)).unwrap();
	///
	/// let order: Vec<_> = updates
	///     .iter()
	///     .map(|u| (u.block_id.as_str(), u.ordering))
	///     .collect();
	/// assert_eq!(order, vec![("b3", 0), ("b1", 1), ("b2", 2)]);
	/// ```
	pub fn compute_reordering(payload: Option<&JsonValue>) -> BlockResult<Vec<ReorderUpdate>> {
		let Some(payload) = payload.filter(|payload| !is_blank(payload)) else {
			return Ok(Vec::new());
		};
		let themes = payload.as_object().ok_or_else(|| {
			BlockError::InvalidPayload(format!(
				"regions must map themes to regions, got {payload}"
			))
		})?;

		let mut updates = Vec::new();
		for (theme, regions) in themes {
			if is_blank(regions) {
				continue;
			}
			let regions = regions.as_object().ok_or_else(|| {
				BlockError::InvalidPayload(format!("theme '{theme}' must map regions to block ids"))
			})?;

			for (region, ids) in regions {
				if is_blank(ids) {
					continue;
				}
				let ids = ids.as_array().ok_or_else(|| {
					BlockError::InvalidPayload(format!(
						"region '{theme}.{region}' must list block ids"
					))
				})?;

				for (ordering, id) in ids.iter().enumerate() {
					let block_id = BlockId::from_value(id).ok_or_else(|| {
						BlockError::InvalidPayload(format!(
							"region '{theme}.{region}' contains invalid block id {id}"
						))
					})?;
					let ordering = u32::try_from(ordering).map_err(|_| {
						BlockError::InvalidPayload(format!(
							"region '{theme}.{region}' lists too many blocks"
						))
					})?;

					updates.push(ReorderUpdate {
						block_id,
						theme: theme.clone(),
						region: region.clone(),
						ordering,
					});
				}
			}
		}

		Ok(updates)
	}
}

/// Theme → identity of the block's first stored assignment in that theme
fn theme_index(block: &Block) -> HashMap<&str, AssignmentId> {
	let mut index = HashMap::new();
	for assignment in &block.regions {
		if let Some(id) = assignment.id {
			index.entry(assignment.theme.as_str()).or_insert(id);
		}
	}
	index
}

/// Empty level of a reorder payload: null, `""`, `[]` or `{}`.
///
/// Form encoders send these for themes and regions left without blocks.
fn is_blank(value: &JsonValue) -> bool {
	match value {
		JsonValue::Null => true,
		JsonValue::String(text) => text.is_empty(),
		JsonValue::Array(items) => items.is_empty(),
		JsonValue::Object(entries) => entries.is_empty(),
		_ => false,
	}
}

fn region_name(value: &JsonValue) -> String {
	match value {
		JsonValue::String(region) => region.clone(),
		JsonValue::Null => String::new(),
		other => other.to_string(),
	}
}
