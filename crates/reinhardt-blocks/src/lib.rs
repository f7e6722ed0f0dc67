//! # Reinhardt Blocks
//!
//! Block management for Reinhardt CMS. Blocks are reusable content widgets
//! placed into the regions of a theme layout.
//!
//! ## Features
//!
//! - **Form reconciliation**: Splits a submitted admin form into schema columns,
//!   a free-form settings bag and per-theme region assignments
//! - **Region ordering**: Turns a drag-and-drop payload into dense per-region orderings
//! - **Lifecycle rules**: Custom-only deletion, duplication into the unused pool
//! - **Admin flows**: Listing, add, edit, delete and duplicate over a pluggable store
//!
//! ## Architecture
//!
//! ```text
//! reinhardt-blocks
//! ├── block      - Block entity and region assignments
//! ├── schema     - Known column set
//! ├── reconcile  - Form data → block record reshaping
//! ├── lifecycle  - Deletion eligibility, duplication, delta keys
//! ├── validation - Validators and per-handler hooks
//! ├── store      - Persistence collaborator
//! ├── config     - Theme catalogue
//! └── manage     - Admin flows
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use reinhardt_blocks::prelude::*;
//! use serde_json::json;
//!
//! let reconciler = BlockFormReconciler::new(KnownColumns::blocks_table());
//!
//! let submitted = submission(json!({
//!     "title": "Latest news",
//!     "body": "<p>Hello</p>",
//!     "limit": 5,
//!     "region": { "FrontendTheme": "sidebar" }
//! }));
//!
//! let data = reconciler.reconcile(&submitted, None);
//! assert_eq!(data.fields["title"], json!("Latest news"));
//! assert_eq!(data.settings["limit"], json!(5));
//! assert_eq!(data.regions.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

// Re-export for callers building submissions
pub use indexmap;
pub use serde_json;

// Module declarations
pub mod block;
pub mod config;
pub mod lifecycle;
#[cfg(feature = "manage")]
pub mod manage;
pub mod reconcile;
pub mod schema;
pub mod store;
pub mod validation;

// Prelude for convenient imports
pub mod prelude {
	//! Convenient re-exports of commonly used items

	// Entities
	pub use crate::block::{Block, BlockId, CUSTOM_HANDLER, RegionAssignment};

	// Schema
	pub use crate::schema::{BlockSchema, KnownColumns};

	// Reconciliation
	pub use crate::reconcile::{
		BlockFormReconciler, ReconciledData, RegionSelection, ReorderUpdate, SubmittedFields,
		submission,
	};

	// Lifecycle
	pub use crate::lifecycle::{DeltaGenerator, UuidDeltaGenerator, can_delete, duplicate};

	// Validation
	pub use crate::validation::{
		BlockValidator, HandlerHooks, RequiredFieldsValidator, ValidationErrors,
	};

	// Persistence
	pub use crate::store::{BlockFilter, BlockStore, InMemoryBlockStore};

	// Configuration
	pub use crate::config::{BlockConfig, ThemeConfig};

	// Admin flows
	#[cfg(feature = "manage")]
	pub use crate::manage::{BlockListing, BlockManager, EditForm, RegionOption};

	// Errors
	pub use crate::error::{BlockError, BlockResult};
}

/// Block management error types
pub mod error {
	use crate::validation::ValidationErrors;
	use thiserror::Error;

	/// Block-related errors
	#[derive(Error, Debug)]
	pub enum BlockError {
		/// Block not found
		#[error("Block not found: {0}")]
		NotFound(String),

		/// Deletion attempted on a block owned by a plugin handler
		#[error("Block {id} is handled by '{handler}' and cannot be deleted")]
		NotDeletable {
			/// Block identifier
			id: String,
			/// Owning handler
			handler: String,
		},

		/// Submitted data failed validation
		#[error("Validation failed on {} field(s)", .0.len())]
		Validation(ValidationErrors),

		/// Persistence collaborator failure
		#[error("Persistence error: {0}")]
		Persistence(String),

		/// Malformed form payload
		#[error("Invalid payload: {0}")]
		InvalidPayload(String),

		/// Configuration could not be loaded
		#[error("Configuration error: {0}")]
		Config(String),

		/// Configuration file could not be read
		#[error("IO error: {0}")]
		Io(#[from] std::io::Error),

		/// Configuration file could not be parsed
		#[error("TOML error: {0}")]
		Toml(#[from] toml::de::Error),
	}

	impl BlockError {
		/// Field errors carried by a validation failure, if any
		pub fn validation_errors(&self) -> Option<&ValidationErrors> {
			match self {
				BlockError::Validation(errors) => Some(errors),
				_ => None,
			}
		}
	}

	/// Result type for block operations
	pub type BlockResult<T> = Result<T, BlockError>;
}
