//! Block form validation
//!
//! Validators inspect reconciled data and report field errors; they never
//! reject a request themselves. Plugins that own a handler can register hooks
//! that add their own errors when one of their blocks is edited.

use crate::reconcile::ReconciledData;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Field name → error messages
pub type ValidationErrors = IndexMap<String, Vec<String>>;

/// Record an error for a field
pub fn push_error(errors: &mut ValidationErrors, field: &str, message: impl Into<String>) {
	errors
		.entry(field.to_string())
		.or_default()
		.push(message.into());
}

/// Validation collaborator
pub trait BlockValidator: Send + Sync {
	/// Validate reconciled data; an empty result means valid
	fn validate(&self, data: &ReconciledData) -> ValidationErrors;
}

/// Requires a set of columns to be present and non-blank
#[derive(Debug, Clone)]
pub struct RequiredFieldsValidator {
	required: Vec<String>,
}

impl RequiredFieldsValidator {
	/// Create a validator requiring the given columns
	pub fn new<I, S>(required: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			required: required.into_iter().map(Into::into).collect(),
		}
	}

	/// Rules for plugin-provided blocks
	pub fn default_profile() -> Self {
		Self::new(["title"])
	}

	/// Rules for custom blocks, which carry their own body
	pub fn custom_profile() -> Self {
		Self::new(["title", "body"])
	}

	/// Require one more column
	pub fn require(mut self, field: impl Into<String>) -> Self {
		self.required.push(field.into());
		self
	}
}

impl BlockValidator for RequiredFieldsValidator {
	fn validate(&self, data: &ReconciledData) -> ValidationErrors {
		let mut errors = ValidationErrors::new();
		for field in &self.required {
			match data.field(field) {
				None => push_error(&mut errors, field, "This field is required."),
				Some(value) if is_blank(value) => {
					push_error(&mut errors, field, "This field cannot be left empty.")
				}
				Some(_) => {}
			}
		}
		errors
	}
}

fn is_blank(value: &JsonValue) -> bool {
	match value {
		JsonValue::Null => true,
		JsonValue::String(s) => s.trim().is_empty(),
		_ => false,
	}
}

type HandlerHook = Box<dyn Fn(&ReconciledData, &mut ValidationErrors) + Send + Sync>;

/// Per-handler validation hooks
#[derive(Default)]
pub struct HandlerHooks {
	hooks: HashMap<String, Vec<HandlerHook>>,
}

impl HandlerHooks {
	/// Create an empty hook registry
	pub fn new() -> Self {
		Self::default()
	}

	/// Register a hook for a handler
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_blocks::validation::{HandlerHooks, ValidationErrors, push_error};
	/// use reinhardt_blocks::reconcile::ReconciledData;
	///
	/// let mut hooks = HandlerHooks::new();
	/// hooks.register("Menu", |data, errors| {
	///     if data.settings.get("menu_id").is_none() {
	///         push_error(errors, "menu_id", "Select a menu.");
	///     }
	/// });
	///
	/// let mut errors = ValidationErrors::new();
	/// hooks.run("Menu", &ReconciledData::default(), &mut errors);
	/// assert!(errors.contains_key("menu_id"));
	/// ```
	pub fn register<F>(&mut self, handler: impl Into<String>, hook: F)
	where
		F: Fn(&ReconciledData, &mut ValidationErrors) + Send + Sync + 'static,
	{
		self.hooks
			.entry(handler.into())
			.or_default()
			.push(Box::new(hook));
	}

	/// Whether any hook is registered for the handler
	pub fn has(&self, handler: &str) -> bool {
		self.hooks.contains_key(handler)
	}

	/// Run every hook registered for the handler, in registration order
	pub fn run(&self, handler: &str, data: &ReconciledData, errors: &mut ValidationErrors) {
		if let Some(hooks) = self.hooks.get(handler) {
			for hook in hooks {
				hook(data, errors);
			}
		}
	}
}

impl std::fmt::Debug for HandlerHooks {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HandlerHooks")
			.field("handlers", &self.hooks.keys().collect::<Vec<_>>())
			.finish()
	}
}
