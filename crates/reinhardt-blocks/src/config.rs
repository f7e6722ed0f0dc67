//! Theme catalogue configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! front_theme = "FrontendTheme"
//! back_theme = "BackendTheme"
//!
//! [[themes]]
//! name = "FrontendTheme"
//! human_name = "Frontend Theme"
//! description = "Default public theme"
//!
//! [themes.regions]
//! main-menu = "Main Menu"
//! sidebar = "Sidebar"
//! ```

use crate::error::{BlockError, BlockResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default front-site theme name
pub const DEFAULT_FRONT_THEME: &str = "FrontendTheme";

/// Default back-office theme name
pub const DEFAULT_BACK_THEME: &str = "BackendTheme";

/// A theme and the regions its layout exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
	/// Machine name
	pub name: String,

	/// Display name; falls back to the machine name
	#[serde(default)]
	pub human_name: String,

	/// Short description
	#[serde(default)]
	pub description: String,

	/// Region machine name → label, in layout order
	#[serde(default)]
	pub regions: IndexMap<String, String>,
}

impl ThemeConfig {
	/// Create a theme with no regions
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			human_name: String::new(),
			description: String::new(),
			regions: IndexMap::new(),
		}
	}

	/// Set the display name
	pub fn with_human_name(mut self, human_name: impl Into<String>) -> Self {
		self.human_name = human_name.into();
		self
	}

	/// Set the description
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}

	/// Add a region
	pub fn with_region(mut self, name: impl Into<String>, label: impl Into<String>) -> Self {
		self.regions.insert(name.into(), label.into());
		self
	}

	/// Display name of the theme
	pub fn display_name(&self) -> &str {
		if self.human_name.is_empty() {
			&self.name
		} else {
			&self.human_name
		}
	}

	/// Whether the theme exposes the region
	pub fn has_region(&self, region: &str) -> bool {
		self.regions.contains_key(region)
	}
}

/// Block management configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
	/// Theme rendering the public site
	pub front_theme: String,

	/// Theme rendering the back office
	pub back_theme: String,

	/// Installed themes
	pub themes: Vec<ThemeConfig>,
}

impl Default for BlockConfig {
	fn default() -> Self {
		Self {
			front_theme: DEFAULT_FRONT_THEME.to_string(),
			back_theme: DEFAULT_BACK_THEME.to_string(),
			themes: Vec::new(),
		}
	}
}

impl BlockConfig {
	/// Parse configuration from TOML
	///
	/// # Errors
	///
	/// Returns [`BlockError::Toml`] on malformed TOML and
	/// [`BlockError::Config`] when a theme name is empty or repeated.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_blocks::config::BlockConfig;
	///
	/// let config = BlockConfig::from_toml_str(r#"
	///     front_theme = "Aurora"
	///
	///     [[themes]]
	///     name = "Aurora"
	///     regions = { sidebar = "Sidebar" }
	/// "#).unwrap();
	///
	/// assert_eq!(config.front_theme, "Aurora");
	/// assert_eq!(config.back_theme, "BackendTheme");
	/// assert!(config.theme("Aurora").unwrap().has_region("sidebar"));
	/// ```
	pub fn from_toml_str(source: &str) -> BlockResult<Self> {
		let config: Self = toml::from_str(source)?;
		config.check()?;
		Ok(config)
	}

	/// Read and parse a TOML configuration file
	pub fn from_file(path: impl AsRef<Path>) -> BlockResult<Self> {
		let path = path.as_ref();
		let source = std::fs::read_to_string(path)?;
		let config = Self::from_toml_str(&source)?;
		tracing::debug!(
			path = %path.display(),
			themes = config.themes.len(),
			"Loaded block configuration"
		);
		Ok(config)
	}

	/// Add a theme
	pub fn with_theme(mut self, theme: ThemeConfig) -> Self {
		self.themes.push(theme);
		self
	}

	/// Look up a theme by machine name
	pub fn theme(&self, name: &str) -> Option<&ThemeConfig> {
		self.themes.iter().find(|theme| theme.name == name)
	}

	fn check(&self) -> BlockResult<()> {
		let mut seen = HashSet::new();
		for theme in &self.themes {
			if theme.name.is_empty() {
				return Err(BlockError::Config("theme name cannot be empty".to_string()));
			}
			if !seen.insert(theme.name.as_str()) {
				return Err(BlockError::Config(format!(
					"theme '{}' is declared more than once",
					theme.name
				)));
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	const CATALOGUE: &str = r#"
front_theme = "FrontendTheme"
back_theme = "BackendTheme"

[[themes]]
name = "FrontendTheme"
human_name = "Frontend Theme"
description = "Public site"

[themes.regions]
main-menu = "Main Menu"
sidebar = "Sidebar"
footer = "Footer"

[[themes]]
name = "BackendTheme"

[themes.regions]
dashboard-main = "Dashboard Main"
"#;

	#[rstest]
	fn test_parse_catalogue_keeps_region_order() {
		// Act
		let config = BlockConfig::from_toml_str(CATALOGUE).unwrap();

		// Assert
		let front = config.theme("FrontendTheme").unwrap();
		assert_eq!(front.display_name(), "Frontend Theme");
		assert_eq!(
			front.regions.keys().collect::<Vec<_>>(),
			vec!["main-menu", "sidebar", "footer"]
		);
		let back = config.theme("BackendTheme").unwrap();
		assert_eq!(back.display_name(), "BackendTheme");
		assert!(back.description.is_empty());
	}

	#[rstest]
	fn test_empty_source_uses_defaults() {
		// Act
		let config = BlockConfig::from_toml_str("").unwrap();

		// Assert
		assert_eq!(config, BlockConfig::default());
	}

	#[rstest]
	#[case("[[themes]]\nname = \"A\"\n[[themes]]\nname = \"A\"\n")]
	#[case("[[themes]]\nname = \"\"\n")]
	fn test_invalid_catalogue_rejected(#[case] source: &str) {
		// Act
		let result = BlockConfig::from_toml_str(source);

		// Assert
		assert!(matches!(result, Err(BlockError::Config(_))));
	}

	#[rstest]
	fn test_malformed_toml_rejected() {
		// Act
		let result = BlockConfig::from_toml_str("themes = 3");

		// Assert
		assert!(matches!(result, Err(BlockError::Toml(_))));
	}

	#[rstest]
	fn test_from_file() {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(CATALOGUE.as_bytes()).unwrap();

		// Act
		let config = BlockConfig::from_file(file.path()).unwrap();

		// Assert
		assert_eq!(config.themes.len(), 2);
	}

	#[rstest]
	fn test_from_missing_file_is_io_error() {
		// Act
		let result = BlockConfig::from_file("/nonexistent/blocks.toml");

		// Assert
		assert!(matches!(result, Err(BlockError::Io(_))));
	}
}
