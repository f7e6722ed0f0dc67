//! Tests for the block admin flows

use reinhardt_blocks::block::{Block, BlockId, RegionAssignment};
use reinhardt_blocks::config::{BlockConfig, ThemeConfig};
use reinhardt_blocks::error::BlockError;
use reinhardt_blocks::lifecycle::DeltaGenerator;
use reinhardt_blocks::manage::BlockManager;
use reinhardt_blocks::reconcile::submission;
use reinhardt_blocks::store::{BlockStore, InMemoryBlockStore};
use reinhardt_blocks::validation::{HandlerHooks, push_error};
use rstest::{fixture, rstest};
use serde_json::json;

struct HandlerDelta;

impl DeltaGenerator for HandlerDelta {
	fn generate(&self, block: &Block) -> String {
		format!("{}-delta", block.handler.to_lowercase())
	}
}

fn config() -> BlockConfig {
	BlockConfig::default()
		.with_theme(
			ThemeConfig::new("FrontendTheme")
				.with_human_name("Frontend Theme")
				.with_region("sidebar", "Sidebar")
				.with_region("footer", "Footer"),
		)
		.with_theme(ThemeConfig::new("BackendTheme").with_region("toolbar", "Toolbar"))
}

#[fixture]
fn manager() -> BlockManager<InMemoryBlockStore> {
	BlockManager::new(InMemoryBlockStore::new(), config()).with_delta_generator(HandlerDelta)
}

fn plugin_block(manager: &BlockManager<InMemoryBlockStore>, handler: &str) -> Block {
	let mut block = Block::new(handler).with_column("title", json!(handler));
	block.delta = Some(format!("{}-1", handler.to_lowercase()));
	block
		.regions
		.push(RegionAssignment::new(None, "FrontendTheme", "sidebar"));
	manager.store().save(block).unwrap()
}

#[rstest]
fn test_add_creates_custom_block(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let form = submission(json!({
		"title": "Welcome",
		"body": "<p>Hi</p>",
		"handler": "Menu",
		"cta_label": "Read more",
		"roles": ["1", "2"],
		"region": {"FrontendTheme": "sidebar", "BackendTheme": ""}
	}));

	// Act
	let block = manager.add(&form).unwrap();

	// Assert
	assert_eq!(block.id, Some(BlockId::from(1u64)));
	assert_eq!(block.handler, "Block");
	assert_eq!(block.delta.as_deref(), Some("block-delta"));
	assert_eq!(block.title(), Some("Welcome"));
	assert_eq!(block.settings["cta_label"], json!("Read more"));
	assert_eq!(block.roles.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
	assert_eq!(block.regions.len(), 2);
	assert!(block.regions.iter().all(|a| a.id.is_some()));
	assert_eq!(manager.store().get(&BlockId::from(1u64)).unwrap(), block);
}

#[rstest]
fn test_add_with_errors_stores_nothing(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let form = submission(json!({"title": "", "extra": 1}));

	// Act
	let result = manager.add(&form);

	// Assert
	let err = result.unwrap_err();
	let errors = err.validation_errors().unwrap();
	assert!(errors.contains_key("title"));
	assert!(errors.contains_key("body"));
	assert!(manager.store().is_empty());
}

#[rstest]
fn test_edit_updates_assignment_in_place(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let created = manager
		.add(&submission(json!({
			"title": "Promo",
			"body": "x",
			"region": {"FrontendTheme": "sidebar"}
		})))
		.unwrap();
	let id = created.id.clone().unwrap();
	let assignment_id = created.regions[0].id;

	// Act
	let edited = manager
		.edit(
			&id,
			&submission(json!({
				"title": "Promo v2",
				"body": "y",
				"handler": "Search",
				"region": {"FrontendTheme": "footer", "BackendTheme": "toolbar"}
			})),
		)
		.unwrap();

	// Assert
	assert_eq!(edited.handler, "Block");
	assert_eq!(edited.title(), Some("Promo v2"));
	assert_eq!(edited.regions.len(), 2);
	assert_eq!(edited.regions[0].id, assignment_id);
	assert_eq!(edited.regions[0].region, "footer");
	assert_ne!(edited.regions[1].id, assignment_id);
	assert_eq!(edited.regions[1].theme, "BackendTheme");
}

#[rstest]
fn test_edit_plugin_block_uses_default_profile_and_hooks() {
	// Arrange
	let mut hooks = HandlerHooks::new();
	hooks.register("Menu", |data, errors| {
		if data.settings.get("menu_id").is_none() {
			push_error(errors, "menu_id", "Select a menu.");
		}
	});
	let manager = BlockManager::new(InMemoryBlockStore::new(), config()).with_hooks(hooks);
	let menu = plugin_block(&manager, "Menu");
	let id = menu.id.clone().unwrap();

	// Act
	let rejected = manager.edit(&id, &submission(json!({"title": "Main menu"})));
	let accepted = manager.edit(&id, &submission(json!({"title": "Main menu", "menu_id": 4})));

	// Assert
	let err = rejected.unwrap_err();
	let errors = err.validation_errors().unwrap();
	assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["menu_id"]);
	let block = accepted.unwrap();
	assert_eq!(block.handler, "Menu");
	assert_eq!(block.settings["menu_id"], json!(4));
	assert_eq!(block.delta.as_deref(), Some("menu-1"));
}

#[rstest]
fn test_edit_reports_hook_errors_before_field_errors() {
	// Arrange
	let mut hooks = HandlerHooks::new();
	hooks.register("Menu", |_, errors| {
		push_error(errors, "menu_id", "Select a menu.");
		push_error(errors, "title", "Menu titles are checked by the plugin.");
	});
	let manager = BlockManager::new(InMemoryBlockStore::new(), config()).with_hooks(hooks);
	let menu = plugin_block(&manager, "Menu");

	// Act
	let result = manager.edit(menu.id.as_ref().unwrap(), &submission(json!({"title": ""})));

	// Assert
	let err = result.unwrap_err();
	let errors = err.validation_errors().unwrap();
	assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["menu_id", "title"]);
	assert_eq!(errors["title"][0], "Menu titles are checked by the plugin.");
	assert_eq!(errors["title"].len(), 2);
}

#[rstest]
fn test_edit_missing_block_is_not_found(manager: BlockManager<InMemoryBlockStore>) {
	// Act
	let result = manager.edit(&BlockId::from("404"), &submission(json!({"title": "x"})));

	// Assert
	assert!(matches!(result, Err(BlockError::NotFound(id)) if id == "404"));
}

#[rstest]
fn test_edit_form_flattens_settings(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let created = manager
		.add(&submission(json!({
			"title": "Links",
			"body": "-",
			"columns": 3,
			"region": {"BackendTheme": "toolbar"}
		})))
		.unwrap();

	// Act
	let form = manager.edit_form(created.id.as_ref().unwrap()).unwrap();

	// Assert
	assert_eq!(form.values["title"], json!("Links"));
	assert_eq!(form.values["columns"], json!(3));
	assert_eq!(form.regions.len(), 2);
	assert_eq!(form.regions[0].theme_human_name, "Frontend Theme");
	assert_eq!(form.regions[0].value, "");
	assert_eq!(form.regions[1].value, "toolbar");
}

#[rstest]
fn test_delete_custom_block(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let created = manager
		.add(&submission(json!({"title": "Temp", "body": "-"})))
		.unwrap();
	let id = created.id.clone().unwrap();

	// Act
	let removed = manager.delete(&id).unwrap();

	// Assert
	assert_eq!(removed.id, Some(id.clone()));
	assert!(matches!(manager.store().get(&id), Err(BlockError::NotFound(_))));
}

#[rstest]
#[case("Menu")]
#[case("Search")]
fn test_delete_plugin_block_is_refused(
	manager: BlockManager<InMemoryBlockStore>,
	#[case] handler: &str,
) {
	// Arrange
	let block = plugin_block(&manager, handler);
	let id = block.id.clone().unwrap();

	// Act
	let result = manager.delete(&id);

	// Assert
	match result {
		Err(BlockError::NotDeletable {
			id: refused,
			handler: owner,
		}) => {
			assert_eq!(refused, id.to_string());
			assert_eq!(owner, handler);
		}
		other => panic!("expected NotDeletable, got {other:?}"),
	}
	assert!(manager.store().get(&id).is_ok());
}

#[rstest]
fn test_duplicate_lands_in_unused(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let menu = plugin_block(&manager, "Menu");
	let id = menu.id.clone().unwrap();

	// Act
	let copy = manager.duplicate(&id).unwrap();
	let listing = manager.listing().unwrap();

	// Assert
	assert_eq!(copy.copy_id, Some(id));
	assert_eq!(copy.handler, "Menu");
	assert_eq!(copy.delta.as_deref(), Some("menu-delta"));
	assert_ne!(copy.id, menu.id);
	assert!(copy.regions.is_empty());
	assert_eq!(listing.unused, vec![copy]);
	assert_eq!(listing.front["sidebar"], vec![menu]);
}

#[rstest]
fn test_index_reorders_region(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let first = plugin_block(&manager, "Menu");
	let second = plugin_block(&manager, "Search");
	let third = plugin_block(&manager, "Login");
	let payload = submission(json!({
		"regions": {
			"FrontendTheme": {
				"sidebar": [
					third.id.as_ref().unwrap().as_str(),
					first.id.as_ref().unwrap().as_str(),
					second.id.as_ref().unwrap().as_str()
				]
			}
		}
	}));

	// Act
	let reordered = manager.index(&payload).unwrap();
	let listing = manager.listing().unwrap();

	// Assert
	assert!(reordered);
	let sidebar: Vec<_> = listing.front["sidebar"]
		.iter()
		.map(|block| block.handler.as_str())
		.collect();
	assert_eq!(sidebar, vec!["Login", "Menu", "Search"]);
	assert!(listing.front["footer"].is_empty());
	assert!(listing.back["toolbar"].is_empty());
}

#[rstest]
fn test_index_without_payload_is_not_a_reorder(manager: BlockManager<InMemoryBlockStore>) {
	// Act
	let reordered = manager.index(&submission(json!({"regions": {}}))).unwrap();

	// Assert
	assert!(!reordered);
}

#[rstest]
#[case(json!(""))]
#[case(json!({"FrontendTheme": []}))]
#[case(json!({"FrontendTheme": {"sidebar": {}}}))]
fn test_index_with_empty_regions_is_not_a_reorder(
	manager: BlockManager<InMemoryBlockStore>,
	#[case] regions: serde_json::Value,
) {
	// Act
	let reordered = manager.index(&submission(json!({"regions": regions}))).unwrap();

	// Assert
	assert!(!reordered);
}

#[rstest]
fn test_index_unknown_block_changes_nothing(manager: BlockManager<InMemoryBlockStore>) {
	// Arrange
	let block = plugin_block(&manager, "Menu");
	let id = block.id.clone().unwrap();
	let payload = submission(json!({
		"regions": {"FrontendTheme": {"footer": [id.as_str(), "999"]}}
	}));

	// Act
	let result = manager.index(&payload);

	// Assert
	assert!(matches!(result, Err(BlockError::NotFound(missing)) if missing == "999"));
	assert_eq!(manager.store().get(&id).unwrap().regions[0].region, "sidebar");
}
