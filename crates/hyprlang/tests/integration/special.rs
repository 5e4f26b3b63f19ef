use pretty_assertions::assert_eq;

use hyprlang::{ConfigOptions, LineError, SpecialCategoryOptions};

use crate::common::{full_config, stream_config};

#[test]
fn keyed_instances_from_blocks_and_brackets() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get_special::<i64>("special", "value", Some("a")), Some(1));
	assert_eq!(config.get_special::<i64>("special", "value", Some("b")), Some(2));
	assert_eq!(config.get_special::<String>("special", "key", Some("b")).as_deref(), Some("b"));
	assert_eq!(config.list_keys_for_special_category("special"), ["a", "b"]);
	assert!(config.special_category_exists_for_key("special", "a"));
	assert!(!config.special_category_exists_for_key("special", "c"));
}

#[test]
fn static_categories_and_ignored_leaves() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get_special::<i64>("specialGeneric:one", "value", None), Some(1));
	assert_eq!(config.get_special::<i64>("specialGeneric:two", "value", None), Some(2));
	assert_eq!(config.get_special::<i64>("specialGeneric:one", "copyTest", None), Some(2));
	assert!(config.list_keys_for_special_category("specialGeneric:one").is_empty());
}

#[test]
fn anonymous_blocks_get_their_own_instances() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	let keys = config.list_keys_for_special_category("specialAnonymous");
	assert_eq!(keys.len(), 2);
	assert_eq!(config.get_special::<i64>("specialAnonymous", "value", Some(keys[0].as_str())), Some(2));
	assert_eq!(config.get_special::<i64>("specialAnonymous", "value", Some(keys[1].as_str())), Some(3));
}

#[test]
fn anonymous_blocks_with_nested_leaves() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	let keys = config.list_keys_for_special_category("specialAnonymousNested");
	assert_eq!(keys.len(), 2);

	let get = |leaf: &str, key: &str| config.get_special::<i64>("specialAnonymousNested", leaf, Some(key));
	assert_eq!(get("nested:value1", &keys[0]), Some(1));
	assert_eq!(get("nested:value2", &keys[0]), Some(2));
	assert_eq!(get("nested:value1", &keys[1]), Some(3));
	assert_eq!(get("nested:value2", &keys[1]), Some(4));
	assert_eq!(get("nested1:nested2:value1", &keys[0]), Some(10));
	assert_eq!(get("nested1:nested2:value2", &keys[0]), Some(11));
	assert_eq!(get("nested1:nested2:value1", &keys[1]), Some(12));
	assert_eq!(get("nested1:nested2:value2", &keys[1]), Some(13));
}

#[test]
fn instances_are_rebuilt_on_every_parse() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	let stale = config.special_value_handle("special", "value", Some("a")).unwrap();
	let kept = config.special_value_handle("specialGeneric:one", "value", None).unwrap();

	config.parse().unwrap();
	assert!(config.value(stale).is_none());
	assert_eq!(config.value(kept).and_then(|v| v.as_int()), Some(1));
	assert_eq!(config.list_keys_for_special_category("special"), ["a", "b"]);
}

#[test]
fn key_must_come_first() {
	let mut config = stream_config(
		"device {\n  sensitivity = 1\n  name = mouse\n}\n",
		ConfigOptions::default().with_throw_all_errors(true),
	);
	config.add_special_category("device", SpecialCategoryOptions::keyed("name"));
	config.add_special_config_value("device", "sensitivity", 0.0f32);
	config.commence();

	let error = config.parse().unwrap_err();
	let first = error.line_errors().next().unwrap();
	assert_eq!(
		*first,
		LineError::KeyNotFirst {
			category: "device".into(),
			key: "name".into(),
		}
	);
}

#[test]
fn bracketed_category_block() {
	let mut config = stream_config(
		"device[mouse] {\n  sensitivity = 0.5\n}\ndevice[pad]:sensitivity = -1\n",
		ConfigOptions::default(),
	);
	config.add_special_category("device", SpecialCategoryOptions::keyed("name"));
	config.add_special_config_value("device", "sensitivity", 0.0f32);
	config.commence();
	config.parse().unwrap();

	assert_eq!(config.list_keys_for_special_category("device"), ["mouse", "pad"]);
	assert_eq!(config.get_special::<f32>("device", "sensitivity", Some("mouse")), Some(0.5));
	assert_eq!(config.get_special::<f32>("device", "sensitivity", Some("pad")), Some(-1.0));
}

#[test]
fn removal_drops_descriptors_and_cells() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	let handle = config.special_value_handle("specialGeneric:two", "value", None).unwrap();
	config.remove_special_category("specialGeneric:two");
	assert!(!config.has_special_category("specialGeneric:two"));
	assert!(config.value(handle).is_none());

	config.remove_special_config_value("special", "value");
	assert_eq!(config.get_special::<i64>("special", "value", Some("a")), None);

	// With the leaf gone, its lines no longer resolve.
	let error = config.parse().unwrap_err();
	assert!(error.to_string().contains("does not exist"), "{error}");
}

#[test]
fn single_line_block_sets_nested_value() {
	let mut config = stream_config("a { b = 5 }\n", ConfigOptions::default());
	config.add_config_value("a:b", 0i64);
	config.commence();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("a:b"), Some(5));
}
