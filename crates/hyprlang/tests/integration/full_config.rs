use pretty_assertions::assert_eq;

use hyprlang::{ConfigOptions, Vec2};

use crate::common::{full_config, stream_config};

#[test]
fn parses_plain_values() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("testInt"), Some(123));
	assert_eq!(config.get::<f32>("testFloat"), Some(123.456));
	assert_eq!(config.get::<Vec2>("testVec"), Some(Vec2::new(1.5, -2.0)));
	assert_eq!(
		config.get::<String>("testString").as_deref(),
		Some("Hello World! # This is not a comment!")
	);
	assert_eq!(config.get::<String>("testStringQuotes").as_deref(), Some("\"Hello World!\""));
	assert_eq!(config.get::<String>("testStringColon").as_deref(), Some("ee:ee:ee"));
	assert_eq!(config.get::<String>("testEnv").as_deref(), Some("/bin/sh"));
	assert_eq!(config.get::<i64>("testDefault"), Some(123));
	assert_eq!(config.get::<i64>("testCategory:testValueInt"), Some(123_456));
	assert_eq!(config.get::<i64>("testCategory:testValueHex"), Some(0xFFFF_AABB));
	assert_eq!(config.get::<i64>("testCategory:nested1:testValueNest"), Some(1));
	assert_eq!(config.get::<i64>("testCategory:nested1:nested2:testValueNest"), Some(1));
}

#[test]
fn parses_colors() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("testCategory:testColor1"), Some(0xFFFF_FFFF));
	assert_eq!(config.get::<i64>("testCategory:testColor2"), Some(0xFF00_0000));
	assert_eq!(config.get::<i64>("testCategory:testColor3"), Some(0x22FF_EEFF));
}

#[test]
fn set_by_user_tracks_assignment() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert!(config.config_value("testInt").unwrap().set_by_user());
	assert!(!config.config_value("testDefault").unwrap().set_by_user());
	assert!(!config.config_value("flagsStuff:value").unwrap().set_by_user());
}

#[test]
fn registered_values_win_over_handlers() {
	let (mut config, observed) = full_config();
	config.parse().unwrap();

	assert_eq!(
		config.get::<String>("categoryKeyword").as_deref(),
		Some("oops, this one shouldn't call the handler, not fun")
	);
	assert_eq!(
		config.get::<String>("testCategory:nested1:categoryKeyword").as_deref(),
		Some("this one should not either")
	);
	assert_eq!(
		*observed.category_keywords.borrow(),
		["we are having fun", "so much fun", "im the fun one at parties"]
	);
}

#[test]
fn handlers_match_by_name_scope_and_flags() {
	let (mut config, observed) = full_config();
	config.parse().unwrap();

	assert!(observed.barrel_roll.get());
	assert_eq!(*observed.flags.borrow(), "abc");
	assert_eq!(*observed.ignore_keyword.borrow(), "aaa");
	// The scoped `testUseKeyword = no` goes to the category handler.
	assert_eq!(*observed.use_keyword.borrow(), "yes");
}

#[test]
fn unregistered_handler_no_longer_claims_lines() {
	let (mut config, _) = full_config();
	config.unregister_handler("doABarrelRoll");

	let error = config.parse().unwrap_err();
	assert!(error.to_string().contains("config option <doABarrelRoll> does not exist."), "{error}");
}

#[test]
fn expressions_and_escapes() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("testExpr"), Some(1335));
	assert_eq!(config.get::<String>("testEscapedExpr").as_deref(), Some("{{testInt + 7}}"));
	assert_eq!(config.get::<String>("testEscapedEscape").as_deref(), Some("\\5"));
	assert_eq!(
		config.get::<String>("testImbeddedEscapedExpression").as_deref(),
		Some("{{10 + 10}}")
	);
	assert_eq!(
		config.get::<String>("testDynamicEscapedExpression").as_deref(),
		Some("{{ moved: 500 expr: {{1000 / 2}} }}")
	);
}

#[test]
fn variables_resolve_longest_first_and_recursively() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("testVar"), Some(13_371_337));
	assert_eq!(config.get::<String>("testStringRecursive").as_deref(), Some("abc"));
}

#[test]
fn custom_values_run_the_host_parser() {
	let (mut config, _) = full_config();
	let handle = config.value_handle("customType").unwrap();

	let custom = config.value(handle).and_then(|v| v.as_custom()).unwrap();
	assert_eq!(custom.downcast_ref::<i64>(), Some(&2));
	assert_eq!(custom.last_text(), "def");

	config.parse().unwrap();
	let custom = config.value(handle).and_then(|v| v.as_custom()).unwrap();
	assert_eq!(custom.downcast_ref::<i64>(), Some(&1));
	assert_eq!(custom.last_text(), "abc");
}

#[test]
fn multiline_values_are_joined() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(
		config.get::<String>("multiline").as_deref(),
		Some("very        long            command")
	);
}

#[test]
fn if_directives_select_lines() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("testIf"), Some(1));
}

#[test]
fn nested_if_follows_its_own_condition() {
	let mut config = stream_config(
		"$SET = 1\n#hyprlang if UNSET\n#hyprlang if SET\nx = 7\n#hyprlang endif\ny = 7\n#hyprlang endif\n",
		ConfigOptions::default(),
	);
	config.add_config_value("x", 0i64);
	config.add_config_value("y", 0i64);
	config.commence();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("x"), Some(7));
	assert_eq!(config.get::<i64>("y"), Some(0));
}

#[test]
fn handles_survive_reparsing() {
	let (mut config, _) = full_config();
	let handle = config.value_handle("testInt").unwrap();
	assert_eq!(config.value(handle).and_then(|v| v.as_int()), Some(0));

	config.parse().unwrap();
	assert_eq!(config.value(handle).and_then(|v| v.as_int()), Some(123));

	config.parse_dynamic("testInt = 5").unwrap();
	assert_eq!(config.value(handle).and_then(|v| v.as_int()), Some(5));

	config.parse().unwrap();
	assert_eq!(config.value(handle).and_then(|v| v.as_int()), Some(123));
	assert_eq!(config.value_handle("testInt"), Some(handle));
}

#[test]
fn parsing_twice_is_idempotent() {
	let (mut config, observed) = full_config();
	config.parse().unwrap();

	let names = ["testVar", "testExpr", "testCategory:testColor3", "myColors:pink"];
	let first: Vec<_> = names.iter().map(|n| config.get::<i64>(n)).collect();
	let keys = config.list_keys_for_special_category("specialAnonymous");

	observed.category_keywords.borrow_mut().clear();
	config.parse().unwrap();

	let second: Vec<_> = names.iter().map(|n| config.get::<i64>(n)).collect();
	assert_eq!(first, second);
	assert_eq!(config.list_keys_for_special_category("specialAnonymous").len(), keys.len());
	assert_eq!(observed.category_keywords.borrow().len(), 3);
}
