use std::fs;

use pretty_assertions::assert_eq;

use hyprlang::{ConfigOptions, Diagnostic, HandlerOptions, LineError, Origin};

use crate::common::{file_config, full_config, source_handler};

#[test]
fn sourced_file_values_apply() {
	let (mut config, _) = full_config();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("myColors:pink"), Some(0xFFC8_00C8));
	assert_eq!(config.get::<i64>("myColors:green"), Some(0xFF14_F014));
	assert_eq!(config.get::<i64>("myColors:random"), Some(0xFFFF_1337));
}

#[test]
fn errors_in_sourced_files_name_that_file() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("main.conf"), "source = extra.conf\nvalue = 1\n").unwrap();
	fs::write(dir.path().join("extra.conf"), "\nnope = 2\n").unwrap();

	let mut config = file_config(dir.path().join("main.conf"), ConfigOptions::default());
	config.add_config_value("value", 0i64);
	config.register_handler("source", HandlerOptions::default(), source_handler(dir.path().to_owned()));
	config.commence();

	let error = config.parse().unwrap_err();
	// The handler forwards the nested failure, but the first error is the
	// one inside the sourced file.
	match &error.diagnostics()[0] {
		Diagnostic::Line {
			origin: Origin::File(path),
			line,
			error,
		} => {
			assert!(path.ends_with("extra.conf"), "{}", path.display());
			assert_eq!(*line, 2);
			assert_eq!(*error, LineError::MissingKey("nope".into()));
		}
		other => panic!("unexpected diagnostic: {other}"),
	}
	assert_eq!(config.get::<i64>("value"), Some(1));
}

#[test]
fn sourced_files_keep_their_own_categories() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(
		dir.path().join("main.conf"),
		"general {\n  source = inner.conf\n  gaps = 2\n}\n",
	)
	.unwrap();
	fs::write(dir.path().join("inner.conf"), "border = 3\n").unwrap();

	let mut config = file_config(dir.path().join("main.conf"), ConfigOptions::default());
	config.add_config_value("general:gaps", 0i64);
	config.add_config_value("border", 0i64);
	config.register_handler("source", HandlerOptions::default(), source_handler(dir.path().to_owned()));
	config.commence();
	config.parse().unwrap();

	assert_eq!(config.get::<i64>("border"), Some(3));
	assert_eq!(config.get::<i64>("general:gaps"), Some(2));
}

#[test]
fn unclosed_category_in_sourced_file() {
	let dir = tempfile::tempdir().unwrap();
	fs::write(dir.path().join("main.conf"), "source = inner.conf\n").unwrap();
	fs::write(dir.path().join("inner.conf"), "general {\n").unwrap();

	let mut config = file_config(dir.path().join("main.conf"), ConfigOptions::default());
	config.register_handler("source", HandlerOptions::default(), source_handler(dir.path().to_owned()));
	config.commence();

	let error = config.parse().unwrap_err();
	assert!(matches!(
		&error.diagnostics()[0],
		Diagnostic::UnclosedCategory(Origin::File(path)) if path.ends_with("inner.conf")
	));
}

#[test]
fn parse_file_applies_on_top_of_current_state() {
	let dir = tempfile::tempdir().unwrap();
	let main = dir.path().join("main.conf");
	let overlay = dir.path().join("overlay.conf");
	fs::write(&main, "a = 1\nb = 1\n").unwrap();
	fs::write(&overlay, "b = 2\n").unwrap();

	let mut config = file_config(&main, ConfigOptions::default());
	config.add_config_value("a", 0i64);
	config.add_config_value("b", 0i64);
	config.commence();
	config.parse().unwrap();

	config.parse_file(&overlay).unwrap();
	assert_eq!(config.get::<i64>("a"), Some(1));
	assert_eq!(config.get::<i64>("b"), Some(2));

	let error = config.parse_file(dir.path().join("absent.conf")).unwrap_err();
	assert!(matches!(&error.diagnostics()[0], Diagnostic::SourceUnreadable { .. }));
	assert!(error.to_string().starts_with("File failed to open"), "{error}");
}
