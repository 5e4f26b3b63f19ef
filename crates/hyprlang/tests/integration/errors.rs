use pretty_assertions::assert_eq;
use rstest::rstest;

use hyprlang::{ConfigOptions, Diagnostic, GrammarError, LineError, Origin};

use crate::common::{file_config, fixture, stream_config};

fn verify_all() -> ConfigOptions {
	ConfigOptions::default()
		.with_verify_only(true)
		.with_throw_all_errors(true)
}

#[test]
fn error_conf_reports_every_problem() {
	let mut config = file_config(fixture("error.conf"), verify_all());
	config.commence();

	let error = config.parse().unwrap_err();
	assert_eq!(error.to_string().matches('\n').count(), 1);
	assert_eq!(
		error.line_errors().cloned().collect::<Vec<_>>(),
		[
			LineError::Grammar(GrammarError::StrayCategoryClose),
			LineError::Grammar(GrammarError::InvalidLine),
		]
	);
}

#[test]
fn only_the_first_error_by_default() {
	let mut config = file_config(fixture("error.conf"), ConfigOptions::default().with_verify_only(true));
	config.commence();

	let error = config.parse().unwrap_err();
	assert_eq!(error.diagnostics().len(), 1);
	assert!(matches!(
		&error.diagnostics()[0],
		Diagnostic::Line { line: 4, .. }
	));
}

#[test]
fn invalid_numbers_are_each_reported() {
	let mut config = file_config(
		fixture("invalid-numbers.conf"),
		ConfigOptions::default().with_throw_all_errors(true),
	);
	for name in [
		"invalidHex",
		"emptyHex",
		"hugeHex",
		"invalidInt",
		"emptyInt",
		"invalidColor",
		"invalidFirstCharColor",
		"invalidColorAlpha",
		"invalidFirstCharColorAlpha",
	] {
		config.add_config_value(name, 0i64);
	}
	config.commence();

	let error = config.parse().unwrap_err();
	assert_eq!(error.diagnostics().len(), 9);
	assert_eq!(error.to_string().matches('\n').count(), 8);
	assert!(error.line_errors().all(|e| matches!(e, LineError::Coercion { .. })));
	assert_eq!(config.get::<i64>("invalidHex"), Some(0));
}

#[test]
fn continued_lines_report_their_first_line() {
	let mut config = file_config(fixture("multiline-errors.conf"), verify_all());
	config.commence();

	let error = config.parse().unwrap_err();
	let diagnostics = error.diagnostics();
	assert_eq!(diagnostics.len(), 2);
	assert!(matches!(
		&diagnostics[0],
		Diagnostic::Line {
			line: 12,
			error: LineError::Grammar(GrammarError::InvalidLine),
			..
		}
	));
	assert!(matches!(&diagnostics[1], Diagnostic::TrailingBackslash(Origin::File(_))));
	assert!(error.to_string().contains("backslash"));
}

#[rstest]
#[case::stray_close("}\n", "Config error at line 1: Stray category close")]
#[case::unclosed("general {\n", "Config error: Unclosed category at EOF")]
#[case::garbage("general { gaps\n", "Config error at line 1: Invalid category open, garbage after {")]
#[case::empty_lhs(" = 4\n", "Config error at line 1: Empty lhs.")]
#[case::stray_endif("#hyprlang endif\n", "Config error at line 1: stray endif")]
#[case::missing_key("gaps = 4\n", "Config error at line 1: config option <gaps> does not exist.")]
#[case::bad_operator(
	"x = {{1 % 2}}\n",
	"Config error at line 1: Invalid expression type: supported +, -, *, /"
)]
#[case::bad_operand(
	"x = {{1 + y}}\n",
	"Config error at line 1: Failed to parse expression: value 2 does not look like a number or the variable doesn't exist"
)]
fn stream_diagnostics(#[case] text: &str, #[case] expected: &str) {
	let mut config = stream_config(text, ConfigOptions::default());
	config.add_config_value("x", "");
	config.commence();

	assert_eq!(config.parse().unwrap_err().to_string(), expected);
}

#[test]
fn noerror_suppresses_reporting_but_not_effects() {
	let mut config = stream_config(
		"#hyprlang noerror true\nnope = 1\nx = kept\n#hyprlang noerror false\nalso_nope = 1\n",
		ConfigOptions::default().with_throw_all_errors(true),
	);
	config.add_config_value("x", "");
	config.commence();

	let error = config.parse().unwrap_err();
	assert_eq!(error.diagnostics().len(), 1);
	assert_eq!(
		error.line_errors().next(),
		Some(&LineError::MissingKey("also_nope".into()))
	);
	assert_eq!(config.get::<String>("x").as_deref(), Some("kept"));
}

#[test]
fn lines_after_an_error_still_apply() {
	let mut config = stream_config("nope = 1\nx = after\n", ConfigOptions::default());
	config.add_config_value("x", "");
	config.commence();

	assert!(config.parse().is_err());
	assert_eq!(config.get::<String>("x").as_deref(), Some("after"));
}

#[test]
fn verify_only_leaves_values_alone() {
	let mut config = stream_config("x = changed\n", ConfigOptions::default().with_verify_only(true));
	config.add_config_value("x", "default");
	config.commence();

	config.parse().unwrap();
	assert_eq!(config.get::<String>("x").as_deref(), Some("default"));
}

#[test]
fn expansion_cycle_is_cut_off() {
	let mut config = stream_config("$A = $B\n$B = $A\nx = $A\n", ConfigOptions::default());
	config.add_config_value("x", "");
	config.commence();

	// `$B` ends up holding its own reference.
	let error = config.parse().unwrap_err();
	assert!(error.line_errors().any(|e| *e == LineError::ExpansionOverflow), "{error}");
}

#[test]
fn missing_file_handling() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("absent.conf");

	let mut config = file_config(&path, ConfigOptions::default());
	config.commence();
	let error = config.parse().unwrap_err();
	assert_eq!(error.diagnostics(), [Diagnostic::MissingSource(path.clone())]);
	assert_eq!(error.to_string(), "Config file is missing");

	let mut config = file_config(&path, ConfigOptions::default().with_allow_missing_config(true));
	config.commence();
	config.parse().unwrap();
}

#[test]
#[should_panic(expected = "commence")]
fn parse_before_commence_panics() {
	let mut config = stream_config("", ConfigOptions::default());
	let _ = config.parse();
}

#[test]
#[should_panic(expected = "after commence")]
fn registering_after_commence_panics() {
	let mut config = stream_config("", ConfigOptions::default());
	config.commence();
	config.add_config_value("late", 0i64);
}
