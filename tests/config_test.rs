use std::path::Path;
use std::time::Duration;

use test_board::color::Color;
use test_board::config::loader::load_config;
use test_board::config::types::AppConfig;
use test_board::filter::Combinator;
use test_board::types::TestType;

#[test]
fn default_config_has_sane_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.server.url, "http://localhost:9090/testrunner");
    assert_eq!(config.runner.poll_interval(), Duration::from_millis(3000));
    assert_eq!(config.runner.debounce(), Duration::from_millis(1500));
    assert_eq!(config.runner.page_size, 100);
    assert_eq!(config.defaults.operator, Combinator::Or);
    assert!(!config.defaults.case_sensitive);
    assert_eq!(config.defaults.categories.len(), 4);
}

#[test]
fn parse_partial_config_keeps_defaults() {
    let toml = r#"
[runner]
poll_interval_ms = 500
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.runner.poll_interval(), Duration::from_millis(500));
    assert_eq!(config.runner.debounce_ms, 1500);
    assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
}

#[test]
fn parse_unknown_keys_ignored() {
    let toml = r#"
unknown_top_level = "should be ignored"

[server]
url = "http://localhost:1234"
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.url, "http://localhost:1234");
}

#[test]
fn parse_operator() {
    let config: AppConfig = toml::from_str("[defaults]\noperator = \"and\"\n").unwrap();
    assert_eq!(config.defaults.operator, Combinator::And);

    let result: Result<AppConfig, _> = toml::from_str("[defaults]\noperator = \"xor\"\n");
    assert!(result.is_err());
}

#[test]
fn zero_timeouts_are_clamped() {
    let toml = r#"
[server]
request_timeout_secs = 0

[runner]
poll_interval_ms = 0
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.request_timeout(), Duration::from_secs(1));
    assert_eq!(config.runner.poll_interval(), Duration::from_millis(1));
}

#[test]
fn filter_input_from_defaults() {
    let toml = r#"
[defaults]
operator = "and"
case_sensitive = true
categories = ["unit", "WD", "bogus"]
"#;
    let config: AppConfig = toml::from_str(toml).unwrap();
    let input = config.defaults.filter_input(Some("login,logout"));
    assert_eq!(input.query, "login,logout");
    assert_eq!(input.combinator, Combinator::And);
    assert!(input.case_sensitive);
    assert!(input.is_enabled(TestType::Unit));
    assert!(input.is_enabled(TestType::WebDriver));
    assert!(!input.is_enabled(TestType::JsTest));
    assert_eq!(input.enabled.len(), 2);
}

#[test]
fn parse_theme_colors_ansi_and_hex() {
    let toml = r##"
[theme.colors.text]
primary = "7"
secondary = 245
error = "#c0caf5"
"##;
    let config: AppConfig = toml::from_str(toml).unwrap();
    let text = &config.theme.colors.text;
    assert_eq!(text.primary, Some(Color::Ansi256(7)));
    assert_eq!(text.secondary, Some(Color::Ansi256(245)));
    assert_eq!(
        text.error,
        Some(Color::Hex {
            r: 0xc0,
            g: 0xca,
            b: 0xf5
        })
    );
}

#[test]
fn parse_invalid_color_fails() {
    let toml = r#"
[theme.colors.state]
failed = "not_a_color"
"#;
    let result: Result<AppConfig, _> = toml::from_str(toml);
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

#[test]
fn load_fixture() {
    let config = load_config(Some(Path::new("tests/fixtures/config.toml"))).unwrap();
    assert_eq!(config.server.url, "http://ci.example.com:9090/testrunner/");
    assert_eq!(config.server.request_timeout(), Duration::from_secs(10));
    assert_eq!(config.runner.poll_interval(), Duration::from_millis(2000));
    assert_eq!(config.runner.page_size, 50);
    assert_eq!(config.defaults.operator, Combinator::And);
    assert_eq!(config.theme.colors.state.failed, Some(Color::Ansi256(160)));
}

#[test]
fn invalid_toml_produces_error() {
    let result = load_config(Some(Path::new("tests/fixtures/invalid_toml.toml")));
    let err_msg = format!("{:#}", result.unwrap_err());
    assert!(
        err_msg.contains("invalid_toml.toml"),
        "error should mention file: {err_msg}"
    );
}

#[test]
fn missing_config_file_produces_error() {
    let result = load_config(Some(Path::new("tests/fixtures/nonexistent.toml")));
    assert!(result.is_err());
}

#[test]
fn theme_file_is_overridden_by_inline_theme() {
    let dir = tempfile::tempdir().unwrap();
    let theme_path = dir.path().join("theme.toml");
    std::fs::write(
        &theme_path,
        r#"
[theme.colors.text]
primary = "1"
secondary = "2"
"#,
    )
    .unwrap();

    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "theme_file = {:?}\n\n[theme.colors.text]\nprimary = \"3\"\n",
            theme_path.display().to_string()
        ),
    )
    .unwrap();

    let config = load_config(Some(&config_path)).unwrap();
    assert_eq!(config.theme.colors.text.primary, Some(Color::Ansi256(3)));
    assert_eq!(config.theme.colors.text.secondary, Some(Color::Ansi256(2)));
}

#[test]
fn missing_theme_file_produces_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    std::fs::write(&config_path, "theme_file = \"/nonexistent/theme.toml\"\n").unwrap();
    let err = load_config(Some(&config_path)).unwrap_err();
    assert!(format!("{err:#}").contains("theme file"));
}
