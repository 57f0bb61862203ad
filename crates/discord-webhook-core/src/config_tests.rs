//! Tests for plugin configuration validation.

use super::*;

fn complete() -> PluginConfig {
    PluginConfig::new("ab".repeat(32), "bot-token", "123456")
}

#[test]
fn test_complete_config_is_valid() {
    let config = complete();

    assert!(config.validate().is_ok());
    assert!(!config.verbose);
}

#[test]
fn test_each_missing_field_is_named() {
    let cases = [
        (
            PluginConfig {
                public_key: String::new(),
                ..complete()
            },
            "public_key",
        ),
        (
            PluginConfig {
                bot_token: "   ".to_string(),
                ..complete()
            },
            "bot_token",
        ),
        (
            PluginConfig {
                application_id: String::new(),
                ..complete()
            },
            "application_id",
        ),
    ];

    for (config, field) in cases {
        let err = config.validate().expect_err("config should be rejected");
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert_eq!(err.field(), Some(field));
    }
}

#[test]
fn test_first_missing_field_wins() {
    let config = PluginConfig::default();

    let err = config.validate().unwrap_err();

    assert_eq!(err.field(), Some("public_key"));
}

#[test]
fn test_deserialize_defaults_verbose_to_false() {
    let config: PluginConfig = serde_json::from_str(
        r#"{ "public_key": "aa", "bot_token": "t", "application_id": "1" }"#,
    )
    .unwrap();

    assert!(!config.verbose);
    assert_eq!(config.application_id, "1");
}

#[test]
fn test_debug_redacts_bot_token() {
    let config = complete().with_verbose(true);

    let debug = format!("{:?}", config);

    assert!(!debug.contains("bot-token"));
    assert!(debug.contains("<REDACTED>"));
    assert!(debug.contains("verbose: true"));
}
