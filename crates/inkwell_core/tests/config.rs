use inkwell_core::config::{
    DB_PATH_KEY, MEDIA_BASE_URL_KEY, TOKEN_SECRET_KEY, TOKEN_TTL_MINUTES_KEY,
};
use inkwell_core::{default_log_level, ConfigError, CoreConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_when_only_secret_is_set() {
    let config = CoreConfig::from_lookup(lookup(&[(TOKEN_SECRET_KEY, "s3cret")])).unwrap();

    assert_eq!(config.db_path, PathBuf::from("inkwell.db"));
    assert_eq!(config.log_level, default_log_level());
    assert_eq!(config.log_dir, None);
    assert_eq!(config.token_ttl, Duration::from_secs(30 * 60));
    assert_eq!(config.media_root, PathBuf::from("media"));
    assert_eq!(config.media_base_url, "/media");
}

#[test]
fn explicit_values_override_defaults() {
    let config = CoreConfig::from_lookup(lookup(&[
        (TOKEN_SECRET_KEY, "s3cret"),
        (DB_PATH_KEY, "/var/lib/inkwell/blog.db"),
        (TOKEN_TTL_MINUTES_KEY, "5"),
        (MEDIA_BASE_URL_KEY, "https://cdn.example.com"),
    ]))
    .unwrap();

    assert_eq!(config.db_path, PathBuf::from("/var/lib/inkwell/blog.db"));
    assert_eq!(config.token_ttl, Duration::from_secs(300));
    assert_eq!(config.media_base_url, "https://cdn.example.com");
}

#[test]
fn missing_or_blank_secret_is_rejected() {
    assert_eq!(
        CoreConfig::from_lookup(lookup(&[])).unwrap_err(),
        ConfigError::Missing(TOKEN_SECRET_KEY)
    );
    assert_eq!(
        CoreConfig::from_lookup(lookup(&[(TOKEN_SECRET_KEY, "   ")])).unwrap_err(),
        ConfigError::Missing(TOKEN_SECRET_KEY)
    );
}

#[test]
fn malformed_ttl_is_rejected() {
    for raw in ["0", "soon", "-3"] {
        let err = CoreConfig::from_lookup(lookup(&[
            (TOKEN_SECRET_KEY, "s3cret"),
            (TOKEN_TTL_MINUTES_KEY, raw),
        ]))
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { key, .. } if key == TOKEN_TTL_MINUTES_KEY),
            "{raw}: {err}"
        );
    }
}

#[test]
fn debug_output_redacts_secret() {
    let config = CoreConfig::from_lookup(lookup(&[(TOKEN_SECRET_KEY, "s3cret")])).unwrap();
    let rendered = format!("{config:?}");
    assert!(!rendered.contains("s3cret"));
    assert!(rendered.contains("<redacted>"));
}
