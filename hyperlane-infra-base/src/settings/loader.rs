use std::collections::HashMap;
use std::fs;
use std::path::Path;

use config::{Environment, Source};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use hyperlane_infra_core::InfraError;

/// Prefix of environment variables overriding config values
pub const ENV_PREFIX: &str = "HYP_INFRA";

/// Load a settings object from the config locations.
/// Further documentation can be found in the `settings` module.
///
/// Files are merged as JSON so their camelCase keys survive. Environment
/// variable paths are matched against the merged keys ignoring case, since
/// they can only be spelled in one case.
pub(crate) fn load_settings_object<T>(
    config_dir: &Path,
    environment: &str,
    env: HashMap<String, String>,
) -> Result<T>
where
    T: DeserializeOwned,
{
    let base_path = config_dir.join(format!("{environment}.json"));
    if !base_path.is_file() {
        return Err(InfraError::config(format!(
            "No config found for environment `{environment}` at {base_path:?}"
        ))
        .into());
    }
    let mut config_sources = vec![format!("{base_path:?}")];
    let mut merged = read_json(&base_path)?;

    // Load a set of additional user specified config files
    let config_file_paths = env
        .get("CONFIG_FILES")
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    for path in config_file_paths {
        let path = Path::new(&path);
        if path.extension() != Some("json".as_ref()) {
            return Err(InfraError::config(format!(
                "Provided config path via CONFIG_FILES is of an unsupported type ({path:?})"
            ))
            .into());
        }
        merge(&mut merged, read_json(path)?);
        config_sources.push(format!("{path:?}"));
    }

    let overrides = Environment::with_prefix(ENV_PREFIX)
        .separator("_")
        .try_parsing(true)
        .source(Some(env))
        .collect()
        .context("Reading environment overrides")?;
    for (key, value) in overrides {
        let value: Value = value
            .try_deserialize()
            .with_context(|| format!("Environment override {key}"))?;
        let path: Vec<&str> = key.split('.').collect();
        set_path(&mut merged, &path, value);
        config_sources.push(format!("env:{key}"));
    }
    debug!(?config_sources, "Loaded config sources");

    serde_json::from_value(merged)
        .with_context(|| format!("Invalid config in sources {config_sources:?}"))
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("Reading {path:?}"))?;
    serde_json::from_str(&raw).with_context(|| format!("Parsing {path:?}"))
}

/// Objects merge key by key, anything else is replaced by `overlay`.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Set `value` at `path`, reusing the spelling of existing keys that match a
/// component case-insensitively.
fn set_path(root: &mut Value, path: &[&str], value: Value) {
    let Some((first, rest)) = path.split_first() else {
        *root = value;
        return;
    };
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    if let Value::Object(map) = root {
        let key = map
            .keys()
            .find(|key| key.eq_ignore_ascii_case(first))
            .cloned()
            .unwrap_or_else(|| first.to_ascii_lowercase());
        set_path(map.entry(key).or_insert(Value::Null), rest, value);
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Sample {
        environment: String,
        run_env: String,
        tracing: Tracing,
    }

    #[derive(Debug, Deserialize)]
    struct Tracing {
        level: String,
    }

    fn write_base(dir: &Path) {
        fs::write(
            dir.join("test.json"),
            r#"{"environment": "test", "runEnv": "test", "tracing": {"level": "info"}}"#,
        )
        .unwrap();
    }

    #[test]
    fn later_sources_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path());
        let extra = dir.path().join("extra.json");
        fs::write(&extra, r#"{"runEnv": "mainnet2"}"#).unwrap();

        let env = HashMap::from([
            (
                "CONFIG_FILES".to_owned(),
                extra.to_string_lossy().into_owned(),
            ),
            ("HYP_INFRA_TRACING_LEVEL".to_owned(), "debug".to_owned()),
            ("UNRELATED_TRACING_LEVEL".to_owned(), "trace".to_owned()),
        ]);
        let sample: Sample = load_settings_object(dir.path(), "test", env).unwrap();
        assert_eq!(sample.environment, "test");
        assert_eq!(sample.run_env, "mainnet2");
        assert_eq!(sample.tracing.level, "debug");
    }

    #[test]
    fn env_overrides_restore_key_case() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path());
        let env = HashMap::from([("HYP_INFRA_RUNENV".to_owned(), "mainnet2".to_owned())]);
        let sample: Sample = load_settings_object(dir.path(), "test", env).unwrap();
        assert_eq!(sample.run_env, "mainnet2");
    }

    #[test]
    fn nested_objects_merge_and_scalars_parse() {
        let mut base = serde_json::json!({
            "agents": {"hyperlane": {"runEnv": "test", "validator": {"default": {"interval": 5}}}}
        });
        merge(
            &mut base,
            serde_json::json!({"agents": {"hyperlane": {"namespace": "scratch"}}}),
        );
        set_path(
            &mut base,
            &["agents", "hyperlane", "validator", "default", "reorgperiod"],
            serde_json::json!(2),
        );
        set_path(
            &mut base,
            &["agents", "hyperlane", "runenv"],
            serde_json::json!("mainnet2"),
        );
        assert_eq!(
            base,
            serde_json::json!({
                "agents": {"hyperlane": {
                    "runEnv": "mainnet2",
                    "namespace": "scratch",
                    "validator": {"default": {"interval": 5, "reorgperiod": 2}}
                }}
            })
        );
    }

    #[test]
    fn non_json_config_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_base(dir.path());
        let env = HashMap::from([("CONFIG_FILES".to_owned(), "extra.yaml".to_owned())]);
        assert!(load_settings_object::<Sample>(dir.path(), "test", env).is_err());
    }

    #[test]
    fn missing_environment_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_settings_object::<Sample>(dir.path(), "mainnet2", HashMap::new())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InfraError>(),
            Some(InfraError::Configuration(_))
        ));
    }
}
