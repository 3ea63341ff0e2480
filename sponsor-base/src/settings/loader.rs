use std::env;
use std::error::Error;
use std::path::PathBuf;

use config::{Config, Environment, File};
use eyre::{Context, Result};
use serde::de::DeserializeOwned;

/// Load a settings object from the config locations.
/// Further documentation can be found in the `settings` module.
pub(crate) fn load_settings_object<T>(agent_prefix: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    // Derive additional prefix from agent name
    let prefix = format!("SPONSOR_{}", agent_prefix).to_ascii_uppercase();

    let mut base_config_sources = vec![];
    let mut builder = Config::builder();

    // Load the default config files (`config/*.json`) when running from a
    // directory that has them
    let config_dir = PathBuf::from("./config");
    if config_dir.is_dir() {
        let mut paths = vec![];
        for entry in config_dir
            .read_dir()
            .context("Failed to open config directory")?
        {
            let path = entry.context("Failed to read config directory")?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();
        for path in paths {
            base_config_sources.push(format!("{:?}", path));
            builder = builder.add_source(File::from(path));
        }
    }

    // Load a set of additional user specified config files
    let config_file_paths: Vec<String> = env::var("CONFIG_FILES")
        .map(|s| s.split(',').map(|s| s.to_string()).collect())
        .unwrap_or_default();

    let builder = config_file_paths.iter().fold(builder, |builder, path| {
        builder.add_source(File::with_name(path))
    });

    let config_deserializer = builder
        // Use a base configuration env variable prefix
        .add_source(
            Environment::with_prefix("SPONSOR_BASE")
                .prefix_separator("_")
                .separator("__"),
        )
        .add_source(
            Environment::with_prefix(&prefix)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    match Config::try_deserialize::<T>(config_deserializer) {
        Ok(cfg) => Ok(cfg),
        Err(err) => {
            let mut err = if let Some(source_err) = err.source() {
                let source = format!("Config error source: {source_err}");
                Err(err).context(source)
            } else {
                Err(err.into())
            };
            for cfg_path in base_config_sources.iter().chain(config_file_paths.iter()) {
                err = err.with_context(|| format!("Config loaded: {cfg_path}"));
            }
            err
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use crate::settings::Settings;

    use super::*;

    #[test]
    fn loads_config_files_listed_in_the_environment() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "wallet": {{"type": "http", "url": "http://localhost:8545"}},
                "registry": {{"address": "0x00000000000000000000000000000000000000bb"}},
                "confirmation": {{"timeout_secs": 90}}
            }}"#
        )
        .unwrap();
        env::set_var("CONFIG_FILES", file.path());

        let settings: Settings = load_settings_object("loader_test").unwrap();
        env::remove_var("CONFIG_FILES");

        assert!(settings.wallet.is_some());
        assert_eq!(
            settings.registry.address,
            sponsor_core::Address::from_low_u64_be(0xbb)
        );
        assert_eq!(settings.confirmation.timeout_secs, Some(90));
    }
}
