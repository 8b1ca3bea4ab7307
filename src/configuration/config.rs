#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::env;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::ArgMatches;
use clap::Command;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;
use tokio::fs;

use crate::domain::models::Selection;
use crate::domain::models::TransportName;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ConfigKey {
    ApiURL,
    ConfigFile,
    Documents,
    MockChunkDelay,
    Papers,
    Transport,
    TransportHealthCheckTimeout,
    Username,
}

/// Resolved settings for one run. Built once by `Config::load` and handed to
/// whatever needs it.
#[derive(Clone, Debug)]
pub struct Config {
    values: HashMap<ConfigKey, String>,
}

impl Config {
    /// A config holding only built-in defaults.
    pub fn new() -> Config {
        let mut config = Config {
            values: HashMap::new(),
        };
        for key in ConfigKey::iter() {
            config.set(key, &Config::default_value(key));
        }

        return config;
    }

    pub fn get(&self, key: ConfigKey) -> String {
        if let Some(val) = self.values.get(&key) {
            return val.to_string();
        }

        return "".to_string();
    }

    pub fn set(&mut self, key: ConfigKey, value: &str) {
        self.values.insert(key, value.to_string());
    }

    pub fn selection(&self) -> Selection {
        return Selection::from_lists(
            &self.get(ConfigKey::Papers),
            &self.get(ConfigKey::Documents),
        );
    }

    pub fn default_value(key: ConfigKey) -> String {
        if key == ConfigKey::Username {
            let mut user = env::var("USER").unwrap_or_else(|_| return "".to_string());
            if user.is_empty() {
                user = "User".to_string();
            }

            return user;
        }

        let default_transport = TransportName::Mock.to_string();
        let config_path = dirs::config_dir()
            .unwrap_or_default()
            .join("research-pal/config.toml")
            .to_string_lossy()
            .to_string();

        let res = match key {
            ConfigKey::ApiURL => "http://localhost:8000/api/v1",
            ConfigKey::Documents => "",
            ConfigKey::MockChunkDelay => "50",
            ConfigKey::Papers => "",
            ConfigKey::Transport => &default_transport,
            ConfigKey::TransportHealthCheckTimeout => "1000",

            // Special
            ConfigKey::ConfigFile => &config_path,
            ConfigKey::Username => "",
        };

        return res.to_string();
    }

    /// Resolves defaults, then the TOML config file, then CLI flags and
    /// environment variables, each overriding the previous.
    pub async fn load(cmd: Command, clap_arg_matches: Vec<&ArgMatches>) -> Result<Config> {
        let mut config = Config::new();

        let mut config_file = Config::default_value(ConfigKey::ConfigFile);
        for matches in clap_arg_matches.as_slice() {
            if let Ok(Some(arg_config_file)) =
                matches.try_get_one::<String>(&ConfigKey::ConfigFile.to_string())
            {
                config_file = arg_config_file.to_string();
            }
        }

        let config_path = path::PathBuf::from(config_file);
        if config_path.exists() {
            let toml_str = fs::read_to_string(config_path).await?;
            let doc = toml_str.parse::<toml_edit::Document>()?;

            for key in ConfigKey::iter() {
                let key_name = key.to_string();
                if let Some(val) = doc.get(&key_name) {
                    // Use clap value parsers to do validation.
                    let mut possible_values = vec![];
                    if let Some(arg) = cmd
                        .get_arguments()
                        .find(|e| return e.get_long() == Some(key_name.as_str()))
                    {
                        possible_values = arg
                            .get_possible_values()
                            .iter()
                            .map(|e| return e.get_name().to_string())
                            .collect::<Vec<String>>();
                    }

                    if let Some(val_int) = val.as_integer() {
                        config.set(key, &val_int.to_string());
                    } else if let Some(val_str) = val.as_str() {
                        if val_str.is_empty() {
                            continue;
                        }
                        if !possible_values.is_empty()
                            && !possible_values.contains(&val_str.to_string())
                        {
                            bail!(format!("config.toml has an invalid value for key '{key}': {val_str}\nPossible values are: {}", possible_values.join(", ")));
                        }
                        config.set(key, val_str);
                    }
                }
            }
        }

        for key in ConfigKey::iter() {
            for matches in clap_arg_matches.as_slice() {
                if let Ok(Some(val)) = matches.try_get_one::<String>(&key.to_string()) {
                    if val.is_empty() {
                        continue;
                    }
                    config.set(key, val)
                }
            }
        }

        tracing::debug!(
            transport = %config.get(ConfigKey::Transport),
            api_url = %config.get(ConfigKey::ApiURL),
            papers = %config.get(ConfigKey::Papers),
            documents = %config.get(ConfigKey::Documents),
            username = %config.get(ConfigKey::Username),
            "config"
        );

        return Ok(config);
    }

    pub fn serialize_default(cmd: Command) -> String {
        let toml_str = ConfigKey::iter()
            .filter_map(|key| {
                if key == ConfigKey::ConfigFile {
                    return None;
                }

                if key == ConfigKey::Username {
                    return Some(
                        "# Your name shown in the chat prompt.\n# username = \"\"".to_string(),
                    );
                }

                let key_name = key.to_string();
                let arg = cmd
                    .get_arguments()
                    .find(|e| return e.get_long() == Some(key_name.as_str()))?;

                let mut description = arg
                    .get_help()?
                    .to_string()
                    .split("[default:")
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string();

                if !arg.get_possible_values().is_empty() {
                    let possible_values = arg
                        .get_possible_values()
                        .iter()
                        .map(|e| return e.get_name().to_string())
                        .collect::<Vec<String>>()
                        .join(", ");
                    description = format!("{description} [possible values: {possible_values}]");
                }

                let mut val = Config::default_value(key);
                if val.is_empty() {
                    val = format!("# {key} = \"\"");
                } else if val.parse::<i32>().is_ok() {
                    val = format!("{key} = {val}");
                } else {
                    val = format!("{key} = \"{val}\"");
                }

                return Some(format!("# {description}\n{val}"));
            })
            .collect::<Vec<String>>()
            .join("\n\n");

        return toml_str;
    }
}
