//! Configuration validation
//!
//! Validates config consistency:
//! - At least one sink is enabled
//! - Required fields are present for enabled sinks
//! - No two JSONL sinks write to the same file
//! - The watcher window is positive
//! - The attachment directory is set when downloads are on

use std::collections::BTreeMap;

use crate::Config;
use crate::error::{ConfigError, Result};
use crate::sinks::SinkConfig;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_sinks(config)?;
    validate_watcher(config)?;
    validate_attachments(config)?;
    Ok(())
}

/// Validate sink configurations
fn validate_sinks(config: &Config) -> Result<()> {
    if config.sinks.enabled().next().is_none() {
        return Err(ConfigError::NoSinksEnabled);
    }

    let mut paths: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for (name, sink) in config.sinks.enabled() {
        match sink {
            SinkConfig::Jsonl(jsonl) => {
                if jsonl.path.trim().is_empty() {
                    return Err(ConfigError::missing_field("sink", name, "path"));
                }
                if jsonl.eol.is_empty() {
                    return Err(ConfigError::invalid_value(
                        "sink",
                        name,
                        "eol",
                        "must not be empty",
                    ));
                }
                paths.entry(jsonl.path.as_str()).or_default().push(name);
            }
            SinkConfig::Elasticsearch(es) => {
                if es.url.trim().is_empty() {
                    return Err(ConfigError::missing_field("sink", name, "url"));
                }
                if !es.url.starts_with("http://") && !es.url.starts_with("https://") {
                    return Err(ConfigError::invalid_value(
                        "sink",
                        name,
                        "url",
                        "must start with http:// or https://",
                    ));
                }
                if es.index_pattern.trim().is_empty() {
                    return Err(ConfigError::missing_field("sink", name, "index_pattern"));
                }
                if es.password.is_some() && es.username.is_none() {
                    return Err(ConfigError::missing_field("sink", name, "username"));
                }
            }
            SinkConfig::Stdout(_) => {}
        }
    }

    if let Some((path, sinks)) = paths.into_iter().find(|(_, sinks)| sinks.len() > 1) {
        return Err(ConfigError::duplicate_path(path, sinks.join(", ")));
    }

    Ok(())
}

fn validate_watcher(config: &Config) -> Result<()> {
    if config.watcher.enabled && config.watcher.timeout.is_zero() {
        return Err(ConfigError::invalid_value(
            "section",
            "watcher",
            "timeout",
            "must be greater than zero",
        ));
    }
    Ok(())
}

fn validate_attachments(config: &Config) -> Result<()> {
    if config.attachments.download && config.attachments.directory.trim().is_empty() {
        return Err(ConfigError::missing_field(
            "section",
            "attachments",
            "directory",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::{Config, ConfigError};

    const JSONL: &str = "[sinks.archive]\ntype = \"jsonl\"\n";

    #[test]
    fn test_no_sinks() {
        assert!(matches!(Config::from_str(""), Err(ConfigError::NoSinksEnabled)));
    }

    #[test]
    fn test_only_disabled_sinks() {
        let toml = "[sinks.archive]\ntype = \"jsonl\"\nenabled = false\n";
        assert!(matches!(Config::from_str(toml), Err(ConfigError::NoSinksEnabled)));
    }

    #[test]
    fn test_jsonl_empty_path() {
        let toml = "[sinks.archive]\ntype = \"jsonl\"\npath = \"\"\n";
        assert!(matches!(
            Config::from_str(toml),
            Err(ConfigError::MissingField { field: "path", .. })
        ));
    }

    #[test]
    fn test_jsonl_empty_eol() {
        let toml = "[sinks.archive]\ntype = \"jsonl\"\neol = \"\"\n";
        assert!(matches!(
            Config::from_str(toml),
            Err(ConfigError::InvalidValue { field: "eol", .. })
        ));
    }

    #[test]
    fn test_jsonl_shared_path() {
        let toml = r#"
[sinks.a]
type = "jsonl"
path = "out.jsonl"

[sinks.b]
type = "jsonl"
path = "out.jsonl"
"#;
        match Config::from_str(toml) {
            Err(ConfigError::DuplicatePath { path, sinks }) => {
                assert_eq!(path, "out.jsonl");
                assert_eq!(sinks, "a, b");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_disabled_sink_may_share_path() {
        let toml = r#"
[sinks.a]
type = "jsonl"
path = "out.jsonl"

[sinks.b]
type = "jsonl"
path = "out.jsonl"
enabled = false
"#;
        assert!(Config::from_str(toml).is_ok());
    }

    #[test]
    fn test_elasticsearch_url() {
        let toml = "[sinks.es]\ntype = \"elasticsearch\"\nurl = \"\"\n";
        assert!(matches!(
            Config::from_str(toml),
            Err(ConfigError::MissingField { field: "url", .. })
        ));

        let toml = "[sinks.es]\ntype = \"elasticsearch\"\nurl = \"localhost:9200\"\n";
        assert!(matches!(
            Config::from_str(toml),
            Err(ConfigError::InvalidValue { field: "url", .. })
        ));
    }

    #[test]
    fn test_elasticsearch_password_without_user() {
        let toml = "[sinks.es]\ntype = \"elasticsearch\"\npassword = \"secret\"\n";
        assert!(matches!(
            Config::from_str(toml),
            Err(ConfigError::MissingField { field: "username", .. })
        ));
    }

    #[test]
    fn test_zero_watcher_timeout() {
        let toml = format!("{JSONL}[watcher]\nenabled = true\ntimeout = \"0s\"\n");
        assert!(matches!(
            Config::from_str(&toml),
            Err(ConfigError::InvalidValue { field: "timeout", .. })
        ));
    }

    #[test]
    fn test_zero_timeout_ignored_when_watcher_disabled() {
        let toml = format!("{JSONL}[watcher]\ntimeout = \"0s\"\n");
        assert!(Config::from_str(&toml).is_ok());
    }

    #[test]
    fn test_download_without_directory() {
        let toml = format!("{JSONL}[attachments]\ndownload = true\ndirectory = \" \"\n");
        assert!(matches!(
            Config::from_str(&toml),
            Err(ConfigError::MissingField { field: "directory", .. })
        ));
    }
}
