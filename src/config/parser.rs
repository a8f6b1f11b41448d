use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sitemap_stream::config::load_config;
///
/// let config = load_config(Path::new("sitemap-stream.toml")).unwrap();
/// println!("Max parallel: {}", config.traversal.max_parallel);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[traversal]
max-parallel = 8

[http]
user-agent = "TestBot/1.0"
timeout-secs = 5
connect-timeout-secs = 2

[filter]
allowed-domains = ["example.com", "*.example.org"]
exclude-patterns = ["/tag/"]
sitemap-exclude-patterns = ["archive"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.traversal.max_parallel, 8);
        assert_eq!(config.http.user_agent, "TestBot/1.0");
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.filter.allowed_domains.len(), 2);
        assert_eq!(config.filter.sitemap_exclude_patterns, vec!["archive"]);
    }

    #[test]
    fn test_load_empty_file_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.traversal.max_parallel, 4);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[traversal]
max-parallel = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_config_with_bad_domain() {
        let result = parse_config(
            r#"
[filter]
allowed-domains = ["https://example.com/"]
"#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
    }
}
