//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output::{self, Tone};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::{Config, API_TOKEN_ENV};

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../config.toml.example");

/// Execute `config init`.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    if output::is_json() {
        output::report("config.init", json!({ "path": path.display().to_string() }));
        return Ok(());
    }

    output::heading("Config Initialized");
    output::say(Tone::Done, "Created configuration file");
    output::field("Path", path.display());
    output::heading("Next Steps");
    output::say(Tone::Note, &format!("1. Edit {} if needed", path.display()));
    output::say(
        Tone::Note,
        &format!("2. Set the {API_TOKEN_ENV} environment variable"),
    );
    output::say(
        Tone::Note,
        &format!("3. Run: derivgate check -c {}", path.display()),
    );
    Ok(())
}

/// Execute `config show`.
pub fn execute_show(path: &Path) -> Result<()> {
    let config = Config::load_or_default(path)?;
    let token_loaded = config.api_token.is_some();

    if output::is_json() {
        output::report(
            "config.show",
            json!({
                "path": path.display().to_string(),
                "exists": path.exists(),
                "config": config,
                "api_token_loaded": token_loaded,
            }),
        );
        return Ok(());
    }

    output::heading("Effective Configuration");
    output::field("Path", path.display());
    if !path.exists() {
        output::say(Tone::Note, "(file not found, showing defaults)");
    }

    output::heading("Broker");
    output::field("WebSocket", &config.deriv.ws_url);
    output::field("App ID", &config.deriv.app_id);
    output::field(
        "Language",
        config.deriv.language.as_deref().unwrap_or("(broker default)"),
    );
    output::field("Endpoint", config.deriv.endpoint()?);
    output::field("Request", format!("{}ms", config.deriv.request_timeout_ms));
    output::field("Connect", format!("{}ms", config.deriv.connect_timeout_ms));

    output::heading("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", format!("{:?}", config.logging.format).to_lowercase());

    output::heading("Credentials");
    if token_loaded {
        output::say(Tone::Done, &format!("API token loaded from {API_TOKEN_ENV}"));
    } else {
        output::say(Tone::Warn, &format!("{API_TOKEN_ENV} not set"));
    }
    Ok(())
}

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    output::heading("Config Validation");
    output::field("Path", path.display());
    let config = Config::load(path)?;

    if output::is_json() {
        output::report(
            "config.validate",
            json!({
                "path": path.display().to_string(),
                "valid": true,
                "api_token_loaded": config.api_token.is_some(),
            }),
        );
        return Ok(());
    }

    output::say(Tone::Done, "Config file is valid");
    if config.api_token.is_none() {
        output::say(
            Tone::Warn,
            &format!("{API_TOKEN_ENV} is not set; account commands will fail"),
        );
    }
    output::field("Next", format!("derivgate config show -c {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn template_parses_as_default_config() {
        let parsed: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(parsed.deriv, Config::default().deriv);
        assert_eq!(parsed.logging, Config::default().logging);
    }

    #[test]
    fn init_creates_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        execute_init(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "existing content").unwrap();

        let err = execute_init(&path, false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "existing content");

        execute_init(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn validate_reports_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[deriv]\nws_url = \"http://example.com\"\n").unwrap();

        let err = execute_validate(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "deriv.ws_url",
                ..
            })
        ));
    }

    #[test]
    fn validate_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = execute_validate(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ReadFile(_))));
    }

    #[test]
    fn show_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert!(execute_show(&dir.path().join("missing.toml")).is_ok());
    }
}
