use super::{
    types::{Config, PostProcessorConfig},
    ConfigError,
};
use crate::ledger::SinkConfig;

/// Validate configuration
/// Currently validates:
/// - At least one stage is configured
/// - SQLite sinks have a path
/// - Stage paths are non-empty
/// - Detection batch size is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.acquire.is_none() && config.post_processors.is_empty() {
        return Err(ConfigError::ValidationError(
            "no stages configured: set [acquire] or [[post_processors]]".to_string(),
        ));
    }

    for sink in &config.ledger.sinks {
        if let SinkConfig::Sqlite { path } = sink {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "ledger sqlite sink path cannot be empty".to_string(),
                ));
            }
        }
    }

    if let Some(acquire) = &config.acquire {
        if acquire.save_dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "acquire.save_dir cannot be empty".to_string(),
            ));
        }
    }

    for (index, processor) in config.post_processors.iter().enumerate() {
        let in_path = match processor {
            PostProcessorConfig::VoiceActivity(vad) => {
                if vad.batch_size == 0 {
                    return Err(ConfigError::ValidationError(format!(
                        "post_processors[{}].batch_size cannot be 0",
                        index
                    )));
                }
                &vad.in_path
            }
            PostProcessorConfig::SeparateMusic(sep) => &sep.in_path,
        };
        if in_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "post_processors[{}].in_path cannot be empty",
                index
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    #[test]
    fn test_validate_valid_config() {
        let config = load_config_from_str(
            r#"
[acquire]
channel_ids = ["UC1"]
save_dir = "data/raw"
"#,
        )
        .unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_no_stages_fails() {
        let config = load_config_from_str("").unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_batch_size_fails() {
        let config = load_config_from_str(
            r#"
[[post_processors]]
kind = "voice_activity"
in_path = "data/raw"
batch_size = 0
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_validate_empty_sqlite_path_fails() {
        let config = load_config_from_str(
            r#"
[[ledger.sinks]]
kind = "sqlite"
path = ""

[[post_processors]]
kind = "separate_music"
in_path = "data/raw"
"#,
        )
        .unwrap();
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty_in_path_fails() {
        let config = load_config_from_str(
            r#"
[[post_processors]]
kind = "separate_music"
in_path = ""
"#,
        )
        .unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("post_processors[0].in_path"));
    }
}
