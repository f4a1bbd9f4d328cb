use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Load configuration from file with environment variable overrides.
///
/// Nested keys are separated by a double underscore, e.g.
/// `ROAR_ACQUIRE__NUM_WORKERS=4`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("ROAR_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PostProcessorConfig;
    use crate::ledger::SinkConfig;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_full() {
        let toml = r#"
[[ledger.sinks]]
kind = "sqlite"
path = "state/roar.db"

[[ledger.sinks]]
kind = "console"
stream = "stdout"

[acquire]
channel_ids = ["UC1"]
save_dir = "data/raw"
num_workers = 4

[[post_processors]]
kind = "separate_music"
in_path = "data/raw"
out_path = "data/stems"

[[post_processors]]
kind = "voice_activity"
in_path = "data/stems"
batch_size = 8

[post_processors.vad]
onset = 0.7
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.ledger.sinks.len(), 2);
        assert_eq!(
            config.ledger.sinks[0],
            SinkConfig::Sqlite {
                path: PathBuf::from("state/roar.db")
            }
        );

        let acquire = config.acquire.unwrap();
        assert_eq!(acquire.num_workers, 4);

        assert_eq!(config.post_processors.len(), 2);
        assert_eq!(config.post_processors[0].stage_name(), "separate_music");
        match &config.post_processors[1] {
            PostProcessorConfig::VoiceActivity(vad) => {
                assert_eq!(vad.batch_size, 8);
                assert_eq!(vad.vad.onset, 0.7);
            }
            other => panic!("Expected voice_activity, got {:?}", other),
        }
    }

    #[test]
    fn test_load_config_from_str_empty_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.ledger.sinks.len(), 2);
        assert!(config.acquire.is_none());
        assert!(config.post_processors.is_empty());
    }

    #[test]
    fn test_load_config_from_str_unknown_kind() {
        let toml = r#"
[[post_processors]]
kind = "transcribe"
in_path = "data/raw"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[acquire]
channel_ids = ["UC1", "UC2"]
save_dir = "data/raw"
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        let acquire = config.acquire.unwrap();
        assert_eq!(acquire.channel_ids, vec!["UC1", "UC2"]);
        assert_eq!(acquire.save_dir, PathBuf::from("data/raw"));
    }
}
