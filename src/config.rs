use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable checked when no key is stored in the config file
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub cache_dir: Option<PathBuf>,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Could not determine config directory")?;
        Ok(base.join("quizgpt"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let base = dirs::data_dir().context("Could not determine data directory")?;
        Ok(base.join("quizgpt"))
    }

    /// Directory holding uploaded scratch files and the memo database
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join(".cache")),
        }
    }

    /// Path of the persistent memo database
    pub fn memo_db_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join("memo.db"))
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            let config: Config =
                toml::from_str(&content).with_context(|| "Failed to parse config file")?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file with secure permissions (600)
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let dir = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Config path has no parent directory"))?;

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&path, &content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        // Owner read/write only, the file holds the API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)
                .with_context(|| "Failed to set config file permissions")?;
        }

        Ok(())
    }

    /// Check if an OpenAI API key is stored in the config file
    pub fn has_stored_key(&self) -> bool {
        self.openai_api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Get the OpenAI API key, checking the environment variable as fallback
    pub fn get_api_key(&self) -> Option<String> {
        self.openai_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrips_through_toml() {
        let config = Config {
            openai_api_key: Some("sk-test".to_string()),
            cache_dir: Some(PathBuf::from("/tmp/quizgpt-cache")),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(parsed.cache_dir().unwrap(), PathBuf::from("/tmp/quizgpt-cache"));
        assert_eq!(
            parsed.memo_db_path().unwrap(),
            PathBuf::from("/tmp/quizgpt-cache/memo.db")
        );
    }

    #[test]
    fn test_empty_stored_key_is_not_a_key() {
        let config = Config {
            openai_api_key: Some(String::new()),
            cache_dir: None,
        };
        assert!(!config.has_stored_key());
    }
}
