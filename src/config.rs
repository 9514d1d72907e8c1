use anyhow::Context;
use homedir::my_home;
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8077";
const DEFAULT_TOP_K: usize = 10;
const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_COLLECTION: &str = "papers";

const CONFIG_FILE: &str = "config.yaml";

/// SMTP endpoint. Credentials never live in the config file; the mail
/// sender reads SMTP_USERNAME/SMTP_PASSWORD from the environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SMTP_HOST.to_string(),
            port: DEFAULT_SMTP_PORT,
        }
    }
}

fn default_smtp_host() -> String {
    DEFAULT_SMTP_HOST.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Hits per digest, the batch job's top_k.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Name of the offline vector-store collection whose search outputs
    /// this instance serves. Scopes the artifact directory.
    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            top_k: DEFAULT_TOP_K,
            collection: DEFAULT_COLLECTION.to_string(),
            smtp: SmtpConfig::default(),
            base_path: String::new(),
        }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(&resolve_base_path()?)
    }

    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        std::fs::create_dir_all(base_path)
            .with_context(|| format!("failed to create base directory {base_path}"))?;

        let config_path = Path::new(base_path).join(CONFIG_FILE);

        // create new if does not exist
        if std::fs::metadata(&config_path).is_err() {
            std::fs::write(&config_path, serde_yml::to_string(&Self::default())?)?;
        }

        let config_str = std::fs::read_to_string(&config_path)?;
        let mut config: Self =
            serde_yml::from_str(&config_str).context("config is malformed")?;
        config.base_path = base_path.to_string();

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            std::fs::write(&config_path, serde_yml::to_string(&config)?)?;
        }

        config.apply_env();
        config.validate()?;

        Ok(config)
    }

    /// Environment wins over the file for deploy-specific values.
    fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SMTP_HOST") {
            self.smtp.host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            match port.parse() {
                Ok(port) => self.smtp.port = port,
                Err(_) => log::warn!("ignoring invalid SMTP_PORT {port:?}"),
            }
        }
        if let Ok(collection) = std::env::var("MILVUS_COLLECTION") {
            self.collection = collection;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.top_k == 0 {
            anyhow::bail!("top_k must be greater than 0");
        }
        if self.collection.trim().is_empty() {
            anyhow::bail!("collection must not be empty");
        }
        if self.bind_addr.trim().is_empty() {
            anyhow::bail!("bind_addr must not be empty");
        }
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        Path::new(&self.base_path)
    }

    pub fn users_csv_path(&self) -> String {
        format!("{}/users.csv", self.base_path)
    }

    pub fn recipients_csv_path(&self) -> String {
        format!("{}/recipients.csv", self.base_path)
    }

    pub fn search_outputs_dir(&self) -> String {
        format!("{}/search_outputs/{}", self.base_path, self.collection)
    }
}

fn resolve_base_path() -> anyhow::Result<String> {
    if let Ok(base_path) = std::env::var("PAPERFEED_BASE_PATH") {
        return Ok(base_path);
    }

    let home = my_home()
        .context("could not determine home directory")?
        .context("home directory path is empty")?;
    Ok(format!("{}/.local/share/paperfeed", home.to_string_lossy()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_creates_default_config() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();

        let config = Config::load_with(base).unwrap();
        assert_eq!(config.top_k, DEFAULT_TOP_K);
        assert!(tmp.path().join(CONFIG_FILE).exists());

        // artifact dir is scoped by collection
        assert!(config
            .search_outputs_dir()
            .ends_with(&format!("search_outputs/{}", config.collection)));
    }

    #[test]
    fn test_partial_config_filled_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "top_k: 3\n").unwrap();

        let config = Config::load_with(base).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.smtp.port, DEFAULT_SMTP_PORT);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().to_str().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "top_k: 0\n").unwrap();

        assert!(Config::load_with(base).is_err());
    }
}
