use std::path::Path;

use config::{Config, Environment, File};
use failure::Error;

use crate::errors::ConfigError;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub feed: Feed,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Feed {
    pub ws_uri: String,
    pub contract: String,
    pub from_block: u64,
    pub limit: usize,
    pub timeout: u64,
    pub logging: Logging,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Logging {
    Raw,
    Json,
}

impl Settings {
    pub fn new<P>(path: Option<P>) -> Result<Self, Error>
    where
        P: AsRef<Path>,
    {
        let mut s = Config::new();

        s.set_default("feed.ws-uri", "ws://localhost:8546")?;
        s.set_default("feed.from-block", 0)?;
        s.set_default("feed.limit", 50)?;
        s.set_default("feed.timeout", 60)?;
        s.set_default("feed.logging", "raw")?;

        if let Some(p) = path {
            let ps = p
                .as_ref()
                .to_str()
                .ok_or(ConfigError::InvalidConfigFilePath)?;
            s.merge(File::with_name(ps))?;
        }

        s.merge(Environment::new())?;

        let settings: Settings = s.try_into()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Command-line overrides, applied after file and environment merge.
    pub fn apply_overrides(&mut self, uri: Option<&str>, contract: Option<&str>) {
        if let Some(uri) = uri {
            self.feed.ws_uri = uri.to_string();
        }
        if let Some(contract) = contract {
            self.feed.contract = contract.to_string();
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.limit == 0 {
            return Err(ConfigError::InvalidLimit);
        }
        if self.feed.timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}
