use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{HydroShareError, Result};

pub const BASE_URL_VAR: &str = "HS_BASE_URL";
pub const USERNAME_VAR: &str = "HS_USERNAME";
pub const PASSWORD_VAR: &str = "HS_PASSWORD";
pub const TIMEOUT_VAR: &str = "HS_TIMEOUT_SECS";

pub const DEFAULT_USER_AGENT: &str =
    concat!("hs-restclient/", env!("CARGO_PKG_VERSION"));

/// Connection settings of a [crate::HydroShare] client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// API root, e.g. `http://127.0.0.1:8001/api/v1/`
    pub base_url: Url,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    #[serde(default, with = "timeout_secs")]
    pub timeout: Option<Duration>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Config {
    pub fn new<S: Into<String>>(
        base_url: &str,
        username: S,
        password: Option<String>,
    ) -> Result<Self> {
        let config = Self {
            base_url: Url::parse(base_url)?,
            username: username.into(),
            password,
            timeout: None,
            user_agent: default_user_agent(),
        };
        Ok(config.normalized())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Read settings from `HS_BASE_URL`, `HS_USERNAME`, `HS_PASSWORD`
    /// and `HS_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            var(name).ok_or_else(|| {
                HydroShareError::Config(format!(
                    "environment variable {name} is not set"
                ))
            })
        };
        let base_url = required(BASE_URL_VAR)?;
        let username = required(USERNAME_VAR)?;
        let password = var(PASSWORD_VAR);

        let mut config = Self::new(&base_url, username, password)?;
        if let Some(secs) = var(TIMEOUT_VAR) {
            let secs = secs.parse::<u64>().map_err(|_| {
                HydroShareError::Config(format!(
                    "{TIMEOUT_VAR} must be a number of seconds, got {secs}"
                ))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Load settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading client configuration from {}", path.display());
        let bytes = fs::read(path)?;
        let config: Config = serde_json::from_slice(&bytes)?;
        Ok(config.normalized())
    }

    /// Endpoints are joined relative to the base URL, which therefore has
    /// to end with a slash.
    fn normalized(mut self) -> Self {
        if !self.base_url.path().ends_with('/') {
            let path = format!("{}/", self.base_url.path());
            self.base_url.set_path(&path);
        }
        self
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_owned()
}

mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
        timeout: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match timeout {
            Some(timeout) => serializer.serialize_some(&timeout.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
