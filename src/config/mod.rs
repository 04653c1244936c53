use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::resolver::{fetcher::MAX_BODY_BYTES, fetcher::USER_AGENT, FetcherConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub is_dev: bool,
    pub fetch_timeout: Duration,
    pub fetch_user_agent: String,
    pub fetch_allow_private: bool,
    pub fetch_max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; `from_env` passes the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "SERVER_PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let fetch_timeout = match lookup("LINK_FETCH_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "LINK_FETCH_TIMEOUT_SECS",
                        value: raw,
                    })
                }
            },
            None => Duration::from_secs(30),
        };

        let fetch_max_body_bytes = match lookup("LINK_FETCH_MAX_BODY_BYTES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(bytes) if bytes > 0 => bytes,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "LINK_FETCH_MAX_BODY_BYTES",
                        value: raw,
                    })
                }
            },
            None => MAX_BODY_BYTES,
        };

        Ok(Config {
            database_url,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port,
            is_dev: lookup("APP_ENV").as_deref() != Some("production"),
            fetch_timeout,
            fetch_user_agent: lookup("LINK_FETCH_USER_AGENT")
                .unwrap_or_else(|| USER_AGENT.to_string()),
            fetch_allow_private: lookup("LINK_FETCH_ALLOW_PRIVATE")
                .is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes")),
            fetch_max_body_bytes,
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            timeout: self.fetch_timeout,
            user_agent: self.fetch_user_agent.clone(),
            block_private_addresses: !self.fetch_allow_private,
            max_body_bytes: self.fetch_max_body_bytes,
        }
    }
}
