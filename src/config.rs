//! Runtime configuration from environment variables
//!
//! Every variable is optional. A variable that is set but cannot be parsed is
//! an error rather than a silent fallback to the default.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}={value:?} is not valid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Period of the `time-update` push
    pub sse_interval: Duration,
    /// Interval between SSE keep-alive comments
    pub sse_keep_alive: Duration,
    /// Events buffered per SSE client before it counts as dead
    pub emitter_queue_size: usize,
    pub chat_history_limit: usize,
    /// Capacity of the topic broadcast channel
    pub topic_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            sse_interval: Duration::from_millis(5000),
            sse_keep_alive: Duration::from_secs(15),
            emitter_queue_size: 32,
            chat_history_limit: 1000,
            topic_capacity: 256,
        }
    }
}

impl AppConfig {
    /// Load config from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load config through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_var(&lookup, "BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let port = parse_var(&lookup, "PORT")?.unwrap_or(defaults.port);

        let sse_interval = parse_nonzero(&lookup, "SSE_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.sse_interval);
        let sse_keep_alive = parse_nonzero(&lookup, "SSE_KEEP_ALIVE_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.sse_keep_alive);

        let emitter_queue_size =
            parse_nonzero(&lookup, "EMITTER_QUEUE_SIZE")?.unwrap_or(defaults.emitter_queue_size);
        let chat_history_limit =
            parse_nonzero(&lookup, "CHAT_HISTORY_LIMIT")?.unwrap_or(defaults.chat_history_limit);
        let topic_capacity =
            parse_nonzero(&lookup, "TOPIC_CAPACITY")?.unwrap_or(defaults.topic_capacity);

        Ok(Self {
            bind_addr,
            port,
            sse_interval,
            sse_keep_alive,
            emitter_queue_size,
            chat_history_limit,
            topic_capacity,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_var<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    value.parse().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: raw.clone(),
        reason: e.to_string(),
    })
}

fn parse_nonzero<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    match parse_var::<F, T>(lookup, name)? {
        Some(v) if v == T::default() => Err(ConfigError::Invalid {
            name,
            value: lookup(name).unwrap_or_default(),
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}
