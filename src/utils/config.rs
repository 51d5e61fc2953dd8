// Centralized configuration for the mining backend

use std::env;
use std::net::{IpAddr, SocketAddr};

use anyhow::{anyhow, Context, Result};

/// Points earned per minute of an active mining session
pub const DEFAULT_POINTS_PER_MINUTE: f64 = 1.0;

/// Task keys every new user starts with
pub const DEFAULT_TASK_KEYS: &[&str] = &["telegram", "x"];

/// Referral multiplier for new users (stored, not yet used in accrual)
pub const DEFAULT_REFERRAL_MULTIPLIER: f64 = 1.0;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Runtime configuration, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub points_per_minute: f64,
    pub task_keys: Vec<String>,
    pub seed_demo_user: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            points_per_minute: DEFAULT_POINTS_PER_MINUTE,
            task_keys: DEFAULT_TASK_KEYS.iter().map(|k| k.to_string()).collect(),
            seed_demo_user: false,
        }
    }
}

impl Config {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let host: IpAddr = host
            .trim()
            .parse()
            .with_context(|| format!("HOST is not a valid IP address: {}", host))?;

        let port = match lookup("PORT") {
            Some(p) => p
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port: {}", p))?,
            None => DEFAULT_PORT,
        };

        let points_per_minute = match lookup("MINING_RATE_PER_MINUTE") {
            Some(r) => {
                let rate = r
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("MINING_RATE_PER_MINUTE is not a number: {}", r))?;
                if !rate.is_finite() || rate < 0.0 {
                    return Err(anyhow!(
                        "MINING_RATE_PER_MINUTE must be a non-negative number, got {}",
                        rate
                    ));
                }
                rate
            }
            None => DEFAULT_POINTS_PER_MINUTE,
        };

        let task_keys = match lookup("TASK_KEYS") {
            Some(raw) => parse_task_keys(&raw)?,
            None => DEFAULT_TASK_KEYS.iter().map(|k| k.to_string()).collect(),
        };

        let seed_demo_user = lookup("SEED_DEMO_USER")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            points_per_minute,
            task_keys,
            seed_demo_user,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Parse a comma-separated task key list, dropping blanks and duplicates
fn parse_task_keys(raw: &str) -> Result<Vec<String>> {
    let mut keys: Vec<String> = Vec::new();
    for key in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    if keys.is_empty() {
        return Err(anyhow!("TASK_KEYS must name at least one task"));
    }

    Ok(keys)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
