use anyhow::{Context, Result};
use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};
use tracing::{info, warn};

pub const DEFAULT_DB_PATH: &str = "bids.db";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_ADMIN_PASSWORD: &str = "1234";
pub const DEFAULT_POOL_SIZE: &str = "4";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub bind: SocketAddr,
    pub admin_password: String,
    pub pool_size: u32,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; `load` uses the process environment
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let admin_password = lookup("BIDBOARD_ADMIN_PASSWORD").unwrap_or_else(|| {
            warn!("BIDBOARD_ADMIN_PASSWORD not set, using the built-in placeholder password");
            DEFAULT_ADMIN_PASSWORD.to_owned()
        });

        Ok(Self {
            db_path: try_load(&lookup, "BIDBOARD_DB_PATH", DEFAULT_DB_PATH)?,
            bind: try_load(&lookup, "BIDBOARD_BIND", DEFAULT_BIND)?,
            admin_password,
            pool_size: try_load(&lookup, "BIDBOARD_POOL_SIZE", DEFAULT_POOL_SIZE)?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_owned()
    });

    value
        .parse()
        .map_err(|e| anyhow::format_err!("{e}"))
        .with_context(|| format!("Invalid {key} value: {value:?}"))
}
