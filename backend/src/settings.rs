//! Service configuration loaded via OrthoConfig.
//!
//! Values come from `FEED_*` environment variables, configuration files and
//! command-line flags. Every field is optional; accessors apply defaults and
//! validate ranges so a bad value fails startup instead of misbehaving later.

use std::net::SocketAddr;

use std::time::Duration;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use pagination::{PageLimit, PageLimitError};
use serde::Deserialize;

use crate::domain::engagement::{CooldownPolicy, DEFAULT_RATING_COOLDOWN, DEFAULT_VIEW_COOLDOWN};
use crate::outbound::persistence::{PoolConfig, PoolError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Raised when a configured value cannot be used.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address `{value}`: {source}")]
    BindAddr {
        /// The configured value.
        value: String,
        /// Parse failure.
        #[source]
        source: std::net::AddrParseError,
    },
    /// A cool-down does not fit a signed duration.
    #[error("{name} of {seconds} seconds is out of range")]
    Cooldown {
        /// Setting name.
        name: &'static str,
        /// The configured value.
        seconds: u64,
    },
    /// `default_page_limit` lies outside the accepted page sizes.
    #[error("default_page_limit: {0}")]
    PageLimit(#[from] PageLimitError),
    /// The `db_*` values cannot form a working pool.
    #[error("database pool settings: {0}")]
    Pool(#[from] PoolError),
}

/// Runtime settings for the feed service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "FEED")]
pub struct FeedSettings {
    /// Socket address to listen on; defaults to `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Seconds between counted views by the same viewer; defaults to 3600.
    pub view_cooldown_secs: Option<u64>,
    /// Seconds between rating changes by the same viewer; defaults to 60.
    pub rating_cooldown_secs: Option<u64>,
    /// Page size applied when a request omits `limit`; defaults to 20.
    pub default_page_limit: Option<u16>,
    /// Upper bound on pooled database connections; defaults to 10.
    pub db_max_connections: Option<u32>,
    /// Idle connections kept open; defaults to 2, and 0 lets the pool drain.
    pub db_min_idle: Option<u32>,
    /// Seconds a request waits for a pooled connection; defaults to 30.
    pub db_checkout_timeout_secs: Option<u64>,
}

fn cooldown(
    name: &'static str,
    seconds: Option<u64>,
    default: TimeDelta,
) -> Result<TimeDelta, SettingsError> {
    let Some(seconds) = seconds else {
        return Ok(default);
    };
    i64::try_from(seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or(SettingsError::Cooldown { name, seconds })
}

impl FeedSettings {
    /// The address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// The database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Validated pool settings, or `None` when no database is configured.
    pub fn pool_config(&self) -> Result<Option<PoolConfig>, SettingsError> {
        let Some(url) = self.database_url() else {
            return Ok(None);
        };
        let mut config = PoolConfig::new(url);
        if let Some(max_size) = self.db_max_connections {
            config = config.with_max_size(max_size);
        }
        if let Some(min_idle) = self.db_min_idle {
            config = config.with_min_idle((min_idle > 0).then_some(min_idle));
        }
        if let Some(seconds) = self.db_checkout_timeout_secs {
            config = config.with_checkout_timeout(Duration::from_secs(seconds));
        }
        config.validate()?;
        Ok(Some(config))
    }

    /// View and rating cool-downs.
    pub fn cooldowns(&self) -> Result<CooldownPolicy, SettingsError> {
        Ok(CooldownPolicy {
            view: cooldown(
                "view_cooldown_secs",
                self.view_cooldown_secs,
                DEFAULT_VIEW_COOLDOWN,
            )?,
            rating: cooldown(
                "rating_cooldown_secs",
                self.rating_cooldown_secs,
                DEFAULT_RATING_COOLDOWN,
            )?,
        })
    }

    /// Page size for requests that omit `limit`.
    pub fn default_page_limit(&self) -> Result<PageLimit, SettingsError> {
        let limit = PageLimit::from_optional(self.default_page_limit.map(i64::from))?;
        Ok(limit)
    }
}
