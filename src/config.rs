//! Command-line and environment configuration

use crate::cors::CorsPolicy;
use crate::error::ConfigError;
use crate::rate_limit::RateLimiter;
use crate::store::default_db_path;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Public product feed and storefront sync service for the nursery inventory
#[derive(Parser, Debug, Clone)]
#[command(name = "nursery_feed")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// HTTP port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Hosted database URL; when set, inventory is read over its REST API
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// API key for the hosted database
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Inventory table name
    #[arg(long, env = "INVENTORY_TABLE", default_value = "inventory")]
    pub table: String,

    /// Path to the local SQLite database (used without --supabase-url)
    #[arg(short, long, env = "NURSERY_DB", default_value_t = default_db_path())]
    pub database: String,

    /// JSON export of inventory rows to import into SQLite at start-up
    #[arg(long)]
    pub import: Option<PathBuf>,

    /// Pin CORS origins to the production storefront sites
    #[arg(long, env = "NURSERY_PRODUCTION", default_value_t = false)]
    pub production: bool,

    /// Origin allowed on /api/products* in production
    #[arg(
        long,
        env = "STOREFRONT_ORIGIN",
        default_value = "https://shop.greenleafnursery.co.ke"
    )]
    pub storefront_origin: String,

    /// Origin allowed on /api/update-inventory in production
    #[arg(
        long,
        env = "CHECKOUT_ORIGIN",
        default_value = "https://www.greenleafnursery.co.ke"
    )]
    pub checkout_origin: String,

    /// Feed requests allowed per client per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 100)]
    pub rate_limit: u32,

    /// Rate-limit window in seconds
    #[arg(long, env = "RATE_WINDOW_SECS", default_value_t = 60)]
    pub rate_window_secs: u64,

    /// How often expired rate-limit records are dropped, in seconds
    #[arg(long, env = "RATE_SWEEP_SECS", default_value_t = 300)]
    pub sweep_interval_secs: u64,
}

/// Where inventory rows come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Supabase {
        url: String,
        key: String,
        table: String,
    },
    Sqlite {
        path: PathBuf,
        import: Option<PathBuf>,
    },
}

impl Args {
    pub fn store_backend(&self) -> Result<StoreBackend, ConfigError> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Ok(StoreBackend::Supabase {
                url: url.clone(),
                key: key.clone(),
                table: self.table.clone(),
            }),
            (Some(_), None) => Err(ConfigError::MissingSupabaseKey),
            (None, _) => Ok(StoreBackend::Sqlite {
                path: PathBuf::from(&self.database),
                import: self.import.clone(),
            }),
        }
    }

    pub fn cors_policy(&self) -> Result<CorsPolicy, ConfigError> {
        CorsPolicy::new(
            self.production,
            &self.storefront_origin,
            &self.checkout_origin,
        )
    }

    pub fn rate_limiter(&self) -> Result<RateLimiter, ConfigError> {
        if self.rate_limit == 0 {
            return Err(ConfigError::Zero("--rate-limit"));
        }
        if self.rate_window_secs == 0 {
            return Err(ConfigError::Zero("--rate-window-secs"));
        }
        Ok(RateLimiter::new(
            self.rate_limit,
            Duration::from_secs(self.rate_window_secs),
        ))
    }

    pub fn sweep_interval(&self) -> Result<Duration, ConfigError> {
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::Zero("--sweep-interval-secs"));
        }
        Ok(Duration::from_secs(self.sweep_interval_secs))
    }
}
