use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    /// `memory` selects the in-process store; anything else is postgres.
    fn from_name(name: &str) -> Self {
        match name.trim() {
            "memory" => StoreBackend::Memory,
            _ => StoreBackend::Postgres,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl CacheBackend {
    /// `memory` selects the in-process cache; anything else is redis.
    fn from_name(name: &str) -> Self {
        match name.trim() {
            "memory" => CacheBackend::Memory,
            _ => CacheBackend::Redis,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// `APP_ENV=testing`
    pub testing: bool,
    pub database_url: String,
    pub store_backend: StoreBackend,
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    pub cache_ttl_secs: u64,
    pub server_host: String,
    pub server_port: u16,
    pub db_max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            testing: false,
            database_url: String::new(),
            store_backend: StoreBackend::Postgres,
            cache_backend: CacheBackend::Redis,
            redis_url: redis_url_from_parts("redis", 6379, 0),
            cache_ttl_secs: 300,
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            db_max_connections: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        let testing = env::var("APP_ENV").map(|v| v == "testing").unwrap_or(false);

        let store_backend = env::var("STORE_BACKEND")
            .map(|v| StoreBackend::from_name(&v))
            .unwrap_or(defaults.store_backend);
        let cache_backend = env::var("CACHE_BACKEND")
            .map(|v| CacheBackend::from_name(&v))
            .unwrap_or(defaults.cache_backend);

        // Only the postgres store needs a connection string
        let database_url = match store_backend {
            StoreBackend::Postgres => {
                let url = env::var("DATABASE_URL")?;
                if testing {
                    env::var("TEST_DATABASE_URL").unwrap_or_else(|_| test_database_url(&url))
                } else {
                    url
                }
            }
            StoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| {
            redis_url_from_parts(
                &env::var("REDIS_HOST").unwrap_or_else(|_| "redis".into()),
                parse_or("REDIS_PORT", 6379),
                parse_or("REDIS_DB", 0),
            )
        });

        Ok(Config {
            testing,
            database_url,
            store_backend,
            cache_backend,
            redis_url,
            cache_ttl_secs: parse_or("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", defaults.server_port),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", defaults.db_max_connections),
        })
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn redis_url_from_parts(host: &str, port: u16, db: u32) -> String {
    format!("redis://{}:{}/{}", host, port, db)
}

/// Derives the test database URL by suffixing the database name with `_test`.
fn test_database_url(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };
    let mut test_url = format!("{}_test", base.trim_end_matches('/'));
    if let Some(query) = query {
        test_url.push('?');
        test_url.push_str(query);
    }
    test_url
}
