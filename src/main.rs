use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_service::{
    AppState,
    cache::{CacheStore, InMemoryCache, RedisCache},
    config::{CacheBackend, Config, StoreBackend},
    database::{InMemoryUserRepository, PgUserRepository, UserRepository, schema},
    routes,
    service::UserService,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("Failed to load configuration");

    if config.testing {
        tracing::info!("Running in testing mode");
    }

    let repository: Arc<dyn UserRepository> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'user_service';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(&config.database_url)
                .await
                .expect("Failed to connect to Postgres");

            schema::ensure_schema(&pool)
                .await
                .expect("Failed to create database schema");

            Arc::new(PgUserRepository::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store, data will not survive a restart");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let cache: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            Arc::new(RedisCache::open(&config.redis_url).expect("Failed to create Redis client"))
        }
        CacheBackend::Memory => Arc::new(InMemoryCache::new()),
    };

    let users = UserService::new(repository, cache, config.cache_ttl());
    let state = AppState {
        users: Arc::new(users),
        config: config.clone(),
    };

    let router = routes::create_router(state.clone()).layer(TraceLayer::new_for_http());

    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router,
    )
    .await
    .expect("Failed to start server");
}
