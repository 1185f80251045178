//! Accounts Server
//!
//! REST API for user account management:
//! - Users API under `/api/users`
//! - Health checks under `/health`
//! - Swagger UI at `/swagger-ui`
//!
//! ## Configuration
//!
//! Read from the first TOML file found (`$ACCOUNTS_CONFIG`, `config.toml`,
//! `accounts.toml`, ...) and overridden by `ACCOUNTS_*` variables.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ACCOUNTS_HTTP_PORT` | `8080` | HTTP API port |
//! | `ACCOUNTS_STORAGE_PROVIDER` | `memory` | `memory` or `mongodb` |
//! | `ACCOUNTS_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URI |
//! | `ACCOUNTS_MONGODB_DATABASE` | `accounts` | MongoDB database name |
//! | `ACCOUNTS_SEED_ENABLED` | `true` | Seed the administrator on startup |
//! | `LOG_FORMAT` | `text` | `text` or `json` |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;
use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa_swagger_ui::SwaggerUi;

use accounts_config::{AppConfig, ConfigLoader, StorageProvider};
use accounts_platform::{
    api_router, health_router, initialize_indexes, AdminSeed, AdminSeeder, HealthState,
    InMemoryUserStore, MongoUnitOfWork, MongoUserRepository, UnitOfWork, UserOperations,
    UserRepository,
};

struct Storage {
    user_repo: Arc<dyn UserRepository>,
    unit_of_work: Arc<dyn UnitOfWork>,
    db: Option<mongodb::Database>,
}

async fn connect_storage(config: &AppConfig) -> Result<Storage> {
    match config.storage.provider {
        StorageProvider::Memory => {
            info!("Using in-memory user store");
            let store = Arc::new(InMemoryUserStore::new());
            Ok(Storage {
                user_repo: store.clone(),
                unit_of_work: store,
                db: None,
            })
        }
        StorageProvider::Mongodb => {
            info!("Connecting to MongoDB: {}/{}", config.mongodb.uri, config.mongodb.database);
            let client = mongodb::Client::with_uri_str(&config.mongodb.uri)
                .await
                .context("connecting to MongoDB")?;
            let db = client.database(&config.mongodb.database);

            initialize_indexes(&db).await.context("creating indexes")?;

            Ok(Storage {
                user_repo: Arc::new(MongoUserRepository::new(&db)),
                unit_of_work: Arc::new(MongoUnitOfWork::new(client, db.clone())),
                db: Some(db),
            })
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()))
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[tokio::main]
async fn main() -> Result<()> {
    accounts_common::logging::init_logging("accounts-server");

    info!("Starting Accounts Server");

    let config = ConfigLoader::new().load().context("loading configuration")?;
    let storage = connect_storage(&config).await?;

    let health_state = HealthState::new(storage.db.clone(), Some(env!("CARGO_PKG_VERSION").to_string()));

    if config.seed.enabled {
        let seed = AdminSeed {
            login: config.seed.admin_login.clone(),
            password: config.seed.admin_password.clone(),
            name: config.seed.admin_name.clone(),
        };
        AdminSeeder::new(storage.user_repo.clone(), storage.unit_of_work.clone(), seed)
            .seed()
            .await
            .context("seeding administrator")?;
    }

    let operations = Arc::new(UserOperations::new(storage.user_repo, storage.unit_of_work));

    let (router, openapi) = api_router(operations).split_for_parts();

    let app = router
        .nest("/health", health_router(health_state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.http.cors_origins));

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr).await.with_context(|| format!("binding {}", addr))?;
    info!("API server listening on http://{}", addr);

    health_state.set_ready();

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Accounts Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received...");
}
