use std::sync::Arc;

use anyhow::Context;
use auth::Authenticator;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use user_admin::config::Config;
use user_admin::config::LogFormat;
use user_admin::config::LoggingConfig;
use user_admin::context::RequestContext;
use user_admin::domain::user::service::UserService;
use user_admin::i18n::Catalog;
use user_admin::inbound::http::router::create_router;
use user_admin::inbound::http::router::AppState;
use user_admin::outbound::repositories::PostgresUserRepository;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!(
        service = "user-admin",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );
    tracing::info!(
        http_port = config.server.http_port,
        request_timeout_ms = config.server.request_timeout_ms,
        max_connections = config.database.max_connections,
        jwt_issuer = %config.jwt.issuer,
        jwt_expiration_hours = config.jwt.expiration_hours,
        uniqueness_timeout_ms = config.validation.uniqueness_timeout_ms,
        "Configuration loaded"
    );

    let catalog = Arc::new(Catalog::embedded()?);

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let authenticator = Arc::new(Authenticator::new(
        config.jwt.secret.as_bytes(),
        config.jwt.issuer.clone(),
        config.jwt.token_ttl(),
    ));
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool));
    let user_service = UserService::new(
        user_repository,
        Arc::clone(&authenticator),
        config.validation.uniqueness_timeout(),
    );

    if let Some((username, password)) = config.bootstrap.admin() {
        let ctx = RequestContext::background(config.server.request_timeout());
        if user_service
            .bootstrap_admin(&ctx, username, password)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bootstrap administrator: {}", e))?
            .is_none()
        {
            tracing::info!(username, "Bootstrap administrator already present");
        }
    }

    let state = AppState::new(
        Arc::new(user_service),
        authenticator,
        catalog,
        config.server.request_timeout(),
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    let registry = tracing_subscriber::registry().with(env_filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
