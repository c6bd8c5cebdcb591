mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::access::{AccessGuard, IdentityResolver};
use crate::features::auth;
use crate::features::favorites::{self, FavoriteService, PgFavoriteRepository};
use crate::features::files::{self, FileQueryService, FileService, PgFileRepository};
use crate::features::retention::RetentionSweeper;
use crate::features::users::{self, PgUserRepository, UserService};
use crate::modules::storage::{BlobStore, MinIOClient};
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Log system info
    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    // Create database connection pool
    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    // Run migrations automatically
    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    // Initialize auth
    let jwks_client = Arc::new(auth::JwksClient::new(
        &config.auth.jwks_url,
        config.auth.jwks_cache_ttl,
    ));
    let jwt_validator = Arc::new(auth::JwtValidator::new(
        jwks_client,
        config.auth.issuer.clone(),
        config.auth.audience.clone(),
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized (JWKS: {})", config.auth.jwks_url);

    // Initialize MinIO client for blob storage
    let minio_client = Arc::new(
        MinIOClient::new(config.minio.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize MinIO client: {}", e))?,
    );
    // Ensure bucket exists (create if not)
    minio_client
        .ensure_bucket_exists()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to ensure MinIO bucket exists: {}", e))?;
    tracing::info!(
        "MinIO client initialized for bucket: {}",
        minio_client.bucket_name()
    );
    let blob_store: Arc<dyn BlobStore> = minio_client;

    // Repositories
    let user_repository = Arc::new(PgUserRepository::new(pool.clone()));
    let file_repository = Arc::new(PgFileRepository::new(pool.clone()));
    let favorite_repository = Arc::new(PgFavoriteRepository::new(pool.clone()));

    // Access guard shared by every file and favorite operation
    let access_guard = Arc::new(AccessGuard::new(
        IdentityResolver::new(user_repository.clone()),
        file_repository.clone(),
    ));

    let user_service = Arc::new(UserService::new(user_repository));
    let file_service = Arc::new(FileService::new(
        Arc::clone(&access_guard),
        file_repository.clone(),
        Arc::clone(&blob_store),
    ));
    let file_query_service = Arc::new(FileQueryService::new(
        Arc::clone(&access_guard),
        file_repository.clone(),
        favorite_repository.clone(),
        Arc::clone(&blob_store),
    ));
    let favorite_service = Arc::new(FavoriteService::new(
        Arc::clone(&access_guard),
        favorite_repository,
    ));
    tracing::info!("File, favorite and user services initialized");

    // Spawn retention sweeper
    if config.retention.enabled {
        let sweeper = RetentionSweeper::new(
            file_repository,
            Arc::clone(&blob_store),
            config.retention.sweep_interval,
        );
        tokio::spawn(async move {
            sweeper.run().await;
        });
        tracing::info!(
            "Retention sweeper spawned (every {}s)",
            config.retention.sweep_interval.as_secs()
        );
    } else {
        tracing::warn!("Retention sweeper disabled; trashed files will not be purged");
    }

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    // Build swagger router
    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(
                Arc::new(credentials),
                "Swagger UI",
            )))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // API routes: identity is resolved when a bearer token is present; handlers decide
    // whether a missing identity is an error or an empty result
    let api_routes = Router::new()
        .merge(files::routes(file_service, file_query_service))
        .merge(favorites::routes(favorite_service))
        .merge(users::routes(Arc::clone(&user_service)))
        .route_layer(axum::middleware::from_fn_with_state(
            jwt_validator.clone(),
            middleware::identity_middleware,
        ));

    // Provisioning hooks are only mounted when credentials are configured
    let provisioning = match config.provisioning.credentials() {
        Some(credentials) => {
            tracing::info!("Provisioning hooks enabled at /internal");
            users::provisioning_routes(user_service, Arc::new(credentials))
        }
        None => {
            tracing::warn!("Provisioning hooks disabled (no credentials configured)");
            Router::new()
        }
    };

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(provisioning)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(65535)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
