use crate::config::{CatalogConfig, CorsConfig};
use crate::handlers;
use crate::services::MongoDb;
use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, REQUEST_ID_HEADER};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: CatalogConfig,
    /// `None` when no connection string was configured.
    pub db: Option<MongoDb>,
}

impl AppState {
    pub fn store(&self) -> Result<&MongoDb, AppError> {
        self.db.as_ref().ok_or(AppError::ServiceUnavailable)
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors);
    let any_origin = allows_any_origin(&state.config.cors);

    let router = Router::new()
        .route("/", get(handlers::liveness))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_or_lookup_products),
        )
        .route("/products/lookup", post(handlers::lookup_products))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware));

    // Requests without `Origin` get a literal `*`. When `Origin` is present
    // the CORS layer overwrites it with the mirrored value.
    let router = if any_origin {
        router.layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
    } else {
        router
    };

    router.layer(cors)
}

fn allows_any_origin(config: &CorsConfig) -> bool {
    config.allowed_origins.iter().any(|o| o == "*")
}

/// Permissive cross-origin policy. A literal `*` cannot be sent together
/// with `Access-Control-Allow-Credentials`, so a wildcard entry mirrors the
/// caller's origin instead.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_origin = if allows_any_origin(config) {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(config.allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Opens the store handle. Failures are logged and swallowed: the HTTP
/// server starts regardless and store-backed routes report the problem.
async fn open_store(config: &CatalogConfig) -> Option<MongoDb> {
    let Some(uri) = config.mongodb.uri.as_ref() else {
        tracing::error!("Did not connect to MongoDB! MONGODB_URI is not set");
        return None;
    };

    let db = match MongoDb::connect(
        uri.expose_secret(),
        &config.mongodb.database,
        &config.mongodb.collection,
    )
    .await
    {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Did not connect to MongoDB! {}", e);
            return None;
        }
    };

    let probe = db.clone();
    tokio::spawn(async move {
        match probe.health_check().await {
            Ok(()) => tracing::info!("Successfully connected to MongoDB!"),
            Err(e) => tracing::error!("Did not connect to MongoDB! {}", e),
        }
    });

    Some(db)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: Option<MongoDb>,
}

impl Application {
    pub async fn build(config: CatalogConfig) -> Result<Self, AppError> {
        let db = open_store(&config).await;

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
        };
        let router = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("RadioMart API is running on port: {}", port);

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn db(&self) -> Option<&MongoDb> {
        self.db.as_ref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serves until SIGINT/SIGTERM, drains in-flight requests, then closes
    /// the store connection.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(db) = self.db {
            tracing::info!("Closing MongoDB connection");
            db.shutdown().await;
        }

        tracing::info!("Service shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
