use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use axum_prometheus::PrometheusMetricLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use linker_server::config::Config;
use linker_server::db::{self, PgParsedLinkStore, PgSavedLinkStore};
use linker_server::handlers::{self, saved_links};
use linker_server::resolver::{HttpFetcher, LinkResolver};
use linker_server::state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing: JSON in production, human-readable in dev.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "linker_server=info,tower_http=info,sqlx=warn"
            .parse()
            .unwrap()
    });

    if std::env::var("APP_ENV").as_deref() == Ok("production") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("🚀 Linker Server starting...");

    let config = Config::from_env().expect("Failed to load configuration");
    info!("📝 Configuration loaded");

    let pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    info!("✅ Database migrations applied");

    db::health_check(&pool)
        .await
        .expect("Database health check failed");
    info!("✅ Database health check passed");

    let fetcher_config = config.fetcher_config();
    if !fetcher_config.block_private_addresses {
        tracing::warn!("⚠️ Link fetcher may contact private/loopback addresses");
    }
    let fetcher = HttpFetcher::new(&fetcher_config).expect("Failed to build HTTP client");
    info!(
        timeout_secs = fetcher_config.timeout.as_secs(),
        "🌐 Link fetcher ready"
    );

    // CORS: permissive in dev, restrictive in production.
    let cors = if config.is_dev {
        info!("🔓 CORS: permissive (dev mode)");
        CorsLayer::permissive()
    } else {
        tracing::warn!("🔒 CORS: restrictive (production mode)");
        CorsLayer::new()
    };

    let addr = config.server_addr();

    let app_state = AppState {
        store: Arc::new(PgParsedLinkStore::new(pool.clone())),
        saved: Arc::new(PgSavedLinkStore::new(pool)),
        resolver: LinkResolver::new(Arc::new(fetcher)),
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = Router::new()
        // Health check + metrics
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(move || async move { metric_handle.render() }),
        )
        // Link resolution
        .route("/links/parse", post(handlers::links::parse_link))
        // Saved links, scoped to the X-Session-Id owner
        .route("/links/save", post(saved_links::save_link))
        .route("/links/mine", get(saved_links::list_saved_links))
        .route(
            "/links/:id",
            get(saved_links::get_saved_link)
                .patch(saved_links::update_saved_link)
                .delete(saved_links::delete_saved_link),
        )
        .route("/links/:id/mark-read", post(saved_links::mark_read))
        .route(
            "/links/:id/toggle-favourite",
            post(saved_links::toggle_favourite),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(prometheus_layer)
        .layer(cors)
        .with_state(app_state);

    info!("🎧 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
