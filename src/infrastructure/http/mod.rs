use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::infrastructure::config::Config;
use crate::{
    controllers::{
        admin::AdminController, auth::AuthController, catalog::CatalogController,
        download::DownloadController, health, jobs::JobsController, speak::SpeakController,
    },
    infrastructure::auth::{admin_middleware, auth_middleware, request_id_middleware},
};

/// Build the full application router. Split out from the server entry so
/// tests can drive the router in-process.
pub fn build_router(
    config: Arc<Config>,
    auth_controller: Arc<AuthController>,
    speak_controller: Arc<SpeakController>,
    jobs_controller: Arc<JobsController>,
    catalog_controller: Arc<CatalogController>,
    download_controller: Arc<DownloadController>,
    admin_controller: Arc<AdminController>,
) -> Router {
    // Synthesis routes (need auth)
    let speak_routes = Router::new()
        .route("/speak", post(SpeakController::speak))
        .route("/speak-file", post(SpeakController::speak_file))
        .with_state(speak_controller)
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ));

    // Async submission needs auth; polling and history are public
    let job_submit_routes = Router::new()
        .route("/speak-async", post(JobsController::submit))
        .with_state(jobs_controller.clone())
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth_middleware,
        ));

    let job_read_routes = Router::new()
        .route("/job/:id", get(JobsController::get_job))
        .route("/jobs", get(JobsController::list_jobs))
        .with_state(jobs_controller);

    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(AuthController::login))
        .with_state(auth_controller);

    // Catalog routes (public)
    let catalog_routes = Router::new()
        .route("/catalog", get(CatalogController::list))
        .route(
            "/catalog/:index",
            put(CatalogController::update).delete(CatalogController::delete),
        )
        .route("/catalog/batch", post(CatalogController::batch))
        .with_state(catalog_controller);

    // Download route (public, range-capable)
    let download_routes = Router::new()
        .route("/download/*path", get(DownloadController::download))
        .with_state(download_controller);

    // Admin routes (admin bearer required)
    let admin_routes = Router::new()
        .route(
            "/admin/users",
            get(AdminController::list_users).post(AdminController::create_user),
        )
        .route(
            "/admin/users/:username",
            put(AdminController::update_user).delete(AdminController::delete_user),
        )
        .route("/admin/tenants", get(AdminController::list_tenants))
        .route("/admin/audit-log", get(AdminController::audit_log))
        .with_state(admin_controller)
        .layer(middleware::from_fn_with_state(
            config.clone(),
            admin_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes)
        .merge(speak_routes)
        .merge(job_submit_routes)
        .merge(job_read_routes)
        .merge(catalog_routes)
        .merge(download_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    auth_controller: Arc<AuthController>,
    speak_controller: Arc<SpeakController>,
    jobs_controller: Arc<JobsController>,
    catalog_controller: Arc<CatalogController>,
    download_controller: Arc<DownloadController>,
    admin_controller: Arc<AdminController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(
        config.clone(),
        auth_controller,
        speak_controller,
        jobs_controller,
        catalog_controller,
        download_controller,
        admin_controller,
    );

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
