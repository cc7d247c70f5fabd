use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use diaspeak_backend::controllers::{
    admin::AdminController, auth::AuthController, catalog::CatalogController,
    download::DownloadController, jobs::JobsController, speak::SpeakController,
};
use diaspeak_backend::domain::audio::Assembler;
use diaspeak_backend::domain::ratelimit::RateLimiter;
use diaspeak_backend::domain::{
    admin::AdminService, auth::AuthService, catalog::CatalogService, job::JobService,
    speech::{SpeechConfig, SpeechService},
};
use diaspeak_backend::infrastructure::config::{Config, LogFormat};
use diaspeak_backend::infrastructure::http::start_http_server;
use diaspeak_backend::infrastructure::ports::{
    DisabledObjectStore, HttpObjectStore, HttpSynthesizer, ObjectStore, ProcessCodec,
    SpeechSynthesizer, TestToneSynthesizer, TokioJobBackend,
};
use diaspeak_backend::infrastructure::repositories::{
    AuditRepository, CatalogRepository, JobHistoryRepository, UserRepository,
};
use diaspeak_backend::infrastructure::store::OutputStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting DiaSpeak Backend on {}:{}",
        config.host,
        config.port
    );

    // Output tree and ledgers all live under the output root
    tokio::fs::create_dir_all(&config.output_root).await?;
    tracing::info!(root = %config.output_root.display(), "Output root ready");

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (ledger files under the output root)
    tracing::info!("Instantiating repositories...");
    let user_repo = Arc::new(UserRepository::new(config.output_root.join("users.json")));
    let catalog_repo = Arc::new(CatalogRepository::new(config.output_root.join("catalog.csv")));
    let job_history_repo = Arc::new(JobHistoryRepository::new(
        config.output_root.join("job_history.csv"),
    ));
    let audit_repo = Arc::new(AuditRepository::new(config.output_root.join("audit_log.csv")));

    let seed_admin = config
        .admin_users
        .first()
        .cloned()
        .unwrap_or_else(|| "admin".to_string());
    user_repo
        .seed_if_missing(&seed_admin, &config.default_admin_password)
        .await?;

    // 2. Instantiate ports
    tracing::info!("Instantiating ports...");
    let synthesizer: Arc<dyn SpeechSynthesizer> = match &config.synthesizer_url {
        Some(url) => {
            tracing::info!(url = %url, "Using HTTP synthesizer");
            Arc::new(HttpSynthesizer::new(url.clone()))
        }
        None => {
            tracing::warn!("SYNTHESIZER_URL not set, using deterministic test-tone synthesizer");
            Arc::new(TestToneSynthesizer::default())
        }
    };
    let object_store: Arc<dyn ObjectStore> = match &config.object_store_endpoint {
        Some(endpoint) => {
            tracing::info!(endpoint = %endpoint, "Object-store mirroring enabled");
            Arc::new(HttpObjectStore::new(endpoint.clone()))
        }
        None => Arc::new(DisabledObjectStore),
    };
    let codec = Arc::new(ProcessCodec::new(config.ffmpeg_bin.clone()));

    let output_store = Arc::new(OutputStore::new(
        config.output_root.clone(),
        object_store,
        config.object_store_bucket.clone(),
    ));

    // 3. Instantiate services (inject repositories and ports)
    tracing::info!("Instantiating services...");
    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        config.jwt_secret.clone(),
        config.token_ttl_hours,
    ));
    let speech_service = Arc::new(SpeechService::new(
        SpeechConfig {
            chunk_max_chars: config.chunk_max_chars,
            chunk_overlap_chars: config.chunk_overlap_chars,
            synthesis_timeout: Duration::from_secs(config.synthesis_timeout_secs),
        },
        synthesizer,
        Assembler::new(codec),
        output_store,
        catalog_repo.clone(),
    ));
    let job_backend = Arc::new(TokioJobBackend::new(speech_service.clone()));
    let job_service = Arc::new(JobService::new(job_history_repo, job_backend));
    let catalog_service = Arc::new(CatalogService::new(
        catalog_repo,
        config.output_root.clone(),
    ));
    let admin_service = Arc::new(AdminService::new(user_repo, audit_repo));
    let rate_limiter = Arc::new(RateLimiter::new(
        Duration::from_secs(config.rate_limit_window_secs),
        config.rate_limit_max_requests,
    ));

    // 4. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let auth_controller = Arc::new(AuthController::new(auth_service));
    let speak_controller = Arc::new(SpeakController::new(
        speech_service,
        rate_limiter.clone(),
    ));
    let jobs_controller = Arc::new(JobsController::new(job_service, rate_limiter));
    let catalog_controller = Arc::new(CatalogController::new(catalog_service));
    let download_controller = Arc::new(DownloadController::new(config.output_root.clone()));
    let admin_controller = Arc::new(AdminController::new(admin_service));

    // Start HTTP server with all routes
    start_http_server(
        config,
        auth_controller,
        speak_controller,
        jobs_controller,
        catalog_controller,
        download_controller,
        admin_controller,
    )
    .await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "diaspeak_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "diaspeak_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
