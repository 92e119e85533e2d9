use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod adapters;
mod application;
mod auth;
mod config;
mod models;
mod routes;
mod shutdown;
#[cfg(test)]
mod testing;
mod worker;

use adapters::{
    HttpChatBridge, MemoryContextCache, OpenAiReasoner, PdfMonkeyReports, PgConversationRepository,
    PgDefectRepository, PgJobQueue, PgProcessedEventRepository, PgRateWindowStore,
    PgSiteRepository, QueuePolicy, RetryPolicy, SonioxTranscriber,
};
use application::{
    Deduplicator, EngineSettings, IntakeGateway, Orchestrator, RateLimiter, SiteContextCache,
    SiteService, ToolDeps, ToolRegistry,
};
use auth::AdminKey;
use config::Settings;
use models::HealthResponse;
use siteline::{ReportGenerator, Transcriber};
use shutdown::SitelineService;
use worker::{JobRunner, MaintenanceTask, WorkerConfig, WorkerPool};

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub intake: Arc<IntakeGateway>,
    pub sites: Arc<SiteService>,
    pub admin_key: AdminKey,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Full HTTP surface over `state`
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    let openapi = routes::swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(health_check))
        .merge(routes::webhook::router())
        .merge(routes::admin::router(state.admin_key.clone()))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> Result<SitelineService, shuttle_runtime::Error> {
    tracing::info!("🏗️ Siteline API initializing...");

    let settings = Settings::from_secrets(&secrets)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    if settings.admin_api_key.is_some() {
        tracing::info!("🔐 Admin API enabled");
    } else {
        tracing::warn!("⚠️  No ADMIN_API_KEY set - admin routes locked");
    }

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run database migrations: {e}"))?;

    tracing::info!("✅ Database migrations completed");

    // Repositories and stores
    let site_repo = Arc::new(PgSiteRepository::new(pool.clone()));
    let defect_repo = Arc::new(PgDefectRepository::new(pool.clone()));
    let processed_repo = Arc::new(PgProcessedEventRepository::new(pool.clone()));
    let conversation_repo = Arc::new(PgConversationRepository::new(pool.clone()));
    let rate_store = Arc::new(PgRateWindowStore::new(pool.clone()));
    let queue = Arc::new(PgJobQueue::new(
        pool,
        QueuePolicy {
            max_attempts: settings.job_max_tries,
            lease: settings.job_timeout + Duration::from_secs(30),
            ..QueuePolicy::default()
        },
    ));
    let cache_store = Arc::new(MemoryContextCache::new());

    // External collaborators
    let bridge = Arc::new(
        HttpChatBridge::new(
            settings.bridge_url.clone(),
            settings.bridge_signing_secret.clone(),
            RetryPolicy::default(),
        )
        .map_err(|e| anyhow::anyhow!("{e}"))?,
    );
    tracing::info!("🌉 Chat bridge: {}", settings.bridge_url);

    let reasoner = Arc::new(
        OpenAiReasoner::new(
            settings.openai_api_key.clone(),
            settings.openai_base_url.clone(),
            settings.openai_model.clone(),
        )
        .map_err(|e| anyhow::anyhow!("{e}"))?,
    );
    tracing::info!("🧠 Reasoning model: {}", settings.openai_model);

    let transcriber: Option<Arc<dyn Transcriber>> = match &settings.soniox_api_key {
        Some(key) => {
            let stt = SonioxTranscriber::new(key.clone(), settings.stt_timeout)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            tracing::info!("🎙️ Transcription enabled");
            Some(Arc::new(stt) as Arc<dyn Transcriber>)
        }
        None => {
            tracing::warn!("⚠️  No SONIOX_API_KEY set - voice notes will not be transcribed");
            None
        }
    };

    let reports: Option<Arc<dyn ReportGenerator>> = match &settings.pdfmonkey {
        Some(pdf) => {
            let generator = PdfMonkeyReports::new(pdf.api_key.clone(), pdf.template_id.clone())
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            tracing::info!("📄 PDF reports enabled");
            Some(Arc::new(generator) as Arc<dyn ReportGenerator>)
        }
        None => {
            tracing::warn!("⚠️  No PDFMONKEY_API_KEY/PDFMONKEY_TEMPLATE_ID set - PDF reports disabled");
            None
        }
    };

    // Application services
    let site_cache = Arc::new(SiteContextCache::new(
        site_repo.clone(),
        cache_store.clone(),
        settings.site_cache_ttl,
    ));
    let site_service = Arc::new(SiteService::new(site_repo, site_cache.clone()));
    let rate_limiter = Arc::new(RateLimiter::new(
        rate_store,
        settings.rate_limit_max_messages,
        settings.rate_limit_window,
    ));
    let dedup = Arc::new(Deduplicator::new(processed_repo));
    let intake = Arc::new(IntakeGateway::new(
        settings.webhook_secret.clone(),
        rate_limiter.clone(),
        dedup.clone(),
        queue.clone(),
    ));

    let tools = Arc::new(ToolRegistry::standard(ToolDeps {
        defects: defect_repo,
        bridge: bridge.clone(),
        sites: site_service.clone(),
        reports,
        max_description_length: settings.max_description_length,
    }));
    tracing::info!("🔧 {} tools registered", tools.len());

    let orchestrator = Arc::new(Orchestrator::new(
        site_cache,
        reasoner,
        transcriber,
        tools,
        bridge,
        conversation_repo,
        EngineSettings {
            max_iterations: settings.agent_max_iterations,
            transcription_timeout: settings.stt_timeout,
            turn_timeout: settings.job_timeout,
        },
    ));

    // Background work, stopped after the listener shuts down
    let workers = WorkerPool::new(
        JobRunner::new(queue.clone(), orchestrator),
        WorkerConfig {
            max_jobs: settings.worker_max_jobs,
            ..WorkerConfig::default()
        },
    )
    .start();
    let maintenance = MaintenanceTask::new(
        queue,
        rate_limiter,
        cache_store,
        dedup,
        settings.dedup_retention,
        Duration::from_secs(60),
    )
    .start();

    let state = AppState {
        intake,
        sites: site_service,
        admin_key: AdminKey(settings.admin_api_key.as_deref().map(Arc::from)),
    };

    let router = build_router(state, settings.max_request_body_bytes);

    tracing::info!("📚 Swagger UI: /swagger-ui");
    tracing::info!("✅ Siteline API ready");

    Ok(SitelineService::new(
        router,
        vec![workers, maintenance],
        shutdown::install_signal_handler(),
    ))
}
