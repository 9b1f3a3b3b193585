//! Baitline service entry point.
//!
//! Wires configuration to concrete adapters: session store (memory or
//! Redis), reply strategy (templates or LLM delegate), the report
//! dispatcher, and the HTTP surface.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use baitline::adapters::http::{self, honeypot::HoneypotHandlers};
use baitline::adapters::reply::{LlmReplyConfig, LlmReplyStrategy, TemplatePool};
use baitline::adapters::report::HttpReportSink;
use baitline::adapters::store::{InMemorySessionStore, RedisSessionStore};
use baitline::application::{ReportDispatcher, RetryPolicy, SessionOrchestrator, SessionSettings};
use baitline::config::{AppConfig, ReplyBackend, StoreBackend};
use baitline::domain::session::EngagementPolicy;
use baitline::ports::{ReplyStrategy, SessionStore};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("baitline failed to start: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    let store = build_store(&config).await;
    let fallback_store = Arc::new(InMemorySessionStore::new());
    let reply_strategy = build_reply_strategy(&config)?;

    let sink = HttpReportSink::new(config.report.collector_url.clone(), config.report.timeout())?;
    let dispatcher = ReportDispatcher::spawn(
        Arc::new(sink),
        RetryPolicy::default()
            .with_max_attempts(config.report.max_attempts)
            .with_pause(config.report.retry_pause()),
    );

    let policy = EngagementPolicy::new()
        .with_max_turns(config.engagement.max_turns)
        .with_stall_limit(config.engagement.stall_limit)
        .with_phones_as_critical(config.engagement.count_phones_as_critical);

    let orchestrator = SessionOrchestrator::new(
        store,
        fallback_store,
        reply_strategy,
        Arc::new(TemplatePool::new()),
        dispatcher,
    )
    .with_policy(policy)
    .with_settings(SessionSettings {
        session_ttl: config.store.session_ttl(),
        history_window: config.engagement.history_window,
    });

    let app = http::router(
        HoneypotHandlers::new(Arc::new(orchestrator)),
        Arc::new(config.server.api_key.clone()),
    )
    .layer(TraceLayer::new_for_http())
    .layer(TimeoutLayer::new(std::time::Duration::from_secs(
        config.server.request_timeout_secs,
    )));

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "baitline listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Selects the session store backend. A Redis that is down at startup is a
/// warning, not a crash: the service runs on the in-memory store until the
/// next restart.
async fn build_store(config: &AppConfig) -> Arc<dyn SessionStore> {
    match (config.store.backend, config.store.redis_url.as_deref()) {
        (StoreBackend::Redis, Some(url)) => match RedisSessionStore::connect(url).await {
            Ok(store) => {
                tracing::info!("connected to redis session store");
                Arc::new(store)
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    "redis unavailable at startup, falling back to in-memory store"
                );
                Arc::new(InMemorySessionStore::new())
            }
        },
        _ => Arc::new(InMemorySessionStore::new()),
    }
}

/// Selects the reply strategy.
fn build_reply_strategy(
    config: &AppConfig,
) -> Result<Arc<dyn ReplyStrategy>, Box<dyn std::error::Error>> {
    match (config.reply.backend, &config.reply.llm_api_key) {
        (ReplyBackend::Llm, Some(key)) => {
            let llm_config = LlmReplyConfig::new(key.expose_secret().clone())
                .with_model(config.reply.llm_model.clone())
                .with_base_url(config.reply.llm_base_url.clone())
                .with_timeout(config.reply.llm_timeout());
            Ok(Arc::new(LlmReplyStrategy::new(llm_config)?))
        }
        _ => Ok(Arc::new(TemplatePool::new())),
    }
}
