use crate::cli::ServeArgs;
use crate::infra::{
    AppState, CampaignFixture, InMemoryCampaignStore, OfflineTextGenerator, TracingAnalyticsSink,
};
use crate::routes::with_decision_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use outreach_ai::config::AppConfig;
use outreach_ai::error::AppError;
use outreach_ai::telemetry;
use outreach_ai::workflows::outreach::DecisionService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let rules = config.decision.rule_set()?;
    let store = InMemoryCampaignStore::default();
    if let Some(path) = args.fixture.take() {
        store.seed(CampaignFixture::load(&path)?);
        info!(fixture = %path.display(), "campaign fixture loaded");
    }
    if config.generation.is_configured() {
        warn!("text generation key set but no hosted backend is linked; narration uses fallbacks");
    }

    let decision_service = Arc::new(DecisionService::new(
        Arc::new(store),
        Arc::new(TracingAnalyticsSink::default()),
        Arc::new(OfflineTextGenerator),
        rules,
    ));
    info!(
        rules = decision_service.engine().rules().len(),
        "decision rules loaded"
    );

    let app = with_decision_routes(decision_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "outreach decision engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
