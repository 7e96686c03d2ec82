use crate::cli::ServeArgs;
use crate::infra::{build_service, load_fixture, AppState, StoreService};
use crate::routes::with_matching_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use internship_match::config::AppConfig;
use internship_match::error::AppError;
use internship_match::workflows::matching::recompute_all_parallel;
use internship_match::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
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

    let fixture = load_fixture(args.fixture.as_deref())?;
    let service = build_service(fixture, config.engine.clone())?;

    if config.batch.recompute_interval_secs > 0 {
        spawn_scheduled_recompute(
            service.clone(),
            config.batch.concurrency,
            Duration::from_secs(config.batch.recompute_interval_secs),
        );
    }

    let app = with_matching_routes(service, config.batch.concurrency)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "internship matching engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn spawn_scheduled_recompute(service: Arc<StoreService>, concurrency: usize, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match recompute_all_parallel(service.clone(), concurrency).await {
                Ok(summary) => info!(
                    postings = summary.postings,
                    failures = summary.failures.len(),
                    "scheduled recompute finished"
                ),
                Err(err) => warn!(error = %err, "scheduled recompute failed"),
            }
            let sweeper = service.clone();
            match tokio::task::spawn_blocking(move || sweeper.expire_lapsed_offers()).await {
                Ok(Ok(expired)) => info!(expired, "offer expiry sweep finished"),
                Ok(Err(err)) => warn!(error = %err, "offer expiry sweep failed"),
                Err(err) => warn!(error = %err, "offer expiry sweep aborted"),
            }
        }
    });
}
