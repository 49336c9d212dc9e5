use crate::config::Config;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Flushes pending spans when dropped
pub struct ObservabilityGuard;

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        shutdown();
    }
}

pub fn init(config: &Config) -> Result<ObservabilityGuard, Box<dyn std::error::Error>> {
    init_tracing(config)?;
    init_metrics(config)?;
    Ok(ObservabilityGuard)
}

fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "taskhub=debug,tower_http=debug".into());

    let otel_layer = match &config.otel_exporter_endpoint {
        Some(endpoint) => {
            let tracer = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(
                    opentelemetry_otlp::new_exporter()
                        .tonic()
                        .with_endpoint(endpoint),
                )
                .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                    KeyValue::new("service.name", config.service_name.clone()),
                ])))
                .install_batch(runtime::Tokio)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_target(true),
        )
        .with(otel_layer)
        .init();

    if let Some(endpoint) = &config.otel_exporter_endpoint {
        tracing::info!("Exporting traces to {}", endpoint);
    }
    Ok(())
}

fn init_metrics(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()?;

    metrics::describe_gauge!(
        "notification_connections_open",
        "Open live notification connections"
    );
    metrics::describe_counter!(
        "notifications_published_total",
        "Publish calls made by mutation handlers"
    );
    metrics::describe_counter!(
        "notification_deliveries_total",
        "Events queued to a live connection"
    );
    metrics::describe_counter!(
        "notification_delivery_failures_total",
        "Connections evicted after a failed push"
    );
    metrics::describe_counter!(
        "notification_admissions_rejected_total",
        "Connection attempts refused at token verification"
    );

    tracing::info!("Prometheus metrics on port {}", config.metrics_port);
    Ok(())
}

pub fn shutdown() {
    global::shutdown_tracer_provider();
}
