//! Provides helper functions for initializing telemetry collection and publication.
use std::{convert::Infallible, net::SocketAddr};

use anyhow::Result;
use hyper::{
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{metrics::MeterProvider as SdkMeterProvider, runtime, Resource};
use prometheus::{Encoder, TextEncoder};
use tokio::task::JoinHandle;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter, Registry};

const SERVICE_NAME: &str = "loadbench";

fn resource() -> Resource {
    Resource::new(vec![
        KeyValue::new(
            "hostname",
            gethostname::gethostname()
                .into_string()
                .unwrap_or_else(|_| "unknown".to_owned()),
        ),
        KeyValue::new("service.name", SERVICE_NAME),
    ])
}

/// Initialize tracing.
///
/// Logs are always written to stdout. Spans are additionally exported over OTLP when an
/// endpoint is provided.
pub async fn init_tracing(otlp_endpoint: Option<String>) -> Result<()> {
    // Default to INFO if no env is specified
    let log_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()?;
    let logger = tracing_subscriber::fmt::layer()
        .with_ansi(true)
        .compact()
        .with_filter(log_filter);

    let telemetry = if let Some(endpoint) = otlp_endpoint {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(endpoint),
            )
            .with_trace_config(opentelemetry_sdk::trace::config().with_resource(resource()))
            .install_batch(runtime::Tokio)?;
        let otlp_filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env()?;
        Some(
            tracing_opentelemetry::layer()
                .with_tracer(tracer)
                .with_filter(otlp_filter),
        )
    } else {
        None
    };

    let collector = Registry::default().with(telemetry).with(logger);

    #[cfg(feature = "tokio-console")]
    let collector = {
        let console_filter = EnvFilter::builder().parse("tokio=trace,runtime=trace")?;
        let console_layer = console_subscriber::spawn().with_filter(console_filter);
        collector.with(console_layer)
    };

    tracing::subscriber::set_global_default(collector)?;

    Ok(())
}

/// Initialize metrics.
///
/// Installs a global meter provider backed by a Prometheus registry and returns both.
/// The registry is what [`start_metrics_server`] serves.
pub fn init_metrics() -> Result<(SdkMeterProvider, prometheus::Registry)> {
    let registry = prometheus::Registry::new();
    let exporter = opentelemetry_prometheus::exporter()
        .with_registry(registry.clone())
        .build()?;
    let provider = SdkMeterProvider::builder()
        .with_reader(exporter)
        .with_resource(resource())
        .build();
    global::set_meter_provider(provider.clone());
    Ok((provider, registry))
}

/// Serve the registry in the Prometheus text format on `/metrics`.
pub fn start_metrics_server(
    addr: &SocketAddr,
    registry: prometheus::Registry,
) -> Result<JoinHandle<Result<(), hyper::Error>>> {
    let make_svc = make_service_fn(move |_conn| {
        let registry = registry.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |req| handle(req, registry.clone())))
        }
    });
    let server = Server::try_bind(addr)?.serve(make_svc);
    Ok(tokio::spawn(server))
}

/// Flush any pending spans and metrics.
pub fn shutdown(provider: SdkMeterProvider) -> Result<()> {
    global::shutdown_tracer_provider();
    provider.shutdown()?;
    Ok(())
}

async fn handle(
    req: Request<Body>,
    registry: prometheus::Registry,
) -> Result<Response<Body>, Infallible> {
    if req.uri().path() != "/metrics" {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NOT_FOUND;
        return Ok(response);
    }
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let response = match encoder.encode(&registry.gather(), &mut buffer) {
        Ok(()) => Response::new(Body::from(buffer)),
        Err(err) => {
            tracing::warn!(%err, "failed to encode metrics");
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    };
    Ok(response)
}
