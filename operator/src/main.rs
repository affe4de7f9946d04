//! Operator is a long lived process that runs benchmark tools as k8s jobs.
#![deny(missing_docs)]
use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use futures::future::join_all;
use kube::Client;
use loadbench_common::telemetry;
use loadbench_operator::tools::Tool;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OTLP endpoint to export spans to, spans are only logged when unset.
    #[arg(long, env = "OPERATOR_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Address the Prometheus metrics endpoint listens on.
    #[arg(long, env = "OPERATOR_PROM_BIND", default_value = "0.0.0.0:9464")]
    prom_bind: SocketAddr,

    /// Benchmark tools to run controllers for, defaults to all of them.
    #[arg(long, env = "OPERATOR_TOOLS", value_enum, value_delimiter = ',')]
    tools: Vec<Tool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    telemetry::init_tracing(args.otlp_endpoint.clone()).await?;
    let (metrics_provider, registry) = telemetry::init_metrics()?;
    let metrics_server = telemetry::start_metrics_server(&args.prom_bind, registry)?;

    let tools = if args.tools.is_empty() {
        Tool::all()
    } else {
        args.tools
    };
    info!(?tools, prom_bind = %args.prom_bind, "starting operator");

    let k_client = Client::try_default().await?;
    join_all(tools.into_iter().map(|tool| tool.run(k_client.clone()))).await;

    // Flush traces and metrics before shutdown
    metrics_server.abort();
    telemetry::shutdown(metrics_provider)?;
    Ok(())
}
