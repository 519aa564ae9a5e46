//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed mining metrics, and an async HTTP
//! exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

/// Mining-related Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated from the miner
/// loop and the consensus engine.
#[derive(Clone)]
pub struct MiningMetrics {
    /// Wall-clock seconds from candidate assembly to a sealed block.
    pub seal_seconds: Histogram,
    /// Total blocks this node has mined and imported.
    pub blocks_mined: IntCounter,
    /// Mining rounds abandoned at the deadline.
    pub rounds_timed_out: IntCounter,
    /// Longer peer chains adopted after a timeout.
    pub chains_adopted: IntCounter,
    /// Transactions rejected at intake (signature or balance).
    pub txs_rejected: IntCounter,
    /// Current difficulty (bit length of the scheduled key).
    pub bit_length: IntGauge,
}

impl MiningMetrics {
    /// Registers mining metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let seal_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mining_seal_seconds",
                "Time from candidate assembly to a sealed block in seconds",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 60.0]),
        )?;
        registry.register(Box::new(seal_seconds.clone()))?;

        let blocks_mined = IntCounter::with_opts(Opts::new(
            "mining_blocks_mined",
            "Total blocks mined and imported by this node",
        ))?;
        registry.register(Box::new(blocks_mined.clone()))?;

        let rounds_timed_out = IntCounter::with_opts(Opts::new(
            "mining_rounds_timed_out",
            "Mining rounds abandoned at the block-time deadline",
        ))?;
        registry.register(Box::new(rounds_timed_out.clone()))?;

        let chains_adopted = IntCounter::with_opts(Opts::new(
            "mining_chains_adopted",
            "Longer peer chains adopted during consensus rounds",
        ))?;
        registry.register(Box::new(chains_adopted.clone()))?;

        let txs_rejected = IntCounter::with_opts(Opts::new(
            "node_txs_rejected",
            "Transactions rejected at intake (signature or balance)",
        ))?;
        registry.register(Box::new(txs_rejected.clone()))?;

        let bit_length = IntGauge::with_opts(Opts::new(
            "mining_bit_length",
            "Current difficulty as the scheduled key's bit length",
        ))?;
        registry.register(Box::new(bit_length.clone()))?;

        Ok(Self {
            seal_seconds,
            blocks_mined,
            rounds_timed_out,
            chains_adopted,
            txs_rejected,
            bit_length,
        })
    }
}

/// Wrapper around a Prometheus registry and the mining metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub mining: MiningMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the mining metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("chain".to_string()), None)?;
        let mining = MiningMetrics::register(&registry)?;
        Ok(Self { registry, mining })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// This function is `async` and is intended to be spawned onto a Tokio
/// runtime, e.g.:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9898".parse()?;
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!("prometheus HTTP server error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}
