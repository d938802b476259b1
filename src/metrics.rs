use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;
use std::thread;

/// Request/connection counters, exported in Prometheus text format.
pub struct Metrics {
    registry: Registry,
    pub requests_total: IntCounter,
    pub connections_active: IntGauge,
    pub blocks_total: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Arc<Self>> {
        let registry = Registry::new();
        // Prefix metrics with `minicoin_` for namespacing.
        let requests_total =
            IntCounter::new("minicoin_requests_total", "Requests processed since startup")?;
        let connections_active =
            IntGauge::new("minicoin_connections_active", "Currently open client connections")?;
        let blocks_total = IntGauge::new("minicoin_blocks_total", "Blocks in the chain")?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(connections_active.clone()))?;
        registry.register(Box::new(blocks_total.clone()))?;

        Ok(Arc::new(Metrics { registry, requests_total, connections_active, blocks_total }))
    }

    /// Serve the registry over HTTP on a background thread. A bind failure
    /// logs and disables metrics; it never takes the server down.
    pub fn serve(self: &Arc<Self>, bind: String) {
        let metrics = self.clone();
        thread::spawn(move || {
            let server = match tiny_http::Server::http(&bind) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("🔥 Could not start metrics server on {}: {}", bind, e);
                    return;
                }
            };

            for request in server.incoming_requests() {
                let mut buffer = vec![];
                let encoder = TextEncoder::new();
                let metric_families = metrics.registry.gather();
                if encoder.encode(&metric_families, &mut buffer).is_err() {
                    eprintln!("🔥 Could not encode metrics");
                    continue;
                }

                let response = tiny_http::Response::from_data(buffer).with_header(
                    "Content-Type: application/openmetrics-text; version=1.0.0; charset=utf-8"
                        .parse::<tiny_http::Header>()
                        .unwrap(),
                );

                let _ = request.respond(response);
            }
        });
    }
}
