use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-wide counters for the hotel service.
///
/// Every increment is mirrored to the `metrics` facade so an exporter can be
/// installed later without touching call sites.
#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    searches_total: AtomicU64,
    rankings_total: AtomicU64,
    assistant_calls_total: AtomicU64,
    assistant_fallbacks_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub searches_total: u64,
    pub rankings_total: u64,
    pub assistant_calls_total: u64,
    pub assistant_fallbacks_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        counter!("volo_requests_total").increment(1);
    }

    pub fn inc_search(&self) {
        self.searches_total.fetch_add(1, Ordering::Relaxed);
        counter!("volo_searches_total").increment(1);
    }

    pub fn inc_ranking(&self) {
        self.rankings_total.fetch_add(1, Ordering::Relaxed);
        counter!("volo_rankings_total").increment(1);
    }

    pub fn inc_assistant_call(&self, operation: &'static str) {
        self.assistant_calls_total.fetch_add(1, Ordering::Relaxed);
        counter!("volo_assistant_calls_total", "operation" => operation).increment(1);
    }

    pub fn inc_assistant_fallback(&self, operation: &'static str) {
        self.assistant_fallbacks_total
            .fetch_add(1, Ordering::Relaxed);
        counter!("volo_assistant_fallbacks_total", "operation" => operation).increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            searches_total: self.searches_total.load(Ordering::Relaxed),
            rankings_total: self.rankings_total.load(Ordering::Relaxed),
            assistant_calls_total: self.assistant_calls_total.load(Ordering::Relaxed),
            assistant_fallbacks_total: self.assistant_fallbacks_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,volo_api=info,volo_agents=info,volo_storage=info",
                service_name
            ))
        });

        // stdout is reserved for command output.
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
