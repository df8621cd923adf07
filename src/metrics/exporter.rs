use std::sync::Arc;

use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::error::Result;
use crate::pool::Pool;

use super::NAMESPACE;

const POOL_LABEL: &str = "pool_name";

/// Renders every pool's current snapshot into the exposition model.
///
/// Owns an explicit registry (no global state) so independent instances can
/// coexist in tests. Each scrape resets every series and repopulates it
/// from a per-pool snapshot copy: gauges are set, counters are added onto
/// the freshly reset accumulator, so the exposed value always equals the
/// raw snapshot value as reported by FPM.
pub struct Exporter {
    registry: Registry,
    pools: Vec<Arc<Pool>>,

    listen_queue: IntGaugeVec,
    listen_queue_len: IntGaugeVec,
    idle_processes: IntGaugeVec,
    active_processes: IntGaugeVec,
    total_processes: IntGaugeVec,

    start_since: IntCounterVec,
    accepted_conn: IntCounterVec,
    max_listen_queue: IntCounterVec,
    max_active_processes: IntCounterVec,
    max_children_reached: IntCounterVec,
    slow_requests: IntCounterVec,
}

impl Exporter {
    pub fn new(pools: Vec<Arc<Pool>>) -> Result<Self> {
        let registry = Registry::new();

        Ok(Self {
            listen_queue: gauge(
                &registry,
                "listen_queue",
                "The number of requests in the queue of pending connections",
            )?,
            listen_queue_len: gauge(
                &registry,
                "listen_queue_len",
                "The size of the socket queue of pending connections",
            )?,
            idle_processes: gauge(&registry, "idle_processes", "The number of idle processes")?,
            active_processes: gauge(
                &registry,
                "active_processes",
                "The number of active processes",
            )?,
            total_processes: gauge(
                &registry,
                "total_processes",
                "The number of idle + active processes",
            )?,
            start_since: counter(
                &registry,
                "start_since",
                "Number of seconds since FPM has started",
            )?,
            accepted_conn: counter(
                &registry,
                "accepted_conn",
                "The number of requests accepted by the pool",
            )?,
            max_listen_queue: counter(
                &registry,
                "max_listen_queue",
                "The maximum number of requests in the queue of pending connections since FPM has started",
            )?,
            max_active_processes: counter(
                &registry,
                "max_active_processes",
                "The maximum number of active processes since FPM has started",
            )?,
            max_children_reached: counter(
                &registry,
                "max_children_reached",
                "The number of times, the process limit has been reached, when pm tries to start more children (works only for pm 'dynamic' and 'ondemand')",
            )?,
            slow_requests: counter(
                &registry,
                "slow_requests",
                "The number of requests that exceeded your request_slowlog_timeout value",
            )?,
            registry,
            pools,
        })
    }

    /// The registry backing this exporter, for registering extra collectors.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Produce one full text-format exposition of every pool.
    pub fn render(&self) -> Result<String> {
        self.reset();

        for pool in &self.pools {
            let status = pool.cache().snapshot();
            let label = &[pool.name()];

            self.listen_queue
                .with_label_values(label)
                .set(status.listen_queue);
            self.listen_queue_len
                .with_label_values(label)
                .set(status.listen_queue_len);
            self.idle_processes
                .with_label_values(label)
                .set(status.idle_processes);
            self.active_processes
                .with_label_values(label)
                .set(status.active_processes);
            self.total_processes
                .with_label_values(label)
                .set(status.total_processes);

            self.start_since
                .with_label_values(label)
                .inc_by(to_counter(status.start_since));
            self.accepted_conn
                .with_label_values(label)
                .inc_by(to_counter(status.accepted_conn));
            self.max_listen_queue
                .with_label_values(label)
                .inc_by(to_counter(status.max_listen_queue));
            self.max_active_processes
                .with_label_values(label)
                .inc_by(to_counter(status.max_active_processes));
            self.max_children_reached
                .with_label_values(label)
                .inc_by(to_counter(status.max_children_reached));
            self.slow_requests
                .with_label_values(label)
                .inc_by(to_counter(status.slow_requests));
        }

        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()).into())
    }

    fn reset(&self) {
        self.listen_queue.reset();
        self.listen_queue_len.reset();
        self.idle_processes.reset();
        self.active_processes.reset();
        self.total_processes.reset();
        self.start_since.reset();
        self.accepted_conn.reset();
        self.max_listen_queue.reset();
        self.max_active_processes.reset();
        self.max_children_reached.reset();
        self.slow_requests.reset();
    }
}

fn gauge(registry: &Registry, name: &str, help: &str) -> Result<IntGaugeVec> {
    let vec = IntGaugeVec::new(Opts::new(name, help).namespace(NAMESPACE), &[POOL_LABEL])?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounterVec> {
    let vec = IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), &[POOL_LABEL])?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

/// FPM reports nonnegative counters; clamp defensively rather than panic.
fn to_counter(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
