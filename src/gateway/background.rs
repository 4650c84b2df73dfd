//! Bounded background queue
//!
//! Audit events and usage records leave the request path through one bounded
//! channel drained by a single worker. Submitting never blocks: when the channel is
//! full the job is dropped, logged and counted. Tenant usage increments are
//! aggregated per flush interval, and sink writes are rate limited. On shutdown the
//! worker drains what is already queued and flushes pending usage before exiting.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::collaborators::{AuditEvent, AuditSink, RequestStats, UsageSink};
use crate::config::Config;

/// Configuration for the background queue
#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// Channel buffer size for handling traffic spikes
    pub channel_buffer: usize,
    /// Maximum time aggregated usage waits before being flushed
    pub flush_interval: Duration,
    /// Maximum sink writes per second
    pub rate_limit_per_second: u32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            channel_buffer: 10_000,
            flush_interval: Duration::from_millis(1000),
            rate_limit_per_second: 50,
        }
    }
}

impl From<&Config> for BackgroundConfig {
    fn from(config: &Config) -> Self {
        Self {
            channel_buffer: config.background_queue_size.max(1),
            flush_interval: Duration::from_millis(config.usage_flush_ms.max(1)),
            rate_limit_per_second: config.sink_rate_per_second,
        }
    }
}

/// Work handed to the background worker
#[derive(Debug, Clone)]
pub enum BackgroundJob {
    Audit(AuditEvent),
    RequestStats(RequestStats),
    TenantUsage { tenant_id: String, amount: i64 },
}

impl BackgroundJob {
    fn kind(&self) -> &'static str {
        match self {
            BackgroundJob::Audit(_) => "audit",
            BackgroundJob::RequestStats(_) => "request_stats",
            BackgroundJob::TenantUsage { .. } => "tenant_usage",
        }
    }
}

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Handle for submitting fire-and-forget jobs
pub struct BackgroundQueue {
    sender: mpsc::Sender<BackgroundJob>,
    shutdown: Arc<Notify>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundQueue {
    /// Create the queue and spawn its worker
    pub fn new(
        audit: Arc<dyn AuditSink>,
        usage: Arc<dyn UsageSink>,
        config: BackgroundConfig,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(config.channel_buffer);
        let shutdown = Arc::new(Notify::new());

        let worker = tokio::spawn(Self::background_worker(
            audit,
            usage,
            receiver,
            shutdown.clone(),
            config,
        ));

        Self {
            sender,
            shutdown,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Stop accepting jobs, then wait until everything queued has been written
    ///
    /// Later calls return immediately.
    pub async fn shutdown(&self) {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(worker) = worker else {
            return;
        };

        self.shutdown.notify_one();
        if let Err(e) = worker.await {
            error!(error = %e, "Background worker ended abnormally");
        }
    }

    /// Queue a job without waiting
    ///
    /// Returns `false` when the job was dropped.
    pub fn submit(&self, job: BackgroundJob) -> bool {
        match self.sender.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(job = job.kind(), "Background queue full, dropping job");
                metrics::record_dropped(job.kind());
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                error!(job = job.kind(), "Background queue closed, dropping job");
                metrics::record_dropped(job.kind());
                false
            }
        }
    }

    async fn background_worker(
        audit: Arc<dyn AuditSink>,
        usage: Arc<dyn UsageSink>,
        mut receiver: mpsc::Receiver<BackgroundJob>,
        shutdown: Arc<Notify>,
        config: BackgroundConfig,
    ) {
        info!(
            channel_buffer = config.channel_buffer,
            flush_interval_ms = config.flush_interval.as_millis() as u64,
            rate_limit = config.rate_limit_per_second,
            "Starting background worker"
        );

        let rate_limiter = RateLimiter::direct(Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_second).unwrap_or(nonzero!(50u32)),
        ));

        let mut pending_usage: HashMap<String, i64> = HashMap::new();
        let mut last_flush = Instant::now();

        loop {
            let time_until_flush = config.flush_interval.saturating_sub(last_flush.elapsed());

            tokio::select! {
                maybe_job = receiver.recv() => {
                    match maybe_job {
                        Some(BackgroundJob::TenantUsage { tenant_id, amount }) => {
                            *pending_usage.entry(tenant_id).or_insert(0) += amount;
                        }
                        Some(job) => {
                            Self::write(&*audit, &*usage, &rate_limiter, job).await;
                        }
                        None => {
                            Self::flush_usage(&*usage, &rate_limiter, &mut pending_usage).await;
                            info!("Background worker shutting down");
                            break;
                        }
                    }
                }
                _ = tokio::time::sleep(time_until_flush) => {
                    Self::flush_usage(&*usage, &rate_limiter, &mut pending_usage).await;
                    last_flush = Instant::now();
                }
                // Closing lets `recv` drain the buffer and then yield `None`
                _ = shutdown.notified() => {
                    info!("Background worker draining");
                    receiver.close();
                }
            }
        }
    }

    async fn write(
        audit: &dyn AuditSink,
        usage: &dyn UsageSink,
        rate_limiter: &DirectLimiter,
        job: BackgroundJob,
    ) {
        rate_limiter.until_ready().await;

        let kind = job.kind();
        let result = match &job {
            BackgroundJob::Audit(event) => audit.append(event).await,
            BackgroundJob::RequestStats(stats) => usage.record_request(stats).await,
            BackgroundJob::TenantUsage { tenant_id, amount } => {
                usage.increment_tenant_usage(tenant_id, *amount).await
            }
        };

        match result {
            Ok(()) => metrics::record_job(kind, "success"),
            Err(e) => {
                warn!(job = kind, error = %e, "Background job failed");
                metrics::record_job(kind, "failure");
            }
        }
    }

    async fn flush_usage(
        usage: &dyn UsageSink,
        rate_limiter: &DirectLimiter,
        pending: &mut HashMap<String, i64>,
    ) {
        if pending.is_empty() {
            return;
        }

        debug!(tenants = pending.len(), "Flushing tenant usage");

        for (tenant_id, amount) in pending.drain() {
            rate_limiter.until_ready().await;
            match usage.increment_tenant_usage(&tenant_id, amount).await {
                Ok(()) => metrics::record_job("tenant_usage", "success"),
                Err(e) => {
                    warn!(tenant_id = %tenant_id, amount, error = %e, "Failed to increment tenant usage");
                    metrics::record_job("tenant_usage", "failure");
                }
            }
        }
    }
}

/// Metrics for the background queue
pub mod metrics {
    use metrics::counter;

    /// Record a job dropped before reaching the worker
    pub fn record_dropped(job: &'static str) {
        counter!("shroud_background_dropped_total", "job" => job).increment(1);
    }

    /// Record a processed job
    pub fn record_job(job: &'static str, result: &'static str) {
        counter!("shroud_background_jobs_total", "job" => job, "result" => result).increment(1);
    }
}
