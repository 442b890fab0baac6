//! Delivery queue
//!
//! Print jobs that could not be delivered immediately wait here and are
//! retried on a fixed interval. Jobs live in memory only and are retried until
//! they succeed.
//!
//! # Sweep
//!
//! ```text
//! snapshot ──▶ group by printer ──▶ status (once per group)
//!                                      │
//!                      Ok / PaperLow ──┴──▶ send each job
//!                                              │
//!                  remove delivered ◀──────────┘
//! ```
//!
//! At most one sweep runs at a time; an overlapping tick returns immediately.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use comanda_printer::{PrintError, PrintResult, PrintSegment, PrinterStatus, encode_segments};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::transport::PrinterTransport;
use super::types::PrinterTarget;

pub type JobId = u64;

/// A payload waiting for its printer
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: JobId,
    pub printer_id: String,
    pub ip: String,
    pub port: u16,
    pub payload: Vec<PrintSegment>,
    pub enqueued_at: DateTime<Utc>,
    /// Send attempts made by sweeps
    pub attempts: u32,
}

/// Read-only view of a queued job
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub id: JobId,
    pub printer_id: String,
    pub ip: String,
    pub port: u16,
    pub enqueued_at: DateTime<Utc>,
    pub attempts: u32,
    pub segments: usize,
}

impl From<&PrintJob> for JobSummary {
    fn from(job: &PrintJob) -> Self {
        Self {
            id: job.id,
            printer_id: job.printer_id.clone(),
            ip: job.ip.clone(),
            port: job.port,
            enqueued_at: job.enqueued_at,
            attempts: job.attempts,
            segments: job.payload.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub delivered: usize,
    /// Jobs still queued after the sweep
    pub kept: usize,
    /// Printers contacted
    pub groups: usize,
}

/// Outcome of [`DeliveryQueue::safe_print`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Printed,
    Queued(JobId),
}

enum Attempt {
    Sent,
    Refused(PrinterStatus),
    Failed(PrintError),
}

/// Resets the sweep flag even if the sweep future is dropped
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct DeliveryQueue {
    jobs: Mutex<Vec<PrintJob>>,
    next_id: AtomicU64,
    sweeping: AtomicBool,
    transport: Arc<dyn PrinterTransport>,
}

impl DeliveryQueue {
    pub fn new(transport: Arc<dyn PrinterTransport>) -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            sweeping: AtomicBool::new(false),
            transport,
        }
    }

    /// Append a job; never blocks on I/O
    pub fn enqueue(
        &self,
        printer_id: &str,
        ip: &str,
        port: u16,
        payload: Vec<PrintSegment>,
    ) -> JobId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let job = PrintJob {
            id,
            printer_id: printer_id.to_string(),
            ip: ip.to_string(),
            port,
            payload,
            enqueued_at: Utc::now(),
            attempts: 0,
        };

        let pending = {
            let mut jobs = self.jobs.lock();
            jobs.push(job);
            jobs.len()
        };
        info!(job_id = id, printer_id, pending, "Print job queued");
        id
    }

    /// Print now if the printer is ready, otherwise queue the payload
    ///
    /// Only an invalid address is returned as an error; transport failures
    /// and paper problems end up in the queue.
    #[instrument(skip(self, target, payload), fields(printer_id = %target.id))]
    pub async fn safe_print(
        &self,
        target: &PrinterTarget,
        payload: Vec<PrintSegment>,
    ) -> PrintResult<Delivery> {
        target.validate()?;

        let data = encode_segments(&payload);
        match self.attempt(&target.ip, target.port, &data).await {
            Attempt::Sent => {
                info!(bytes = data.len(), "Print job sent");
                Ok(Delivery::Printed)
            }
            Attempt::Refused(status) => {
                warn!(%status, "Printer not ready, queueing job");
                Ok(Delivery::Queued(self.enqueue(
                    &target.id,
                    &target.ip,
                    target.port,
                    payload,
                )))
            }
            Attempt::Failed(e) => {
                warn!(error = %e, "Print failed, queueing job");
                Ok(Delivery::Queued(self.enqueue(
                    &target.id,
                    &target.ip,
                    target.port,
                    payload,
                )))
            }
        }
    }

    async fn attempt(&self, ip: &str, port: u16, data: &[u8]) -> Attempt {
        match self.transport.query_status(ip, port).await {
            Ok(status) if status.can_print() => {}
            Ok(status) => return Attempt::Refused(status),
            Err(e) => return Attempt::Failed(e),
        }
        match self.transport.send(ip, port, data).await {
            Ok(()) => Attempt::Sent,
            Err(e) => Attempt::Failed(e),
        }
    }

    /// Retry every queued job once
    ///
    /// Returns `None` when another sweep is already running.
    pub async fn sweep(&self) -> Option<SweepReport> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Sweep already running, skipping tick");
            return None;
        }
        let _guard = SweepGuard(&self.sweeping);

        let snapshot: Vec<PrintJob> = self.jobs.lock().clone();
        if snapshot.is_empty() {
            return Some(SweepReport::default());
        }

        let mut groups: BTreeMap<&str, Vec<&PrintJob>> = BTreeMap::new();
        for job in &snapshot {
            groups.entry(job.printer_id.as_str()).or_default().push(job);
        }

        let mut attempted = HashSet::new();
        let mut delivered = HashSet::new();

        for (printer_id, jobs) in &groups {
            let Some(first) = jobs.first() else {
                continue;
            };

            match self.transport.query_status(&first.ip, first.port).await {
                Ok(status) if status.can_print() => {}
                Ok(status) => {
                    warn!(
                        printer_id,
                        %status,
                        pending = jobs.len(),
                        "Printer not ready, keeping jobs"
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        printer_id,
                        error = %e,
                        pending = jobs.len(),
                        "Status query failed, keeping jobs"
                    );
                    continue;
                }
            }

            for job in jobs {
                attempted.insert(job.id);
                let data = encode_segments(&job.payload);
                match self.transport.send(&job.ip, job.port, &data).await {
                    Ok(()) => {
                        info!(
                            job_id = job.id,
                            printer_id,
                            attempts = job.attempts + 1,
                            "Queued job delivered"
                        );
                        delivered.insert(job.id);
                    }
                    Err(e) => {
                        warn!(job_id = job.id, printer_id, error = %e, "Queued job failed again");
                    }
                }
            }
        }

        let kept = {
            let mut jobs = self.jobs.lock();
            jobs.retain(|j| !delivered.contains(&j.id));
            for job in jobs.iter_mut().filter(|j| attempted.contains(&j.id)) {
                job.attempts += 1;
            }
            jobs.len()
        };

        Some(SweepReport {
            delivered: delivered.len(),
            kept,
            groups: groups.len(),
        })
    }

    pub fn pending(&self) -> Vec<JobSummary> {
        self.jobs.lock().iter().map(JobSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Sweep every `interval` until `shutdown` fires
    ///
    /// Each sweep runs in its own task, so a slow printer does not delay the
    /// ticker; overlapping ticks are dropped by the sweep guard.
    pub async fn run(self: Arc<Self>, interval: Duration, shutdown: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Delivery queue worker started");

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(pending = self.len(), "Delivery queue worker received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let queue = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Some(report) = queue.sweep().await
                            && report.groups > 0
                        {
                            info!(
                                delivered = report.delivered,
                                kept = report.kept,
                                printers = report.groups,
                                "Sweep finished"
                            );
                        }
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    /// Transport driven by per-ip scripts
    #[derive(Default)]
    struct ScriptedTransport {
        /// Missing entry = Ok; `None` = status timeout
        status: Mutex<HashMap<String, Option<PrinterStatus>>>,
        failing_sends: Mutex<HashSet<String>>,
        sent: Mutex<Vec<(String, Vec<u8>)>>,
        status_calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedTransport {
        fn set_status(&self, ip: &str, status: Option<PrinterStatus>) {
            self.status.lock().insert(ip.to_string(), status);
        }

        fn sent_to(&self, ip: &str) -> usize {
            self.sent.lock().iter().filter(|(i, _)| i == ip).count()
        }
    }

    #[async_trait]
    impl PrinterTransport for ScriptedTransport {
        async fn send(&self, ip: &str, _port: u16, payload: &[u8]) -> PrintResult<()> {
            if self.failing_sends.lock().contains(ip) {
                return Err(PrintError::Connection(format!("{ip}: refused")));
            }
            self.sent.lock().push((ip.to_string(), payload.to_vec()));
            Ok(())
        }

        async fn query_status(&self, ip: &str, _port: u16) -> PrintResult<PrinterStatus> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let scripted = self.status.lock().get(ip).copied();
            match scripted {
                None => Ok(PrinterStatus::Ok),
                Some(Some(status)) => Ok(status),
                Some(None) => Err(PrintError::Timeout(format!("{ip}: no status reply"))),
            }
        }
    }

    fn setup() -> (Arc<ScriptedTransport>, DeliveryQueue) {
        let transport = Arc::new(ScriptedTransport::default());
        let queue = DeliveryQueue::new(transport.clone());
        (transport, queue)
    }

    fn payload() -> Vec<PrintSegment> {
        vec![PrintSegment::text("1x Caffè\n")]
    }

    #[tokio::test]
    async fn test_ready_printer_prints_immediately() {
        let (transport, queue) = setup();
        let target = PrinterTarget::new("bar", "10.0.0.2", 9100);

        let delivery = queue.safe_print(&target, payload()).await.unwrap();

        assert_eq!(delivery, Delivery::Printed);
        assert!(queue.is_empty());
        assert_eq!(transport.sent.lock()[0].1, encode_segments(&payload()));
    }

    #[tokio::test]
    async fn test_paper_low_still_prints() {
        let (transport, queue) = setup();
        transport.set_status("10.0.0.2", Some(PrinterStatus::PaperLow));
        let target = PrinterTarget::new("bar", "10.0.0.2", 9100);

        assert_eq!(
            queue.safe_print(&target, payload()).await.unwrap(),
            Delivery::Printed
        );
    }

    #[tokio::test]
    async fn test_paper_out_queues_then_sweep_delivers() {
        let (transport, queue) = setup();
        transport.set_status("10.0.0.2", Some(PrinterStatus::PaperOut));
        let target = PrinterTarget::new("bar", "10.0.0.2", 9100);

        let delivery = queue.safe_print(&target, payload()).await.unwrap();
        assert!(matches!(delivery, Delivery::Queued(_)));
        assert_eq!(queue.len(), 1);
        assert_eq!(transport.sent_to("10.0.0.2"), 0);

        // Still out of paper: kept, refusal is not an attempt
        let report = queue.sweep().await.unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(queue.pending()[0].attempts, 0);

        transport.set_status("10.0.0.2", Some(PrinterStatus::Ok));
        let report = queue.sweep().await.unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(report.kept, 0);
        assert!(queue.is_empty());
        assert_eq!(transport.sent_to("10.0.0.2"), 1);
    }

    #[tokio::test]
    async fn test_invalid_address_never_queued() {
        let (transport, queue) = setup();

        for target in [
            PrinterTarget::new("bar", "", 9100),
            PrinterTarget::new("bar", "10.0.0.2", 0),
        ] {
            let err = queue.safe_print(&target, payload()).await.unwrap_err();
            assert!(matches!(err, PrintError::InvalidAddress(_)));
        }

        assert!(queue.is_empty());
        assert_eq!(transport.status_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_send_counts_attempts() {
        let (transport, queue) = setup();
        transport.failing_sends.lock().insert("10.0.0.3".to_string());
        let target = PrinterTarget::new("cucina", "10.0.0.3", 9100);

        queue.safe_print(&target, payload()).await.unwrap();
        queue.sweep().await.unwrap();
        queue.sweep().await.unwrap();

        let pending = queue.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 2);

        transport.failing_sends.lock().clear();
        queue.sweep().await.unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_status_timeout_keeps_group() {
        let (transport, queue) = setup();
        transport.set_status("10.0.0.4", None);
        queue.enqueue("pizzeria", "10.0.0.4", 9100, payload());

        let report = queue.sweep().await.unwrap();
        assert_eq!(report, SweepReport { delivered: 0, kept: 1, groups: 1 });
        assert_eq!(transport.sent_to("10.0.0.4"), 0);
    }

    #[tokio::test]
    async fn test_status_queried_once_per_printer() {
        let (transport, queue) = setup();
        for _ in 0..3 {
            queue.enqueue("cucina", "10.0.0.3", 9100, payload());
        }
        queue.enqueue("bar", "10.0.0.2", 9100, payload());

        let report = queue.sweep().await.unwrap();

        assert_eq!(report.groups, 2);
        assert_eq!(report.delivered, 4);
        assert_eq!(transport.status_calls.load(Ordering::SeqCst), 2);
        assert_eq!(transport.sent_to("10.0.0.3"), 3);
    }

    #[tokio::test]
    async fn test_one_printer_down_does_not_block_others() {
        let (transport, queue) = setup();
        transport.set_status("10.0.0.3", Some(PrinterStatus::PaperOut));
        queue.enqueue("cucina", "10.0.0.3", 9100, payload());
        queue.enqueue("bar", "10.0.0.2", 9100, payload());

        let report = queue.sweep().await.unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(queue.pending()[0].printer_id, "cucina");
    }

    #[tokio::test]
    async fn test_job_ids_increase() {
        let (_, queue) = setup();
        let a = queue.enqueue("bar", "10.0.0.2", 9100, payload());
        let b = queue.enqueue("bar", "10.0.0.2", 9100, payload());
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_overlapping_sweep_is_noop() {
        let gate = Arc::new(Notify::new());
        let transport = Arc::new(ScriptedTransport {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let queue = Arc::new(DeliveryQueue::new(transport.clone()));
        queue.enqueue("bar", "10.0.0.2", 9100, payload());

        let first = tokio::spawn({
            let queue = queue.clone();
            async move { queue.sweep().await }
        });
        while transport.status_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // First sweep is parked on the status query
        assert!(queue.sweep().await.is_none());

        // Enqueued mid-sweep: survives the sweep and stays behind
        queue.enqueue("cucina", "10.0.0.3", 9100, payload());

        gate.notify_one();
        let report = first.await.unwrap().unwrap();
        assert_eq!(report.delivered, 1);
        assert_eq!(queue.pending()[0].printer_id, "cucina");

        // Guard released
        gate.notify_one();
        assert!(queue.sweep().await.is_some());
    }

    #[tokio::test]
    async fn test_worker_sweeps_on_interval_and_stops() {
        let (transport, queue) = setup();
        let queue = Arc::new(queue);
        queue.enqueue("bar", "10.0.0.2", 9100, payload());

        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(
            queue
                .clone()
                .run(Duration::from_millis(20), shutdown.clone()),
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while !queue.is_empty() && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(queue.is_empty());
        assert_eq!(transport.sent_to("10.0.0.2"), 1);

        shutdown.cancel();
        worker.await.unwrap();
    }
}
