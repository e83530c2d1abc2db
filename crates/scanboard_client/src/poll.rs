use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use client_logging::{client_debug, client_warn};
use tokio_util::sync::CancellationToken;

use crate::api::StatusSource;
use crate::types::{is_terminal_label, ClientEvent, EventSink, JobId};

struct PollEntry {
    generation: u64,
    token: CancellationToken,
}

/// Owner of the per-job fallback pollers.
///
/// At most one poller runs per job id; `start` for an id with a live poller
/// is a no-op. `stop` is idempotent and safe after a loop already stopped
/// itself.
pub struct PollSet {
    runtime: tokio::runtime::Handle,
    source: Arc<dyn StatusSource>,
    sink: Arc<dyn EventSink>,
    interval: Duration,
    active: Arc<Mutex<HashMap<JobId, PollEntry>>>,
    next_generation: AtomicU64,
}

impl PollSet {
    pub fn new(
        runtime: tokio::runtime::Handle,
        source: Arc<dyn StatusSource>,
        sink: Arc<dyn EventSink>,
        interval: Duration,
    ) -> Self {
        Self {
            runtime,
            source,
            sink,
            interval,
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Starts the poll loop for a job. The first poll fires immediately.
    pub fn start(&self, job_id: &str) {
        let mut active = self.active.lock().expect("poll set lock");
        if active.contains_key(job_id) {
            client_debug!("poller already active for job {job_id}");
            return;
        }
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        active.insert(
            job_id.to_string(),
            PollEntry {
                generation,
                token: token.clone(),
            },
        );
        drop(active);

        self.runtime.spawn(poll_job(
            self.source.clone(),
            self.sink.clone(),
            self.active.clone(),
            job_id.to_string(),
            self.interval,
            generation,
            token,
        ));
    }

    /// Cancels the poll loop for a job, if one is active.
    pub fn stop(&self, job_id: &str) {
        if let Some(entry) = self.active.lock().expect("poll set lock").remove(job_id) {
            entry.token.cancel();
        }
    }

    /// Cancels every active poll loop.
    pub fn stop_all(&self) {
        for (_, entry) in self.active.lock().expect("poll set lock").drain() {
            entry.token.cancel();
        }
    }

    pub fn is_active(&self, job_id: &str) -> bool {
        self.active
            .lock()
            .expect("poll set lock")
            .contains_key(job_id)
    }
}

async fn poll_job(
    source: Arc<dyn StatusSource>,
    sink: Arc<dyn EventSink>,
    active: Arc<Mutex<HashMap<JobId, PollEntry>>>,
    job_id: JobId,
    period: Duration,
    generation: u64,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    loop {
        // Cancellation wins over the tick and over an in-flight request.
        // Whoever cancelled also removed our entry.
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        let observed = tokio::select! {
            _ = token.cancelled() => return,
            result = source.job_status(&job_id) => result,
        };
        match observed {
            Ok(status) => {
                let terminal = is_terminal_label(&status);
                // The terminal value is forwarded before the loop stops:
                // the final observation is never dropped.
                sink.emit(ClientEvent::PollStatus {
                    job_id: job_id.clone(),
                    status,
                });
                if terminal {
                    break;
                }
            }
            Err(err) => {
                // Transport trouble is not fatal; keep polling.
                client_warn!("poll for job {job_id} failed: {err}");
            }
        }
    }

    // Self-termination: deregister, but only our own entry. A concurrent
    // stop/start pair may have replaced it with a newer poller.
    let mut active = active.lock().expect("poll set lock");
    if active
        .get(&job_id)
        .is_some_and(|entry| entry.generation == generation)
    {
        active.remove(&job_id);
    }
}
