//! Binding controller background worker.
//!
//! Consumes binding events from a queue and runs a periodic resync of every
//! binding. Failed syncs are retried after an exponential backoff.

use std::time::Duration;

use fanout_api::{Binding, BindingKey};
use fanout_reconcile::{
    Backoff, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, DEFAULT_RESYNC_INTERVAL,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, instrument, warn};

use super::reconciler::{BindingReconciler, ReconcileStats, SyncOutcome};
use crate::error::{ControllerError, ControllerResult};

/// Something happened to a binding.
#[derive(Debug, Clone)]
pub enum BindingEvent {
    /// The binding was created or changed.
    Changed(Binding),
    /// The binding was deleted.
    Deleted(BindingKey),
    /// Re-read the binding from the store and sync it.
    Retry(BindingKey),
}

impl BindingEvent {
    pub fn key(&self) -> BindingKey {
        match self {
            BindingEvent::Changed(binding) => binding.key(),
            BindingEvent::Deleted(key) | BindingEvent::Retry(key) => key.clone(),
        }
    }
}

/// Binding controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Interval between full resyncs.
    pub resync_interval: Duration,
    /// Upper bound on a single sync.
    pub reconcile_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resync_interval: DEFAULT_RESYNC_INTERVAL,
            reconcile_timeout: Duration::from_secs(30),
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_max: DEFAULT_BACKOFF_MAX,
        }
    }
}

/// Worker that drives the binding reconciler.
pub struct BindingController {
    reconciler: BindingReconciler,
    config: ControllerConfig,
    backoff: Backoff,
}

impl BindingController {
    pub fn new(reconciler: BindingReconciler, config: ControllerConfig) -> Self {
        let backoff = Backoff::new(config.backoff_base, config.backoff_max);
        Self {
            reconciler,
            config,
            backoff,
        }
    }

    /// Run until shutdown is signaled or the event queue closes.
    ///
    /// `retry_tx` must feed the same queue as `events`.
    #[instrument(skip_all)]
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<BindingEvent>,
        retry_tx: mpsc::Sender<BindingEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(
            resync_interval_secs = self.config.resync_interval.as_secs(),
            "Starting binding controller"
        );

        let mut resync = tokio::time::interval(self.config.resync_interval);
        // First tick completes immediately; resync only after a full interval
        resync.tick().await;

        loop {
            tokio::select! {
                // Shutdown wins over pending events
                biased;

                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Binding controller shutting down");
                        break;
                    }
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("Binding event queue closed");
                        break;
                    };
                    // Failures are logged and requeued by process
                    let _ = self.process(event, &retry_tx).await;
                }
                _ = resync.tick() => {
                    if let Err(e) = self.resync(&retry_tx, &shutdown).await {
                        error!(error = %e, "Binding resync failed");
                    }
                }
            }
        }
    }

    /// Sync every binding in the store once.
    ///
    /// Each binding goes through [`Self::process`], so it is bounded by the
    /// reconcile timeout and failures are requeued with backoff. The pass
    /// stops early once shutdown is signaled.
    #[instrument(skip_all)]
    pub async fn resync(
        &mut self,
        retry_tx: &mpsc::Sender<BindingEvent>,
        shutdown: &watch::Receiver<bool>,
    ) -> ControllerResult<ReconcileStats> {
        let mut stats = ReconcileStats::default();

        let timeout = self.config.reconcile_timeout;
        let keys = tokio::time::timeout(timeout, self.reconciler.binding_keys())
            .await
            .map_err(|_| ControllerError::Timeout {
                binding: "resync listing".to_string(),
                elapsed: timeout,
            })??;
        debug!(binding_count = keys.len(), "Found bindings to reconcile");

        for key in keys {
            if *shutdown.borrow() {
                info!("Shutdown signaled, stopping resync early");
                break;
            }
            match self.process(BindingEvent::Retry(key), retry_tx).await {
                Ok(SyncOutcome::NotReady) => stats.bindings_not_ready += 1,
                Ok(SyncOutcome::Synced {
                    orphans_removed, ..
                }) => {
                    stats.bindings_processed += 1;
                    stats.orphans_removed += orphans_removed as i32;
                }
                Ok(SyncOutcome::TornDown) => stats.bindings_processed += 1,
                Err(_) => stats.bindings_failed += 1,
            }
        }

        info!(
            bindings_processed = stats.bindings_processed,
            bindings_failed = stats.bindings_failed,
            bindings_not_ready = stats.bindings_not_ready,
            orphans_removed = stats.orphans_removed,
            "Resync pass complete"
        );

        Ok(stats)
    }

    /// Handle one event. On failure a retry is scheduled on `retry_tx`.
    pub async fn process(
        &mut self,
        event: BindingEvent,
        retry_tx: &mpsc::Sender<BindingEvent>,
    ) -> ControllerResult<SyncOutcome> {
        let key = event.key();
        let backoff_key = key.to_string();

        let result = self.sync_with_timeout(event).await;
        match &result {
            Ok(outcome) => {
                debug!(binding = %key, outcome = ?outcome, "Binding synced");
                self.backoff.clear(&backoff_key);
            }
            Err(e) => {
                let delay = self.backoff.record_failure(&backoff_key);
                warn!(
                    binding = %key,
                    error = %e,
                    attempt = self.backoff.failures(&backoff_key),
                    retry_in_ms = delay.as_millis() as u64,
                    "Failed to sync binding, requeueing"
                );
                schedule_retry(retry_tx.clone(), key, delay);
            }
        }

        result
    }

    async fn sync_with_timeout(&self, event: BindingEvent) -> ControllerResult<SyncOutcome> {
        let key = event.key();
        let timeout = self.config.reconcile_timeout;

        let sync = async {
            match &event {
                BindingEvent::Changed(binding) => self.reconciler.reconcile(binding).await,
                BindingEvent::Deleted(key) => self.reconciler.teardown(key).await,
                BindingEvent::Retry(key) => self.reconciler.sync(key).await,
            }
        };

        match tokio::time::timeout(timeout, sync).await {
            Ok(result) => result,
            Err(_) => Err(ControllerError::Timeout {
                binding: key.to_string(),
                elapsed: timeout,
            }),
        }
    }
}

fn schedule_retry(retry_tx: mpsc::Sender<BindingEvent>, key: BindingKey, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if retry_tx.send(BindingEvent::Retry(key)).await.is_err() {
            debug!("Binding event queue closed before retry");
        }
    });
}
