use std::fmt;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TrackerError};
use crate::orbit::{CollisionSearch, EARTH, JulianDate, OrbitalElements, julian_now};
use crate::pipeline::alert::format_collision_alert;
use crate::pipeline::config::PipelineConfig;
use crate::ports::{AlertPublisher, MessageQueue, QueueMessage, ResultStore};
use crate::types::{AsteroidRecord, ResultRecord, SimulationOutcome};

/// Shared intake drained by every worker in the pool.
pub type SharedIntake = Arc<Mutex<mpsc::Receiver<QueueMessage>>>;

/// Outside-world clients a worker calls into. All of them are shared by the
/// whole pool.
#[derive(Clone)]
pub struct Collaborators {
    pub queue: Arc<dyn MessageQueue>,
    pub alerts: Arc<dyn AlertPublisher>,
    pub results: Arc<dyn ResultStore>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("queue", &std::any::type_name_of_val(self.queue.as_ref()))
            .field("alerts", &std::any::type_name_of_val(self.alerts.as_ref()))
            .field("results", &std::any::type_name_of_val(self.results.as_ref()))
            .finish()
    }
}

/// What happened to one message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Processed and deleted from the queue.
    Acknowledged,
    /// Processed, but the delete call failed. The message will be redelivered.
    AckFailed,
    /// Payload could not be parsed or validated. Left on the queue.
    Rejected,
    /// Shutdown interrupted the simulation. Left on the queue.
    Cancelled,
    /// The simulation task itself failed. Left on the queue.
    Failed,
}

/// One member of the worker pool.
pub struct Worker {
    id: usize,
    collaborators: Collaborators,
    search: CollisionSearch,
    reference: OrbitalElements,
    alert_topic: Arc<str>,
    clock: fn() -> JulianDate,
    cancel: CancellationToken,
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("collaborators", &self.collaborators)
            .field("search", &self.search)
            .field("alert_topic", &self.alert_topic)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Worker {
    pub fn new(
        id: usize,
        collaborators: Collaborators,
        config: &PipelineConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            id,
            collaborators,
            search: CollisionSearch::new(config.search),
            reference: EARTH,
            alert_topic: Arc::from(config.alert_topic.as_str()),
            clock: julian_now,
            cancel,
        }
    }

    /// Replace the source of the search start instant. Defaults to the
    /// current wall-clock time.
    pub fn with_clock(mut self, clock: fn() -> JulianDate) -> Self {
        self.clock = clock;
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Drain the shared intake until it closes or shutdown is requested.
    pub async fn run(self, intake: SharedIntake) {
        info!(target: "pipeline::worker", worker = self.id, "worker started");
        loop {
            let next = {
                let mut rx = intake.lock().await;
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => None,
                    message = rx.recv() => message,
                }
            };

            let Some(message) = next else {
                break;
            };
            self.process_message(message).await;
        }
        info!(target: "pipeline::worker", worker = self.id, "worker shutting down");
    }

    /// Handle one message end to end.
    ///
    /// Parse and validation failures leave the message on the queue. Once a
    /// search outcome exists the alert and the result are dispatched and the
    /// message is deleted, whether or not those calls succeeded.
    pub async fn process_message(&self, message: QueueMessage) -> Disposition {
        debug!(
            target: "pipeline::worker",
            worker = self.id,
            message_id = %message.message_id,
            "message received"
        );

        let record = match AsteroidRecord::from_json(&message.body) {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    target: "pipeline::worker",
                    worker = self.id,
                    message_id = %message.message_id,
                    error = %err,
                    "dropping unprocessable message"
                );
                return Disposition::Rejected;
            }
        };

        let outcome = match self.simulate(&record).await {
            Ok(Some(outcome)) => outcome,
            Ok(None) => {
                info!(
                    target: "pipeline::worker",
                    worker = self.id,
                    asteroid = %record.id,
                    "simulation cancelled, message left for redelivery"
                );
                return Disposition::Cancelled;
            }
            Err(err) => {
                error!(
                    target: "pipeline::worker",
                    worker = self.id,
                    asteroid = %record.id,
                    error = %err,
                    "simulation failed"
                );
                return Disposition::Failed;
            }
        };

        self.dispatch(&record, &outcome).await;

        match self.collaborators.queue.delete(&message.receipt).await {
            Ok(()) => {
                debug!(
                    target: "pipeline::worker",
                    worker = self.id,
                    asteroid = %record.id,
                    dangerous = outcome.is_collision(),
                    "message processed"
                );
                Disposition::Acknowledged
            }
            Err(err) => {
                error!(
                    target: "pipeline::worker",
                    worker = self.id,
                    message_id = %message.message_id,
                    error = %err,
                    "failed to acknowledge message"
                );
                Disposition::AckFailed
            }
        }
    }

    async fn simulate(&self, record: &AsteroidRecord) -> Result<Option<SimulationOutcome>> {
        let search = self.search;
        let target = record.elements;
        let reference = self.reference;
        let start = (self.clock)();
        let cancel = self.cancel.clone();

        tokio::task::spawn_blocking(move || {
            search.run_until_cancelled(&target, &reference, start, &cancel)
        })
        .await
        .map_err(|e| TrackerError::Internal(format!("simulation task failed: {e}")))
    }

    /// Alert on collisions, then persist. Failures are logged and swallowed.
    async fn dispatch(&self, record: &AsteroidRecord, outcome: &SimulationOutcome) {
        if let SimulationOutcome::Collision {
            impact_time,
            miss_distance_km,
        } = *outcome
        {
            warn!(
                target: "pipeline::worker",
                worker = self.id,
                asteroid = %record.id,
                name = %record.name,
                impact_time,
                miss_distance_km,
                "collision detected"
            );

            let text = format_collision_alert(&record.name, impact_time, miss_distance_km);
            if let Err(err) = self
                .collaborators
                .alerts
                .notify(&self.alert_topic, &text)
                .await
            {
                error!(
                    target: "pipeline::worker",
                    worker = self.id,
                    asteroid = %record.id,
                    error = %err,
                    "failed to publish collision alert"
                );
            }
        }

        let row = ResultRecord::from_outcome(record.id.clone(), record.name.clone(), outcome);
        if let Err(err) = self.collaborators.results.save_result(&row).await {
            error!(
                target: "pipeline::worker",
                worker = self.id,
                asteroid = %record.id,
                error = %err,
                "failed to save simulation result"
            );
        }
    }
}
