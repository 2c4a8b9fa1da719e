use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::pipeline::config::PipelineConfig;
use crate::pipeline::poller::IngressPoller;
use crate::pipeline::worker::{Collaborators, Worker};

/// Supervises the ingress poller and the worker pool of one process.
pub struct PipelineRuntime {
    config: PipelineConfig,
    shutdown_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl fmt::Debug for PipelineRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let running = self.handles.iter().filter(|h| !h.is_finished()).count();
        f.debug_struct("PipelineRuntime")
            .field("workers", &self.config.workers)
            .field("intake_capacity", &self.config.intake_capacity)
            .field("running_tasks", &running)
            .field("shutdown_requested", &self.shutdown_token.is_cancelled())
            .finish()
    }
}

impl PipelineRuntime {
    /// Spawn the worker pool and the poller with a fresh shutdown token.
    pub fn start(config: PipelineConfig, collaborators: Collaborators) -> Self {
        Self::start_with_token(config, collaborators, CancellationToken::new())
    }

    /// Spawn the pipeline under an existing token. Cancelling the token has
    /// the same effect as [`PipelineRuntime::shutdown`] minus the join.
    pub fn start_with_token(
        config: PipelineConfig,
        collaborators: Collaborators,
        shutdown_token: CancellationToken,
    ) -> Self {
        let workers = config.workers.max(1);
        let (tx, rx) = mpsc::channel(config.intake_capacity.max(1));
        let intake = Arc::new(Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers + 1);
        for id in 0..workers {
            let worker = Worker::new(
                id,
                collaborators.clone(),
                &config,
                shutdown_token.child_token(),
            );
            handles.push(tokio::spawn(worker.run(Arc::clone(&intake))));
        }

        let poller = IngressPoller::new(
            Arc::clone(&collaborators.queue),
            config.receive,
            tx,
            shutdown_token.child_token(),
        )
        .with_error_backoff(config.poll_error_backoff);
        handles.push(tokio::spawn(poller.run()));

        info!(
            target: "pipeline::runtime",
            workers,
            intake_capacity = config.intake_capacity,
            "pipeline started"
        );

        Self {
            config,
            shutdown_token,
            handles,
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Cancel everything and wait for the tasks to finish. Messages whose
    /// simulation was interrupted stay on the queue.
    pub async fn shutdown(self) {
        self.shutdown_token.cancel();
        for result in join_all(self.handles).await {
            if let Err(err) = result {
                warn!(target: "pipeline::runtime", error = %err, "pipeline task ended abnormally");
            }
        }
        info!(target: "pipeline::runtime", "pipeline stopped");
    }
}
