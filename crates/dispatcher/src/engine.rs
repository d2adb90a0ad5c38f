//! DispatchEngine - single and batch dispatch over a shared RegistryClient

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use contracts::{
    DeviceAddress, DispatchError, DispatchRequest, DispatchResult, EngineSettings, RegistryClient,
};

use crate::error::DispatcherError;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::worker::DispatchWorker;

/// Slot of a batch, kept in input order
enum Slot {
    Done(DispatchResult),
    Running(DeviceAddress, JoinHandle<DispatchResult>),
}

/// Pushes configuration payloads to devices through a `RegistryClient`
pub struct DispatchEngine<C> {
    worker: DispatchWorker<C>,
    concurrency: usize,
}

impl<C> DispatchEngine<C>
where
    C: RegistryClient + Send + Sync + 'static,
{
    /// Create an engine owning `client`
    pub fn new(client: C, settings: &EngineSettings) -> Result<Self, DispatcherError> {
        Self::from_shared(Arc::new(client), settings)
    }

    /// Create an engine around an already shared client
    pub fn from_shared(client: Arc<C>, settings: &EngineSettings) -> Result<Self, DispatcherError> {
        if settings.concurrency == 0 {
            return Err(DispatcherError::invalid_settings(
                "concurrency",
                "must be at least 1",
            ));
        }
        if settings.retry.max_attempts == 0 {
            return Err(DispatcherError::invalid_settings(
                "retry.max_attempts",
                "must be at least 1",
            ));
        }
        if settings.call_timeout_ms == Some(0) {
            return Err(DispatcherError::invalid_settings(
                "call_timeout_ms",
                "must be greater than 0",
            ));
        }

        let worker = DispatchWorker::new(
            client,
            settings.retry.clone(),
            settings.call_timeout(),
            Arc::new(EngineMetrics::new()),
        );

        Ok(Self {
            worker,
            concurrency: settings.concurrency,
        })
    }

    pub fn client(&self) -> &Arc<C> {
        self.worker.client()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Counters across every call made by this engine
    pub fn metrics(&self) -> MetricsSnapshot {
        self.worker.metrics().snapshot()
    }

    /// Dispatch one request; never cancelled
    pub async fn dispatch_one(&self, request: DispatchRequest) -> DispatchResult {
        self.worker.run(request, &CancellationToken::new()).await
    }

    /// Dispatch one request, honouring `token`
    pub async fn dispatch_one_with(
        &self,
        request: DispatchRequest,
        token: &CancellationToken,
    ) -> DispatchResult {
        self.worker.run(request, token).await
    }

    /// Dispatch a batch; one result per request, in input order
    ///
    /// Requests start in input order, at most `concurrency` at a time. Once
    /// `token` fires, requests that have not started are reported as
    /// `Cancelled` without reaching the client.
    #[instrument(
        name = "dispatch_engine_dispatch_many",
        skip(self, requests, token),
        fields(requests = requests.len(), concurrency = self.concurrency)
    )]
    pub async fn dispatch_many(
        &self,
        requests: Vec<DispatchRequest>,
        token: &CancellationToken,
    ) -> Vec<DispatchResult> {
        let total = requests.len();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut slots = Vec::with_capacity(total);

        for request in requests {
            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                let result = DispatchResult::cancelled(request.address().clone());
                slots.push(Slot::Done(self.worker.finish(result)));
                continue;
            };

            let address = request.address().clone();
            let worker = self.worker.clone();
            let token = token.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                worker.run(request, &token).await
            });
            slots.push(Slot::Running(address, handle));
        }

        let mut results = Vec::with_capacity(total);
        for slot in slots {
            let result = match slot {
                Slot::Done(result) => result,
                Slot::Running(address, handle) => match handle.await {
                    Ok(result) => result,
                    Err(join_err) => {
                        error!(address = %address, error = %join_err, "dispatch worker failed");
                        self.worker.finish(DispatchResult::failed(
                            address,
                            None,
                            DispatchError::Internal(format!("worker task failed: {join_err}")),
                            0,
                        ))
                    }
                },
            };
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.success()).count();
        info!(
            total,
            succeeded,
            failed = total - succeeded,
            "batch dispatch complete"
        );

        results
    }
}
