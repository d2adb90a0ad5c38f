//! DispatchWorker - one request, end to end, with bounded retry

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use contracts::{
    CallContext, DeviceAddress, DispatchError, DispatchRequest, DispatchResult, PathResolver,
    PayloadEncoder, RegistryClient, RemoteError, RetryPolicy,
};

use crate::metrics::EngineMetrics;

/// Executes single requests against a shared client
///
/// Cheap to clone; every clone shares the client and the counters.
pub(crate) struct DispatchWorker<C> {
    client: Arc<C>,
    retry: RetryPolicy,
    call_timeout: Option<Duration>,
    metrics: Arc<EngineMetrics>,
}

impl<C> Clone for DispatchWorker<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            retry: self.retry.clone(),
            call_timeout: self.call_timeout,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<C: RegistryClient + Sync> DispatchWorker<C> {
    pub(crate) fn new(
        client: Arc<C>,
        retry: RetryPolicy,
        call_timeout: Option<Duration>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            client,
            retry,
            call_timeout,
            metrics,
        }
    }

    pub(crate) fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub(crate) fn metrics(&self) -> &Arc<EngineMetrics> {
        &self.metrics
    }

    /// Encode, resolve, call with retry; every failure comes back as data
    #[instrument(
        name = "dispatch_worker_run",
        skip(self, request, token),
        fields(device = %request.address().device_id)
    )]
    pub(crate) async fn run(
        &self,
        request: DispatchRequest,
        token: &CancellationToken,
    ) -> DispatchResult {
        let result = self.execute(request, token).await;
        self.finish(result)
    }

    /// Count and log a final result
    pub(crate) fn finish(&self, result: DispatchResult) -> DispatchResult {
        self.metrics.record_result(&result);
        observability::record_result(&result);

        match result.error() {
            None => info!(
                path = result.path().unwrap_or_default(),
                attempts = result.attempts(),
                "config dispatched"
            ),
            Some(DispatchError::Cancelled) => {
                debug!(address = %result.address(), "dispatch cancelled")
            }
            Some(err) => warn!(
                address = %result.address(),
                attempts = result.attempts(),
                kind = %err.kind(),
                error = %err,
                "dispatch failed"
            ),
        }
        result
    }

    async fn execute(&self, request: DispatchRequest, token: &CancellationToken) -> DispatchResult {
        let (address, payload) = request.into_parts();

        if token.is_cancelled() {
            return DispatchResult::cancelled(address);
        }

        let encoded = match PayloadEncoder::encode(&payload) {
            Ok(encoded) => encoded,
            Err(e) => return DispatchResult::failed(address, None, e.into(), 0),
        };
        let path = match PathResolver::resolve(&address) {
            Ok(path) => path,
            Err(e) => return DispatchResult::failed(address, None, e.into(), 0),
        };

        self.call_with_retry(address, path, encoded.as_base64(), token)
            .await
    }

    async fn call_with_retry(
        &self,
        address: DeviceAddress,
        path: String,
        encoded_payload: &str,
        token: &CancellationToken,
    ) -> DispatchResult {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            if token.is_cancelled() {
                return Self::cancelled_after(address, path, attempt);
            }

            attempt += 1;
            let ctx = CallContext::new(attempt, self.call_timeout);
            let err = match self.call(&path, encoded_payload, &ctx).await {
                Ok(()) => return DispatchResult::succeeded(address, path, attempt),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= max_attempts {
                return DispatchResult::failed(address, Some(path), err.into(), attempt);
            }

            let delay = self.retry.delay_after(attempt);
            warn!(
                path = %path,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "registry unavailable, retrying"
            );

            tokio::select! {
                biased;
                _ = token.cancelled() => return Self::cancelled_after(address, path, attempt),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// One remote call, bounded by the per-call timeout
    async fn call(&self, path: &str, encoded_payload: &str, ctx: &CallContext) -> Result<(), RemoteError> {
        let name = self.client.name();
        self.metrics.inc_attempt(ctx.attempt);
        observability::record_dispatch_attempt(name);
        if ctx.attempt > 1 {
            observability::record_retry(name);
        }

        let started = Instant::now();
        let call = self.client.push_config(path, encoded_payload, ctx);
        let outcome = match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(RemoteError::Unavailable("deadline exceeded".into()))),
            None => call.await,
        };
        observability::record_call_latency_ms(started.elapsed().as_secs_f64() * 1000.0);

        outcome
    }

    fn cancelled_after(address: DeviceAddress, path: String, attempts: u32) -> DispatchResult {
        if attempts == 0 {
            DispatchResult::cancelled(address)
        } else {
            DispatchResult::failed(address, Some(path), DispatchError::Cancelled, attempts)
        }
    }
}
