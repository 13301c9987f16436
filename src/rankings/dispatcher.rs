/**
 * ============================================================================
 * DISPATCHER MODULE
 * ============================================================================
 *
 * PURPOSE: Fire-and-forget execution of collector requests
 *
 * EXECUTION MODEL:
 * - Every submitted request runs on its own task on the host runtime
 * - No queue, requests may overlap and complete out of order
 * - Nothing is returned to the submitter, failures are logged only
 * - No retries
 *
 * ORDERING:
 * - Cold-start gate: until an identity exchange has succeeded, registrations
 *   wait 1s and score updates wait 2s before their network call. Identity
 *   requests never wait.
 * - Registration settle: submitting a leaderboard registration arms an extra
 *   2s wait for the next score request to start. Armed on the submitting
 *   thread, before the registration goes out. Single global slot, a later
 *   registration overwrites it. Registrations never consume the slot.
 *
 * Both rules are soft barriers. Tasks may observe a stale connection flag and
 * wait needlessly; that is accepted.
 *
 * ============================================================================
 */

use crate::rankings::client::{self, Transport};
use crate::rankings::error::{RankingsError, Result};
use crate::rankings::logging::Reporter;
use crate::rankings::types::{
    Endpoint, REGISTRATION_SETTLE, RequestDescriptor, RequestKind,
};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::sleep;

/**
 * Outbound request executor
 * Owns the connection flag and the armed settle delay
 */
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    runtime: Handle,
    api_url: String,
    enabled: bool,
    connected: AtomicBool,
    settle_delay_ms: AtomicU64,
    reporter: Reporter,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        runtime: Handle,
        api_url: impl Into<String>,
        enabled: bool,
        connected: bool,
        reporter: Reporter,
    ) -> Self {
        Self {
            transport,
            runtime,
            api_url: api_url.into(),
            enabled,
            connected: AtomicBool::new(connected),
            settle_delay_ms: AtomicU64::new(0),
            reporter,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    /**
     * Submit a request for background execution
     * Returns immediately. No-op when the client is globally disabled.
     */
    pub fn submit(self: &Arc<Self>, descriptor: RequestDescriptor) {
        if !self.enabled {
            return;
        }

        if descriptor.kind == RequestKind::LeaderboardRegistration {
            self.arm_settle_delay(REGISTRATION_SETTLE);
        }

        let dispatcher = Arc::clone(self);
        self.runtime.spawn(async move {
            let _ = dispatcher.execute(descriptor).await;
        });
    }

    /**
     * Encode a body and submit it
     * An unencodable body is logged and dropped like any other failure
     */
    pub fn submit_body<B: Serialize>(self: &Arc<Self>, endpoint: Endpoint, kind: RequestKind, body: &B) {
        if !self.enabled {
            return;
        }

        match RequestDescriptor::new(endpoint, kind, body) {
            Ok(descriptor) => self.submit(descriptor),
            Err(e) => self
                .reporter
                .warn(format!("Failed to encode {} request: {}", kind, e)),
        }
    }

    /**
     * Run one request to completion
     *
     * Applies the cold-start gate and the armed settle delay, performs the
     * POST, updates the connection flag and logs the outcome. Arming the
     * settle delay is `submit`'s job. The returned result is for internal
     * callers only, `submit` discards it.
     */
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<()> {
        let kind = descriptor.kind;

        if kind != RequestKind::Identity && !self.is_connected() {
            if let Some(wait) = kind.cold_start_wait() {
                sleep(wait).await;
            }
        }

        if kind.consumes_settle_delay() {
            if let Some(settle) = self.take_settle_delay() {
                sleep(settle).await;
            }
        }

        let result = self.exchange(&descriptor).await;

        match &result {
            Ok(()) => {
                if kind == RequestKind::Identity {
                    self.connected.store(true, Ordering::Release);
                    self.reporter.info("Successfully connected to mc-rankings.com");
                }
            }
            Err(RankingsError::RemoteRejection { kind, body, .. }) => {
                self.reporter.warn(kind.failure_message());
                self.reporter.warn(body);
            }
            Err(e) => {
                self.reporter.warn(e);
            }
        }

        result
    }

    async fn exchange(&self, descriptor: &RequestDescriptor) -> Result<()> {
        let url = client::endpoint_url(&self.api_url, descriptor.endpoint.path());
        self.reporter.debug(format!("POST {} ({})", url, descriptor.kind));

        let response = self.transport.post(&url, &descriptor.body).await?;
        if response.is_success() {
            return Ok(());
        }

        Err(RankingsError::RemoteRejection {
            kind: descriptor.kind,
            status: response.status,
            body: response.body,
        })
    }

    fn arm_settle_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.settle_delay_ms.store(ms, Ordering::Release);
    }

    fn take_settle_delay(&self) -> Option<Duration> {
        match self.settle_delay_ms.swap(0, Ordering::AcqRel) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    #[cfg(test)]
    fn pending_settle_delay(&self) -> Option<Duration> {
        match self.settle_delay_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
