/**
 * ============================================================================
 * TEST UTILITIES MODULE
 * ============================================================================
 *
 * PURPOSE: Recording transport and log capture shared by the unit tests
 *
 * Captured log records are keyed by thread. `#[tokio::test]` uses a
 * current-thread runtime, so dispatched tasks log on the test's own thread
 * and tests running in parallel never see each other's records.
 *
 * ============================================================================
 */

use crate::rankings::client::{Transport, TransportResponse};
use crate::rankings::error::{RankingsError, Result};
use crate::rankings::types::Endpoint;
use futures_util::future::BoxFuture;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use std::thread::ThreadId;
use tokio::sync::mpsc;
use tokio::time::Instant;

// =============================================================================
// Log capture
// =============================================================================

#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub level: log::Level,
    pub message: String,
}

static RECORDS: Lazy<Mutex<Vec<(ThreadId, CapturedRecord)>>> = Lazy::new(|| Mutex::new(Vec::new()));

static INIT: Once = Once::new();

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let captured = CapturedRecord {
            level: record.level(),
            message: record.args().to_string(),
        };
        RECORDS
            .lock()
            .unwrap()
            .push((std::thread::current().id(), captured));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;

/// Install the capturing logger once per test binary.
pub fn init_capture() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("no other logger installed in tests");
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Records logged so far on the current thread, debug lines excluded.
pub fn captured_logs() -> Vec<CapturedRecord> {
    let current = std::thread::current().id();
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(thread, record)| *thread == current && record.level <= log::Level::Info)
        .map(|(_, record)| record.clone())
        .collect()
}

/// Warning messages logged so far on the current thread.
pub fn warnings() -> Vec<String> {
    captured_logs()
        .into_iter()
        .filter(|r| r.level == log::Level::Warn)
        .map(|r| r.message)
        .collect()
}

// =============================================================================
// Recording transport
// =============================================================================

#[derive(Debug, Clone)]
pub enum MockReply {
    Status(u16, String),
    Unreachable(String),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub body: serde_json::Value,
    pub at: Instant,
}

/**
 * Transport that records every call with its (simulated) time
 * Answers 200 unless a reply was configured for the endpoint, after the
 * configured latency
 */
pub struct MockTransport {
    replies: Mutex<HashMap<&'static str, MockReply>>,
    latency: Mutex<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    notify: mpsc::UnboundedSender<RecordedCall>,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<RecordedCall>) {
        let (notify, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            replies: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            notify,
        });
        (transport, rx)
    }

    pub fn reply(&self, endpoint: Endpoint, reply: MockReply) {
        self.replies.lock().unwrap().insert(endpoint.path(), reply);
    }

    /// Time every later call takes before its reply arrives.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    fn post<'a>(&'a self, url: &'a str, body: &'a serde_json::Value) -> BoxFuture<'a, Result<TransportResponse>> {
        Box::pin(async move {
            let call = RecordedCall {
                url: url.to_string(),
                body: body.clone(),
                at: Instant::now(),
            };
            self.calls.lock().unwrap().push(call.clone());
            let _ = self.notify.send(call);

            let latency = *self.latency.lock().unwrap();
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            let reply = self
                .replies
                .lock()
                .unwrap()
                .iter()
                .find(|(path, _)| url.ends_with(*path))
                .map(|(_, reply)| reply.clone());

            match reply {
                None => Ok(TransportResponse {
                    status: 200,
                    body: String::new(),
                }),
                Some(MockReply::Status(status, body)) => Ok(TransportResponse { status, body }),
                Some(MockReply::Unreachable(message)) => Err(RankingsError::Network(message)),
            }
        })
    }
}
