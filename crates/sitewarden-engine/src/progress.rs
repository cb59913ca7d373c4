//! Progress event stream

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use url::Url;

use sitewarden_core::CapabilityId;

/// Kind of progress notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// Generic advancement note
    Progress,
    /// A capability is about to run
    CapabilityStart,
    /// A capability finished successfully
    CapabilityComplete,
    /// A capability recorded a failure
    CapabilityError,
    /// A target's task is starting
    TargetStart,
    /// The number of targets in the job is known
    TargetsDiscovered,
    /// Terminal: the task (or job) finished
    Complete,
    /// Terminal: the task aborted on a fatal failure
    Error,
}

/// Immutable value published to the stream.
///
/// Within one task events are emitted in program order by a single
/// producer; no ordering is guaranteed across tasks.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub kind: ProgressKind,
    /// Human-readable text; for `TargetsDiscovered`, the integer count
    pub message: String,
    /// 0-100, non-decreasing within one task
    pub percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<CapabilityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ProgressEvent {
    fn new(kind: ProgressKind, message: impl Into<String>, percent: u8) -> Self {
        Self {
            kind,
            message: message.into(),
            percent,
            capability: None,
            payload: None,
        }
    }

    /// Generic advancement note
    pub fn progress(message: impl Into<String>, percent: u8) -> Self {
        Self::new(ProgressKind::Progress, message, percent)
    }

    /// A target's task is starting
    pub fn target_start(target: &Url) -> Self {
        Self::new(ProgressKind::TargetStart, format!("auditing {target}"), 0)
    }

    /// The job's target count is known
    pub fn targets_discovered(count: usize) -> Self {
        Self::new(ProgressKind::TargetsDiscovered, count.to_string(), 0)
    }

    /// A capability is about to run
    pub fn capability_start(id: CapabilityId, percent: u8) -> Self {
        let mut event = Self::new(ProgressKind::CapabilityStart, format!("running {id}"), percent);
        event.capability = Some(id);
        event
    }

    /// A capability finished; its output rides along as the payload
    pub fn capability_complete(id: CapabilityId, percent: u8, payload: Value) -> Self {
        let mut event = Self::new(
            ProgressKind::CapabilityComplete,
            format!("{id} complete"),
            percent,
        );
        event.capability = Some(id);
        event.payload = Some(payload);
        event
    }

    /// A capability recorded a failure
    pub fn capability_error(id: CapabilityId, percent: u8, message: impl Into<String>) -> Self {
        let mut event = Self::new(ProgressKind::CapabilityError, message, percent);
        event.capability = Some(id);
        event
    }

    /// Terminal success
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(ProgressKind::Complete, message, 100)
    }

    /// Terminal failure
    pub fn error(message: impl Into<String>, percent: u8) -> Self {
        Self::new(ProgressKind::Error, message, percent)
    }
}

/// Consumer-facing side of the progress stream.
///
/// `publish` must never block or fail: a slow or disconnected observer
/// costs dropped events, never stalled execution.
pub trait ProgressSink: Send + Sync {
    /// Publish one event, best-effort
    fn publish(&self, event: ProgressEvent);

    /// Mark the stream finished; later events are discarded
    fn close(&self) {}
}

/// Bounded-channel emitter with exactly one consumer.
///
/// When the channel is full or the receiver is gone the event is
/// counted as dropped instead of blocking the producer.
pub struct ChannelEmitter {
    tx: mpsc::Sender<ProgressEvent>,
    closed: AtomicBool,
    dropped: AtomicU64,
}

impl ChannelEmitter {
    /// Create an emitter and its receiving half
    pub fn channel(capacity: usize) -> (Arc<Self>, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Arc::new(Self {
                tx,
                closed: AtomicBool::new(false),
                dropped: AtomicU64::new(0),
            }),
            rx,
        )
    }

    /// Events discarded because the observer was slow or gone
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl ProgressSink for ChannelEmitter {
    fn publish(&self, event: ProgressEvent) {
        if self.closed.load(Ordering::Relaxed) {
            return;
        }
        if self.tx.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

/// Rescales a task's local 0-100 percent into one window of the overall
/// job's range before forwarding.
pub struct WindowedSink {
    inner: Arc<dyn ProgressSink>,
    base: u8,
    span: u8,
}

impl WindowedSink {
    /// Forward to `inner`, mapping local 0 to `base` and local 100 to
    /// `base + span`
    pub fn new(inner: Arc<dyn ProgressSink>, base: u8, span: u8) -> Self {
        Self { inner, base, span }
    }
}

impl ProgressSink for WindowedSink {
    fn publish(&self, mut event: ProgressEvent) {
        let scaled = self.base as u16 + (event.percent as u16 * self.span as u16) / 100;
        event.percent = scaled.min(100) as u8;
        self.inner.publish(event);
    }

    // close is a no-op: the job-level emitter outlives each target's window
}

/// Sink that logs events via tracing (quiet mode and background jobs)
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn publish(&self, event: ProgressEvent) {
        match event.kind {
            ProgressKind::CapabilityError | ProgressKind::Error => {
                tracing::warn!(
                    capability = ?event.capability,
                    percent = event.percent,
                    "{}",
                    event.message
                );
            }
            _ => {
                tracing::info!(
                    kind = ?event.kind,
                    capability = ?event.capability,
                    percent = event.percent,
                    "{}",
                    event.message
                );
            }
        }
    }
}

/// Sink that collects events for later inspection (useful for testing)
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    /// All events published so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("sink lock").clone()
    }
}

impl ProgressSink for CollectingSink {
    fn publish(&self, event: ProgressEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}
