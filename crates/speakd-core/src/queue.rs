//! Priority speech queue — serial playback with preemption and eviction.
//!
//! A bounded priority queue with one background worker that synthesizes and
//! then plays each utterance. Items dequeue in non-decreasing priority
//! (lower is more urgent), FIFO within a priority. A higher-priority
//! arrival may cancel the in-flight playback; overflow evicts the oldest
//! item of the least-urgent group, never the playing one.
//!
//! All shared state sits behind one `Mutex` that is only ever held for
//! constant-time mutations — synthesis and playback run outside it. The
//! worker is woken through a `Notify`; each utterance carries its own
//! `CancellationToken`, which is also how `stop_and_clear` reaches the
//! audio sink.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::SpeakError;
use crate::sink::{AudioSink, PlaybackOutcome};
use crate::synth::SynthesizerPool;

/// Queue tuning, from `service` config.
#[derive(Debug, Clone, Copy)]
pub struct QueueSettings {
    /// Upper bound on {queued items} ∪ {playing item}. At least 1.
    pub max_depth: usize,

    /// Whether a strictly more urgent arrival cancels the playing item.
    pub interrupt_on_higher_priority: bool,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            max_depth: 8,
            interrupt_on_higher_priority: true,
        }
    }
}

/// What a producer submits: an admitted utterance minus queue bookkeeping.
#[derive(Debug, Clone)]
pub struct UtteranceSpec {
    pub text: String,
    pub voice_id: String,
    pub priority: i32,
    pub source: String,
}

/// A request waiting in the queue.
struct QueuedUtterance {
    id: String,
    spec: UtteranceSpec,
    cancel: CancellationToken,
}

/// The request currently being synthesized or played.
struct CurrentUtterance {
    id: String,
    priority: i32,
    cancel: CancellationToken,
}

/// Ordering key: priority first, then enqueue sequence (FIFO tie-break).
type QueueKey = (i32, u64);

#[derive(Default)]
struct QueueState {
    queue: BTreeMap<QueueKey, QueuedUtterance>,
    current: Option<CurrentUtterance>,
    next_seq: u64,
}

struct QueueShared {
    settings: QueueSettings,
    state: Mutex<QueueState>,
    wake: Notify,
    shutdown: CancellationToken,
}

/// Handle to the speech queue. Cheap to clone.
#[derive(Clone)]
pub struct SpeechQueue {
    shared: Arc<QueueShared>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SpeechQueue {
    /// Create the queue and spawn its worker.
    pub fn start(
        settings: QueueSettings,
        pool: Arc<SynthesizerPool>,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        let shared = Arc::new(QueueShared {
            settings,
            state: Mutex::new(QueueState::default()),
            wake: Notify::new(),
            shutdown: CancellationToken::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = tokio::spawn(async move {
            run_worker(worker_shared, pool, sink).await;
        });

        Self {
            shared,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Admit an utterance. Never blocks on capacity; overflow evicts a
    /// queued item instead. Returns the assigned request id.
    pub fn enqueue(&self, spec: UtteranceSpec) -> String {
        let id = Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();

        {
            let mut state = self.shared.state.lock().expect("queue lock poisoned");
            let seq = state.next_seq;
            state.next_seq += 1;

            let occupied = state.queue.len() + usize::from(state.current.is_some());
            if occupied >= self.shared.settings.max_depth {
                evict_one(&mut state);
            }

            state.queue.insert(
                (spec.priority, seq),
                QueuedUtterance {
                    id: id.clone(),
                    spec: spec.clone(),
                    cancel: cancel.clone(),
                },
            );
            tracing::debug!(
                request_id = %id,
                priority = spec.priority,
                source = %spec.source,
                depth = state.queue.len(),
                "utterance queued"
            );

            if self.shared.settings.interrupt_on_higher_priority
                && let Some(current) = &state.current
                && spec.priority < current.priority
            {
                tracing::info!(
                    request_id = %current.id,
                    preempted_by = %id,
                    "cancelling playback for a more urgent utterance"
                );
                current.cancel.cancel();
            }
        }

        self.shared.wake.notify_one();
        id
    }

    /// Cancel the in-flight utterance and drop every queued one.
    ///
    /// Returns once both effects are ordered; it does not wait for the
    /// audio sink to finish tearing down.
    pub fn stop_and_clear(&self) {
        let dropped = {
            let mut state = self.shared.state.lock().expect("queue lock poisoned");
            if let Some(current) = &state.current {
                current.cancel.cancel();
            }
            let dropped = state.queue.len();
            state.queue.clear();
            dropped
        };
        self.shared.wake.notify_one();
        tracing::info!(dropped, "speech queue stopped and cleared");
    }

    /// Number of queued items, excluding the in-flight one.
    pub fn depth(&self) -> usize {
        self.shared.state.lock().expect("queue lock poisoned").queue.len()
    }

    /// Stop the worker. Queued items are dropped; the in-flight one is
    /// cancelled.
    pub async fn shutdown(&self) {
        self.stop_and_clear();
        self.shared.shutdown.cancel();
        self.shared.wake.notify_one();
        let worker = self.worker.lock().expect("worker lock poisoned").take();
        if let Some(worker) = worker {
            let _ = worker.await;
        }
    }
}

/// Remove the eviction victim: among queued items of the largest priority
/// value (least urgent), the oldest. The playing item is never touched. A
/// no-op when nothing is queued (depth cap of 1 with an item in flight).
fn evict_one(state: &mut QueueState) {
    let Some(&(max_priority, _)) = state.queue.keys().next_back() else {
        return;
    };
    let victim_key = *state
        .queue
        .range((max_priority, 0)..)
        .next()
        .expect("group is non-empty")
        .0;
    let victim = state.queue.remove(&victim_key).expect("key just observed");
    tracing::warn!(
        request_id = %victim.id,
        priority = max_priority,
        "queue full, evicting oldest least-urgent utterance"
    );
}

/// The single consumer: pop the (priority, seq) minimum, synthesize, play.
/// Per-utterance failures are logged and absorbed; only shutdown exits.
async fn run_worker(
    shared: Arc<QueueShared>,
    pool: Arc<SynthesizerPool>,
    sink: Arc<dyn AudioSink>,
) {
    loop {
        if shared.shutdown.is_cancelled() {
            break;
        }

        let next = {
            let mut state = shared.state.lock().expect("queue lock poisoned");
            match state.queue.pop_first() {
                Some((_, utterance)) => {
                    state.current = Some(CurrentUtterance {
                        id: utterance.id.clone(),
                        priority: utterance.spec.priority,
                        cancel: utterance.cancel.clone(),
                    });
                    Some(utterance)
                }
                None => None,
            }
        };

        match next {
            Some(utterance) => {
                speak_one(&pool, sink.as_ref(), &utterance).await;
                shared
                    .state
                    .lock()
                    .expect("queue lock poisoned")
                    .current = None;
            }
            None => {
                tokio::select! {
                    _ = shared.shutdown.cancelled() => break,
                    _ = shared.wake.notified() => {}
                }
            }
        }
    }
    tracing::debug!("speech queue worker exited");
}

async fn speak_one(pool: &SynthesizerPool, sink: &dyn AudioSink, utterance: &QueuedUtterance) {
    let id = &utterance.id;

    let audio = match pool
        .synthesize(&utterance.spec.text, &utterance.spec.voice_id, 1.0)
        .await
    {
        Ok(audio) => audio,
        Err(SpeakError::Cancelled) => {
            tracing::info!(request_id = %id, "synthesis cancelled");
            return;
        }
        Err(e) => {
            tracing::error!(request_id = %id, voice = %utterance.spec.voice_id, error = %e, "synthesis failed");
            return;
        }
    };

    // Synthesis is not cancellable mid-call; if the flag fired meanwhile,
    // discard the samples rather than starting playback.
    if utterance.cancel.is_cancelled() {
        tracing::info!(request_id = %id, "cancelled before playback, discarding audio");
        return;
    }

    match sink
        .play(audio.samples, audio.sample_rate, utterance.cancel.clone())
        .await
    {
        Ok(PlaybackOutcome::Completed) => {
            tracing::debug!(request_id = %id, "utterance completed");
        }
        Ok(PlaybackOutcome::Cancelled) => {
            tracing::info!(request_id = %id, "playback cancelled");
        }
        Err(e) => {
            tracing::error!(request_id = %id, error = %e, "playback failed");
        }
    }
}
