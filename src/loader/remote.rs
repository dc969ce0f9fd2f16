//! The remote YAML loader.
//!
//! `RemoteYamlLoader` ties one fetch capability to the decode step:
//!
//! - `configure` stores new request parameters; when `auto` is set and a
//!   qualifying field (`url`, `params`, `body`) changed, a reload is scheduled
//!   after `debounce_ms` of quiescence. A newer qualifying change supersedes
//!   the pending one, so rapid successive changes collapse into one request.
//! - `load` performs one fetch-then-decode pass and resolves to the tagged
//!   `LoadResult`. Decode is never attempted when the fetch failed.
//! - Completions carry a sequence number; a completion older than the newest
//!   already-applied one is discarded instead of overwriting state with stale
//!   data. Discarded completions also emit no notification.
//! - `subscribe` hands out a channel that receives the decoded documents once
//!   per successful (and applied) decode, never on errors.
//! - `cancel` aborts every in-flight fetch; cancelled loads resolve to
//!   `Transport(Cancelled)`.
//!
//! Concurrency: `load` may be called concurrently; all shared state sits
//! behind one mutex with short, non-awaiting critical sections. The loader is
//! `Clone` (cheap, `Arc`-backed) so auto-reload tasks and hosts can share it.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{Documents, LoadError, LoadResult, LoaderState};
use crate::config::{DecodeOptions, RequestConfig};
use crate::decode::decode_documents;
use crate::fetch::{FetchError, Fetcher, HttpFetcher};

/// Buffered notifications per subscriber before new ones are dropped.
const SUBSCRIBER_BUFFER: usize = 16;

/// Loader that fetches a remote YAML document and decodes it into structured
/// values. See the module docs for the full contract.
#[derive(Clone)]
pub struct RemoteYamlLoader {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Box<dyn Fetcher>,
    shared: Mutex<Shared>,
    /// Sequence numbers handed to requests, monotonically increasing.
    next_seq: AtomicU64,
    /// Generation counter for the debounce window; only the task holding the
    /// latest generation fires.
    debounce_gen: AtomicU64,
}

struct Shared {
    request: Option<RequestConfig>,
    decode: DecodeOptions,
    active_requests: usize,
    /// Highest sequence number whose completion has been applied.
    applied_seq: u64,
    last_result: Option<LoadResult>,
    subscribers: Vec<mpsc::Sender<Documents>>,
    cancel: CancellationToken,
}

/// Keeps `active_requests` honest: one guard per in-flight `load`, decremented
/// on drop so even an abandoned future releases its slot.
struct InFlightGuard {
    inner: Arc<Inner>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut shared = self
            .inner
            .shared
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        shared.active_requests = shared.active_requests.saturating_sub(1);
    }
}

impl Default for RemoteYamlLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteYamlLoader {
    /// Create a loader backed by the reqwest-based [`HttpFetcher`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_fetcher(Box::new(HttpFetcher::new()))
    }

    /// Create a loader around any transport (or a test double).
    #[must_use]
    pub fn with_fetcher(fetcher: Box<dyn Fetcher>) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                shared: Mutex::new(Shared {
                    request: None,
                    decode: DecodeOptions::default(),
                    active_requests: 0,
                    applied_seq: 0,
                    last_result: None,
                    subscribers: Vec::new(),
                    cancel: CancellationToken::new(),
                }),
                next_seq: AtomicU64::new(0),
                debounce_gen: AtomicU64::new(0),
            }),
        }
    }

    /// Store new request parameters and decode options.
    ///
    /// Has no side effect beyond storage unless `request.auto` is true and the
    /// call changed `url`, `params` or `body` (or set them for the first
    /// time), in which case a debounced reload is scheduled. Must run inside a
    /// Tokio runtime when the auto path can trigger.
    pub fn configure(&self, request: RequestConfig, decode: DecodeOptions) {
        let trigger;
        let debounce_ms = request.debounce_ms;
        {
            let mut shared = self.lock();
            trigger = request.auto
                && shared
                    .request
                    .as_ref()
                    .is_none_or(|prev| prev.auto_trigger_changed(&request));
            shared.request = Some(request);
            shared.decode = decode;
        }

        if trigger {
            self.schedule_auto_load(debounce_ms);
        } else {
            trace!(target: "yamload::loader", "Configuration stored without auto trigger");
        }
    }

    /// Subscribe to "parsed" notifications.
    ///
    /// The receiver gets the decoded documents once per applied successful
    /// decode. Notifications to a full subscriber are dropped (with a warning)
    /// rather than blocking the pipeline; a closed subscriber is pruned.
    pub fn subscribe(&self) -> mpsc::Receiver<Documents> {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        self.lock().subscribers.push(tx);
        rx
    }

    /// Abort every in-flight fetch. Aborted loads resolve to
    /// `Transport(Cancelled)`; loads started afterwards are unaffected.
    pub fn cancel(&self) {
        let old = {
            let mut shared = self.lock();
            std::mem::replace(&mut shared.cancel, CancellationToken::new())
        };
        info!(target: "yamload::loader", "Cancelling in-flight requests");
        old.cancel();
    }

    /// Read-only snapshot of the loader state.
    #[must_use]
    pub fn snapshot(&self) -> LoaderState {
        let shared = self.lock();
        LoaderState {
            loading: shared.active_requests > 0,
            active_requests: shared.active_requests,
            last_result: shared.last_result.clone(),
            request: shared.request.clone(),
            decode: shared.decode,
        }
    }

    /// Perform one fetch-then-decode pass with the current configuration.
    ///
    /// Concurrent calls are permitted; each gets its own result. Loader state
    /// only ever moves forward: if this load was superseded by a newer one
    /// completing first, its outcome is returned to the caller but neither
    /// recorded nor announced.
    pub async fn load(&self) -> LoadResult {
        let (request, decode, cancel) = {
            let mut shared = self.lock();
            shared.active_requests += 1;
            (
                shared.request.clone().unwrap_or_default(),
                shared.decode,
                shared.cancel.clone(),
            )
        };
        // Decrements even when the caller drops this future mid-flight.
        let _in_flight = InFlightGuard {
            inner: Arc::clone(&self.inner),
        };
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;

        debug!(
            target: "yamload::loader",
            seq, url = %request.url, method = %request.method,
            fetcher = self.inner.fetcher.name(),
            "Starting load"
        );

        let fetched = tokio::select! {
            outcome = self.inner.fetcher.fetch(&request) => outcome,
            () = cancel.cancelled() => Err(FetchError::Cancelled),
        };

        // Decode runs only on transport success, inside this completion path.
        let result: LoadResult = match fetched {
            Ok(text) => {
                trace!(target: "yamload::loader", seq, bytes = text.len(), "Fetch succeeded; decoding");
                decode_documents(&text, decode.trust, decode.multi_document)
                    .map_err(LoadError::from)
            }
            Err(err) => {
                debug!(target: "yamload::loader", seq, error = %err, "Fetch failed; skipping decode");
                Err(LoadError::from(err))
            }
        };

        self.complete(seq, &result);
        result
    }

    /// Record a completion and notify subscribers when it is the newest.
    fn complete(&self, seq: u64, result: &LoadResult) {
        let (applied, notify) = {
            let mut shared = self.lock();
            let applied = seq > shared.applied_seq;
            if applied {
                shared.applied_seq = seq;
                shared.last_result = Some(result.clone());
            }

            let notify = match (applied, result) {
                (true, Ok(_)) => shared.subscribers.clone(),
                _ => Vec::new(),
            };
            (applied, notify)
        };

        if !applied {
            debug!(
                target: "yamload::loader",
                seq,
                "Discarding stale completion (a newer request already resolved)"
            );
            return;
        }

        match result {
            Ok(docs) => {
                info!(
                    target: "yamload::loader",
                    seq, documents = docs.len(),
                    "Load completed; emitting parsed notification"
                );
                self.notify_parsed(docs, notify);
            }
            Err(err) => {
                warn!(target: "yamload::loader", seq, error = %err, "Load failed");
            }
        }
    }

    /// Deliver one "parsed" notification to each subscriber and prune the
    /// closed ones.
    fn notify_parsed(&self, docs: &Documents, subscribers: Vec<mpsc::Sender<Documents>>) {
        let mut closed = false;
        for tx in &subscribers {
            match tx.try_send(docs.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        target: "yamload::loader",
                        "Subscriber buffer full; dropping parsed notification"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    closed = true;
                }
            }
        }

        if closed {
            self.lock().subscribers.retain(|tx| !tx.is_closed());
        }
    }

    /// Schedule a debounced reload. Each call supersedes the previous pending
    /// one; only the latest generation fires after its quiescence window.
    fn schedule_auto_load(&self, debounce_ms: u64) {
        let generation = self.inner.debounce_gen.fetch_add(1, Ordering::SeqCst) + 1;
        let loader = self.clone();

        trace!(
            target: "yamload::loader",
            generation, debounce_ms,
            "Scheduling debounced auto reload"
        );

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(debounce_ms)).await;

            if loader.inner.debounce_gen.load(Ordering::SeqCst) != generation {
                trace!(
                    target: "yamload::loader",
                    generation,
                    "Debounced reload superseded; skipping"
                );
                return;
            }

            // The auto path has no waiter; the outcome lands in loader state
            // and, on success, on the subscriber channels.
            let _ = loader.load().await;
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        // Mutex poisoning cannot happen: no critical section panics.
        self.inner
            .shared
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
