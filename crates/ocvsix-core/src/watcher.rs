//! Element-readiness watcher.
//!
//! Resolves once an element matching a selector exists in a `Document`:
//! immediately if it is already there, otherwise on the first mutation after
//! which the selector matches. A deadline bounds the wait; in silent mode the
//! deadline yields `Ok(None)` instead of `Error::Timeout`. The mutation
//! listener is deregistered on every exit path (found, timeout, cancel, or
//! the handle being dropped).

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::dom::{Document, Lookup, MutationObserver, NodeId, Selector};
use crate::error::{Error, Result};

pub const DEFAULT_WATCH_TIMEOUT: Duration = Duration::from_millis(10_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub timeout: Duration,
    /// Resolve with `None` on timeout instead of failing.
    pub silent: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WATCH_TIMEOUT,
            silent: false,
        }
    }
}

impl WatchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

/// Outcome of a watch: the element, or `None` after a silent timeout.
pub type WatchOutcome = Result<Option<NodeId>>;

/// An active observation session. Dropping it cancels the watch.
pub struct WatchHandle {
    selector: String,
    deadline: Instant,
    cancel: Option<oneshot::Sender<()>>,
    outcome: oneshot::Receiver<WatchOutcome>,
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("selector", &self.selector)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.cancel.is_none())
            .finish()
    }
}

pub struct Watcher;

impl Watcher {
    /// Starts watching `document` for `selector`. Must be called inside a tokio runtime
    /// when the element is not already present.
    pub fn start(document: &Document, selector: &str, options: WatchOptions) -> WatchHandle {
        let deadline = Instant::now() + options.timeout;
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let handle = WatchHandle {
            selector: selector.to_string(),
            deadline,
            cancel: Some(cancel_tx),
            outcome: outcome_rx,
        };

        let parsed = match Selector::parse(selector) {
            Ok(s) => s,
            Err(e) => {
                let _ = outcome_tx.send(Err(e));
                return handle;
            }
        };

        match document.query_or_observe(&parsed) {
            Lookup::Found(node) => {
                tracing::debug!(selector, "element already present");
                let _ = outcome_tx.send(Ok(Some(node)));
            }
            Lookup::Observing(observer) => {
                tracing::debug!(selector, timeout_ms = options.timeout.as_millis() as u64, "waiting for element");
                let session = Session {
                    document: document.clone(),
                    selector: parsed,
                    observer,
                    deadline,
                    options,
                };
                tokio::spawn(async move {
                    let outcome = session.run(cancel_rx).await;
                    let _ = outcome_tx.send(outcome);
                });
            }
        }
        handle
    }
}

impl WatchHandle {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Requests cancellation. The pending `wait` resolves with `Error::Cancelled`
    /// unless an outcome was already delivered.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    /// Waits for the single outcome of this watch.
    pub async fn wait(mut self) -> WatchOutcome {
        match (&mut self.outcome).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::Cancelled {
                selector: self.selector.clone(),
            }),
        }
    }
}

struct Session {
    document: Document,
    selector: Selector,
    observer: MutationObserver,
    deadline: Instant,
    options: WatchOptions,
}

impl Session {
    async fn run(mut self, mut cancel: oneshot::Receiver<()>) -> WatchOutcome {
        let selector = self.selector.as_str().to_string();
        let mut listening = true;
        let sleep = tokio::time::sleep_until(self.deadline);
        tokio::pin!(sleep);

        let outcome = loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    tracing::debug!(selector = %selector, "watch cancelled");
                    break Err(Error::Cancelled { selector: selector.clone() });
                }
                record = self.observer.next(), if listening => {
                    match record {
                        Some(_) => {
                            if let Some(node) = self.document.query(&self.selector) {
                                tracing::debug!(selector = %selector, "element appeared");
                                break Ok(Some(node));
                            }
                        }
                        // Document dropped: nothing can appear any more, wait out the deadline.
                        None => listening = false,
                    }
                }
                _ = &mut sleep => {
                    break if self.options.silent {
                        tracing::debug!(selector = %selector, "element not found, silent timeout");
                        Ok(None)
                    } else {
                        Err(Error::timeout(&selector, self.options.timeout))
                    };
                }
            }
        };
        self.observer.disconnect();
        outcome
    }
}

/// Waits until `selector` matches an element of `document`.
pub async fn on_element_ready(document: &Document, selector: &str, options: WatchOptions) -> WatchOutcome {
    Watcher::start(document, selector, options).wait().await
}

/// True if an element matching `selector` exists right now.
pub fn is_element_present(document: &Document, selector: &str) -> Result<bool> {
    document.is_element_present(selector)
}
