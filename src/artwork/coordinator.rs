//! Whole-playlist artwork resolution.
//!
//! Fans resolution out over every item of a playlist and reports back once,
//! after the last item has finished. Per-item results can be observed as
//! [`ArtworkEvent`]s while the pass runs.
//!
//! # Example
//!
//! ```ignore
//! let coordinator = PlaylistArtworkCoordinator::new(resolver, 8);
//! let handle = coordinator.resolve_all(playlist.snapshot(), |summary| {
//!     println!("{} items resolved", summary.resolved);
//! });
//! let summary = handle.wait().await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::{Artwork, ArtworkResolver};
use crate::playlist::PlaylistItem;

/// Events emitted while a playlist pass runs.
#[derive(Debug, Clone)]
pub enum ArtworkEvent {
    /// One item finished; `index` is its position in the playlist
    ItemResolved { index: usize, artwork: Artwork },
}

/// Outcome of a playlist pass.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    /// Final artwork per item, in playlist order
    pub artworks: Vec<Artwork>,
    /// Items that ended with real artwork
    pub resolved: usize,
    /// Items that ended with the placeholder
    pub placeholders: usize,
}

impl SessionSummary {
    fn from_items(items: &[Arc<PlaylistItem>]) -> Self {
        let artworks: Vec<Artwork> = items
            .iter()
            .map(|item| item.artwork().unwrap_or_else(Artwork::placeholder))
            .collect();
        let placeholders = artworks.iter().filter(|a| a.is_placeholder()).count();

        Self {
            resolved: artworks.len() - placeholders,
            placeholders,
            artworks,
        }
    }
}

/// Completion tracking for one playlist pass.
///
/// `remaining` counts items that haven't reported yet. The item that takes
/// it from one to zero is the only one that signals completion.
pub struct PlaylistArtworkSession {
    items: Vec<Arc<PlaylistItem>>,
    remaining: AtomicUsize,
    done: Mutex<Option<oneshot::Sender<()>>>,
}

impl PlaylistArtworkSession {
    fn new(items: Vec<Arc<PlaylistItem>>, done: oneshot::Sender<()>) -> Self {
        Self {
            remaining: AtomicUsize::new(items.len()),
            items,
            done: Mutex::new(Some(done)),
        }
    }

    /// Record that one item finished. Returns `true` for the last one.
    pub fn complete_one(&self) -> bool {
        let previous = self.remaining.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "more completions than items");
        if previous != 1 {
            return false;
        }

        if let Some(done) = self.done.lock().take() {
            let _ = done.send(());
        }
        true
    }

    /// Items that haven't reported yet.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }
}

/// Handle to a running playlist pass.
pub struct SessionHandle {
    session: Option<Arc<PlaylistArtworkSession>>,
    cancel: CancellationToken,
    summary_rx: oneshot::Receiver<SessionSummary>,
}

impl SessionHandle {
    /// Stop waiting on sources. Unfinished items settle on the placeholder
    /// and the completion callback still runs once.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token cancelling this pass, for wiring into signal handlers.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Items still in flight.
    pub fn remaining(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.remaining())
    }

    /// Wait for the pass to finish.
    pub async fn wait(self) -> SessionSummary {
        match self.summary_rx.await {
            Ok(summary) => summary,
            // Completion callback panicked; rebuild from the items
            Err(_) => self
                .session
                .map(|s| SessionSummary::from_items(&s.items))
                .unwrap_or_default(),
        }
    }
}

/// Resolves artwork for all items of a playlist with bounded concurrency.
pub struct PlaylistArtworkCoordinator {
    resolver: Arc<ArtworkResolver>,
    max_concurrency: usize,
    event_tx: Option<mpsc::Sender<ArtworkEvent>>,
}

impl PlaylistArtworkCoordinator {
    pub fn new(resolver: Arc<ArtworkResolver>, max_concurrency: usize) -> Self {
        Self {
            resolver,
            max_concurrency: max_concurrency.max(1),
            event_tx: None,
        }
    }

    /// Set the event sender for per-item updates.
    ///
    /// Events are sent with backpressure, so the receiver must be drained
    /// while the pass runs.
    pub fn set_event_sender(&mut self, tx: mpsc::Sender<ArtworkEvent>) {
        self.event_tx = Some(tx);
    }

    /// Resolve artwork for every item.
    ///
    /// `items` is a snapshot; later playlist edits don't affect the pass.
    /// `on_complete` runs exactly once, after every item has finished.
    ///
    /// Where it runs depends on the playlist: for an empty playlist it runs
    /// on the caller's thread before this function returns, otherwise on a
    /// delivery task spawned on the current runtime, so any runtime worker
    /// may execute it. Callers that need a fixed context should forward from
    /// the callback through a channel, or await [`SessionHandle::wait`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn resolve_all<F>(&self, items: Vec<Arc<PlaylistItem>>, on_complete: F) -> SessionHandle
    where
        F: FnOnce(SessionSummary) + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let (summary_tx, summary_rx) = oneshot::channel();

        if items.is_empty() {
            tracing::debug!(target: "artwork::coordinator", "Empty playlist, nothing to resolve");
            let summary = SessionSummary::default();
            on_complete(summary.clone());
            let _ = summary_tx.send(summary);
            return SessionHandle {
                session: None,
                cancel,
                summary_rx,
            };
        }

        let total = items.len();
        let permits = self.max_concurrency.min(total);
        tracing::info!(
            target: "artwork::coordinator",
            items = total,
            concurrency = permits,
            "Resolving playlist artwork"
        );

        let (done_tx, done_rx) = oneshot::channel();
        let session = Arc::new(PlaylistArtworkSession::new(items, done_tx));
        let semaphore = Arc::new(Semaphore::new(permits));

        for (index, item) in session.items.iter().enumerate() {
            let item = item.clone();
            let resolver = self.resolver.clone();
            let semaphore = semaphore.clone();
            let session = session.clone();
            let cancel = cancel.clone();
            let event_tx = self.event_tx.clone();

            tokio::spawn(async move {
                let artwork = {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire().await.ok();
                    // Own task, so a panicking source still lets the item report
                    let task_item = item.clone();
                    let task = tokio::spawn(async move {
                        resolver.resolve_one(&task_item, &cancel).await
                    });
                    match task.await {
                        Ok(artwork) => artwork,
                        Err(e) => {
                            tracing::warn!(
                                target: "artwork::coordinator",
                                path = item.path(),
                                error = %e,
                                "Artwork resolution aborted"
                            );
                            let placeholder = Artwork::placeholder();
                            item.settle(placeholder.clone());
                            placeholder
                        }
                    }
                };

                if let Some(tx) = event_tx {
                    let _ = tx.send(ArtworkEvent::ItemResolved { index, artwork }).await;
                }

                session.complete_one();
            });
        }

        let delivery_session = session.clone();
        tokio::spawn(async move {
            // Sender lives in the session, which this task keeps alive
            let _ = done_rx.await;

            let summary = SessionSummary::from_items(&delivery_session.items);
            tracing::info!(
                target: "artwork::coordinator",
                resolved = summary.resolved,
                placeholders = summary.placeholders,
                "Playlist artwork complete"
            );

            on_complete(summary.clone());
            let _ = summary_tx.send(summary);
        });

        SessionHandle {
            session: Some(session),
            cancel,
            summary_rx,
        }
    }
}
