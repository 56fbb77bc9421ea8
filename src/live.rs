//! Live timeline view: two push feeds of the same logical collection merged
//! into one timeline that is recomputed on every delivery.
//!
//! Each feed delivers full snapshots, never diffs. A delivery replaces that
//! feed's slot, the timeline is recomputed from both slots and handed to the
//! presentation sink. Once the view is torn down nothing more is written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::models::{CanonicalRecord, FeedKind, StoredDocument};
use crate::normalize::ShapeNormalizer;
use crate::timeline::{MergedTimeline, TimelineSlots};

/// Failure of the underlying fetch or subscription.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Feed closed")]
    Closed,
}

/// Full current state of one feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedSnapshot {
    /// Every document of a collection, with its store id.
    Collection(Vec<StoredDocument>),
    /// A single document; `None` when it does not exist.
    Document(Option<Value>),
    /// The feed failed; equivalent to "no data yet".
    Unavailable,
}

impl FeedSnapshot {
    /// Feed failures never reach the core: they become an empty snapshot.
    pub fn from_result(result: Result<FeedSnapshot, FeedError>) -> Self {
        match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Feed failed, treating as empty");
                Self::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    pub fn normalize(&self, normalizer: &ShapeNormalizer<'_>) -> Vec<CanonicalRecord> {
        match self {
            Self::Collection(docs) => normalizer.normalize_collection(docs),
            Self::Document(Some(raw)) => normalizer.normalize(raw),
            Self::Document(None) | Self::Unavailable => Vec::new(),
        }
    }
}

/// Presentation side of a live view. Owns rendering.
pub trait TimelineSink: Send {
    /// Called with the full recomputed timeline after every delivery.
    fn apply(&mut self, timeline: &MergedTimeline);

    /// Called after `apply` with the newest record.
    fn scroll_to_end(&mut self, _last: Option<&CanonicalRecord>) {}
}

/// One live view session: the two feed slots plus the sink they render into.
pub struct LiveTimeline<S: TimelineSink> {
    config: Arc<EngineConfig>,
    slots: TimelineSlots,
    sink: S,
    active: Arc<AtomicBool>,
}

impl<S: TimelineSink> LiveTimeline<S> {
    pub fn new(config: Arc<EngineConfig>, sink: S) -> Self {
        let slots = TimelineSlots::new(config.merge_priority);
        Self {
            config,
            slots,
            sink,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Stop writing into the sink. Later deliveries are dropped.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Replace one feed's slot with `snapshot`, recompute, and render.
    ///
    /// Returns whether the sink was written to.
    pub fn apply(&mut self, kind: FeedKind, snapshot: &FeedSnapshot) -> bool {
        if !self.is_active() {
            tracing::debug!(feed = %kind, "Dropping delivery for inactive view");
            return false;
        }

        let records = snapshot.normalize(&ShapeNormalizer::new(&self.config));
        let merged = self.slots.replace(kind, records);
        self.sink.apply(merged);
        self.sink.scroll_to_end(merged.last());
        true
    }

    pub fn timeline(&self) -> &MergedTimeline {
        self.slots.merged()
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn active_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.active)
    }
}

/// Feed channel carrying full snapshots (or the error the feed hit).
pub type FeedReceiver = mpsc::Receiver<Result<FeedSnapshot, FeedError>>;

/// Handle to a running live view. Dropping it tears the view down.
pub struct LiveViewHandle {
    active: Arc<AtomicBool>,
    teardown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveViewHandle {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Mark the view inactive and release both feed subscriptions.
    pub fn teardown(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(tx) = self.teardown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Live view teardown signal sent");
        }
    }

    /// Wait for the session task to finish (both feeds closed, or torn down).
    pub async fn finished(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Live view task ended abnormally");
            }
        }
    }
}

impl Drop for LiveViewHandle {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Run a live view on the tokio runtime.
///
/// The session applies every delivery from either feed until both feeds
/// close or the handle is torn down; teardown wins over pending deliveries.
pub fn spawn_live_view<S>(
    config: Arc<EngineConfig>,
    sink: S,
    mut collection_rx: FeedReceiver,
    mut document_rx: FeedReceiver,
) -> LiveViewHandle
where
    S: TimelineSink + 'static,
{
    let mut view = LiveTimeline::new(config, sink);
    let active = view.active_flag();
    let (teardown_tx, mut teardown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut collection_open = true;
        let mut document_open = true;

        while collection_open || document_open {
            tokio::select! {
                biased;
                _ = &mut teardown_rx => {
                    view.deactivate();
                    tracing::info!("Live view torn down");
                    break;
                }
                update = collection_rx.recv(), if collection_open => match update {
                    Some(result) => {
                        view.apply(FeedKind::Collection, &FeedSnapshot::from_result(result));
                    }
                    None => collection_open = false,
                },
                update = document_rx.recv(), if document_open => match update {
                    Some(result) => {
                        view.apply(FeedKind::Document, &FeedSnapshot::from_result(result));
                    }
                    None => document_open = false,
                },
            }
        }

        collection_rx.close();
        document_rx.close();
        tracing::debug!(records = view.timeline().len(), "Live view session ended");
    });

    tracing::info!("Live view started");

    LiveViewHandle {
        active,
        teardown_tx: Some(teardown_tx),
        task: Some(task),
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
