// ── Reactive record streams ──
//
// Subscription types for consuming collection changes from the DataStore
// without registering a synchronous listener.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::Record;

/// A subscription to the store's raw record collection.
///
/// Provides both point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting into a `Stream`. A new
/// snapshot is produced each time the store publishes `update`.
pub struct RecordStream {
    current: Arc<Vec<Record>>,
    receiver: watch::Receiver<Arc<Vec<Record>>>,
}

impl RecordStream {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<Vec<Record>>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Arc<Vec<Record>> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<Vec<Record>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once every `DataStore` handle has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<Vec<Record>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = Arc::clone(&snap);
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The stream yields the current snapshot first, then every change.
    pub fn into_stream(self) -> RecordWatchStream {
        RecordWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct RecordWatchStream {
    inner: WatchStream<Arc<Vec<Record>>>,
}

impl Stream for RecordWatchStream {
    type Item = Arc<Vec<Record>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
