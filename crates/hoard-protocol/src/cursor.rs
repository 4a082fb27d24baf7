//! Paged enumeration of the time index.
//!
//! An [`Enumeration`] owns a producer task that walks the index one page at
//! a time, fetches every listed blob in order, and pushes the results onto
//! a bounded channel. The consumer pulls with [`Enumeration::next`]. The
//! channel bound gives backpressure: the producer stalls once `capacity`
//! blobs are waiting.
//!
//! The window's upper bound is fixed when the walk starts, so blobs uploaded
//! during the walk are not visited. The walk ends only on an empty page. Any
//! failure is delivered as a final `Err` item, after which the stream ends;
//! a consumer that sees one must treat the enumeration as incomplete.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use hoard_types::{BlobId, Timestamp};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::ProtocolError;
use crate::message::BlobsResponse;

/// Buffered blobs between producer and consumer when no capacity is given.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Anything that can answer index queries and serve blob bytes.
#[async_trait]
pub trait BlobSource: Send + Sync + 'static {
    type Error: From<ProtocolError> + Send + 'static;

    /// One page of entries with `start < time <= end`, ascending.
    ///
    /// The response reports the window used; when `end` is `None` the
    /// source picks one and returns it.
    async fn query_page(
        &self,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> Result<BlobsResponse, Self::Error>;

    /// The bytes of a stored blob.
    async fn fetch(&self, id: &BlobId) -> Result<Bytes, Self::Error>;
}

/// One blob produced by an [`Enumeration`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumeratedBlob {
    pub id: BlobId,
    pub time: Timestamp,
    pub data: Bytes,
}

/// Consumer half of a running enumeration.
///
/// Dropping it stops the producer.
pub struct Enumeration<E> {
    rx: mpsc::Receiver<Result<EnumeratedBlob, E>>,
    producer: JoinHandle<()>,
}

impl<E: Send + 'static> Enumeration<E> {
    /// Start enumerating `start < time <= end` from `source`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(
        source: Arc<S>,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
        capacity: usize,
    ) -> Self
    where
        S: BlobSource<Error = E>,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let producer = tokio::spawn(produce(source, start, end, tx));
        Self { rx, producer }
    }

    /// The next blob, or `None` once the walk is over.
    pub async fn next(&mut self) -> Option<Result<EnumeratedBlob, E>> {
        self.rx.recv().await
    }

    /// Drain the enumeration, stopping at the first error.
    pub async fn collect_all(mut self) -> Result<Vec<EnumeratedBlob>, E> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}

impl<E> Drop for Enumeration<E> {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

impl<E> std::fmt::Debug for Enumeration<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enumeration")
            .field("finished", &self.producer.is_finished())
            .finish()
    }
}

async fn produce<S: BlobSource>(
    source: Arc<S>,
    mut cursor: Option<Timestamp>,
    mut end: Option<Timestamp>,
    tx: mpsc::Sender<Result<EnumeratedBlob, S::Error>>,
) {
    let mut pages = 0u64;
    let mut sent = 0u64;
    loop {
        let page = match source.query_page(cursor, end).await {
            Ok(page) => page,
            Err(e) => {
                let _ = tx.send(Err(e)).await;
                return;
            }
        };
        pages += 1;
        end.get_or_insert(page.end);

        if page.blobs.is_empty() {
            debug!(pages, sent, "enumeration finished");
            return;
        }

        // Entries within a page may share a timestamp; only the page's lower
        // bound must be exceeded.
        let page_start = cursor;
        for entry in page.blobs {
            if let Some(at) = page_start.filter(|&s| entry.time <= s) {
                let _ = tx.send(Err(ProtocolError::CursorStalled { at }.into())).await;
                return;
            }
            let item = source.fetch(&entry.hash).await.map(|data| EnumeratedBlob {
                id: entry.hash,
                time: entry.time,
                data,
            });
            let failed = item.is_err();
            if tx.send(item).await.is_err() {
                debug!(sent, "enumeration consumer went away");
                return;
            }
            if failed {
                return;
            }
            sent += 1;
            cursor = cursor.max(Some(entry.time));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::message::BlobEntry;

    #[derive(Debug)]
    enum FakeError {
        Missing(BlobId),
        Unavailable,
        Protocol(ProtocolError),
    }

    impl From<ProtocolError> for FakeError {
        fn from(e: ProtocolError) -> Self {
            Self::Protocol(e)
        }
    }

    /// Index held in a vector; pages hold at most `page_size` entries.
    struct FakeSource {
        entries: Mutex<Vec<(BlobEntry, Bytes)>>,
        page_size: usize,
        queries: AtomicUsize,
        fail_query_after: Option<usize>,
        missing: Option<BlobId>,
        repeat_pages: bool,
        /// Window end reported by the first query when none is given.
        first_end: Timestamp,
    }

    impl FakeSource {
        fn new(count: usize, page_size: usize) -> Self {
            let entries = (0..count)
                .map(|i| {
                    let data = Bytes::from(format!("blob-{i}"));
                    let entry = BlobEntry {
                        hash: BlobId::from_bytes(&data),
                        time: Timestamp::from_nanos((i as i64 + 1) * 1_000),
                    };
                    (entry, data)
                })
                .collect();
            Self {
                entries: Mutex::new(entries),
                page_size,
                queries: AtomicUsize::new(0),
                fail_query_after: None,
                missing: None,
                repeat_pages: false,
                first_end: Timestamp::from_nanos(i64::MAX),
            }
        }

        fn push(&self, at: i64, data: &'static [u8]) {
            let data = Bytes::from_static(data);
            let entry = BlobEntry {
                hash: BlobId::from_bytes(&data),
                time: Timestamp::from_nanos(at),
            };
            self.entries.lock().unwrap().push((entry, data));
        }
    }

    #[async_trait]
    impl BlobSource for FakeSource {
        type Error = FakeError;

        async fn query_page(
            &self,
            start: Option<Timestamp>,
            end: Option<Timestamp>,
        ) -> Result<BlobsResponse, FakeError> {
            let n = self.queries.fetch_add(1, Ordering::SeqCst);
            if self.fail_query_after.is_some_and(|limit| n >= limit) {
                return Err(FakeError::Unavailable);
            }
            let start = if self.repeat_pages { None } else { start };
            let start = start.unwrap_or(Timestamp::MIN);
            let default_end = if n == 0 {
                self.first_end
            } else {
                Timestamp::from_nanos(i64::MAX)
            };
            let end = end.unwrap_or(default_end);
            let blobs = self
                .entries
                .lock()
                .unwrap()
                .iter()
                .map(|(e, _)| e.clone())
                .filter(|e| e.time > start && e.time <= end)
                .take(self.page_size)
                .collect();
            Ok(BlobsResponse { blobs, start, end })
        }

        async fn fetch(&self, id: &BlobId) -> Result<Bytes, FakeError> {
            if self.missing == Some(*id) {
                return Err(FakeError::Missing(*id));
            }
            self.entries
                .lock()
                .unwrap()
                .iter()
                .find(|(e, _)| e.hash == *id)
                .map(|(_, data)| data.clone())
                .ok_or(FakeError::Missing(*id))
        }
    }

    fn expected(source: &FakeSource) -> Vec<BlobId> {
        source
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(e, _)| e.hash)
            .collect()
    }

    #[tokio::test]
    async fn visits_every_blob_in_order() {
        let source = Arc::new(FakeSource::new(7, 3));
        let want = expected(&source);
        let got = Enumeration::spawn(source.clone(), None, None, 2)
            .collect_all()
            .await
            .unwrap();
        let ids: Vec<BlobId> = got.iter().map(|b| b.id).collect();
        assert_eq!(ids, want);
        assert!(got.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(got[0].data, Bytes::from_static(b"blob-0"));
        // Two full pages, one short page, one empty page.
        assert_eq!(source.queries.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn short_pages_do_not_end_the_walk() {
        let source = Arc::new(FakeSource::new(3, 1));
        let got = Enumeration::spawn(source.clone(), None, None, 4)
            .collect_all()
            .await
            .unwrap();
        assert_eq!(got.len(), 3);
        assert_eq!(source.queries.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn empty_index_yields_nothing() {
        let source = Arc::new(FakeSource::new(0, 10));
        let mut e = Enumeration::spawn(source, None, None, 1);
        assert!(e.next().await.is_none());
    }

    #[tokio::test]
    async fn start_bound_is_exclusive() {
        let source = Arc::new(FakeSource::new(5, 10));
        let got = Enumeration::spawn(source, Some(Timestamp::from_nanos(2_000)), None, 8)
            .collect_all()
            .await
            .unwrap();
        let times: Vec<i64> = got.iter().map(|b| b.time.as_nanos()).collect();
        assert_eq!(times, vec![3_000, 4_000, 5_000]);
    }

    #[tokio::test]
    async fn end_is_fixed_by_first_page() {
        let mut source = FakeSource::new(2, 1);
        source.first_end = Timestamp::from_nanos(10_000);
        source.push(20_000, b"late arrival");
        let got = Enumeration::spawn(Arc::new(source), None, None, 4)
            .collect_all()
            .await
            .unwrap();
        assert_eq!(got.len(), 2);
    }

    #[tokio::test]
    async fn query_error_is_the_last_item() {
        let mut source = FakeSource::new(6, 2);
        source.fail_query_after = Some(1);
        let mut e = Enumeration::spawn(Arc::new(source), None, None, 8);

        assert!(e.next().await.unwrap().is_ok());
        assert!(e.next().await.unwrap().is_ok());
        assert!(matches!(e.next().await, Some(Err(FakeError::Unavailable))));
        assert!(e.next().await.is_none());
    }

    #[tokio::test]
    async fn missing_blob_aborts_the_walk() {
        let mut source = FakeSource::new(4, 10);
        let ids = expected(&source);
        source.missing = Some(ids[1]);
        let mut e = Enumeration::spawn(Arc::new(source), None, None, 8);

        assert_eq!(e.next().await.unwrap().unwrap().id, ids[0]);
        assert!(matches!(e.next().await, Some(Err(FakeError::Missing(id))) if id == ids[1]));
        assert!(e.next().await.is_none());
    }

    #[tokio::test]
    async fn collect_all_surfaces_the_error() {
        let mut source = FakeSource::new(4, 2);
        source.fail_query_after = Some(1);
        let err = Enumeration::spawn(Arc::new(source), None, None, 8)
            .collect_all()
            .await
            .unwrap_err();
        assert!(matches!(err, FakeError::Unavailable));
    }

    #[tokio::test]
    async fn stalled_cursor_is_reported() {
        let mut source = FakeSource::new(3, 2);
        source.repeat_pages = true;
        let result = Enumeration::spawn(Arc::new(source), None, None, 8)
            .collect_all()
            .await;
        assert!(matches!(
            result,
            Err(FakeError::Protocol(ProtocolError::CursorStalled { .. }))
        ));
    }

    #[tokio::test]
    async fn tied_times_within_a_page_are_all_visited() {
        let source = FakeSource::new(0, 10);
        source.push(1_000, b"first twin");
        source.push(1_000, b"second twin");
        source.push(2_000, b"after");
        let want = expected(&source);
        let got = Enumeration::spawn(Arc::new(source), None, None, 4)
            .collect_all()
            .await
            .unwrap();
        let ids: Vec<BlobId> = got.iter().map(|b| b.id).collect();
        assert_eq!(ids, want);
        assert_eq!(got[1].time, got[0].time);
    }

    #[tokio::test]
    async fn dropping_the_consumer_stops_the_producer() {
        let source = Arc::new(FakeSource::new(100, 10));
        let mut e = Enumeration::spawn(source.clone(), None, None, 1);
        assert!(e.next().await.unwrap().is_ok());
        drop(e);
        tokio::task::yield_now().await;
        let queries = source.queries.load(Ordering::SeqCst);
        assert!(queries <= 2, "producer kept paging after drop: {queries}");
    }
}
